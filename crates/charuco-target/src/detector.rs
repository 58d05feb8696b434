use std::collections::BTreeMap;

use charuco_image::{GrayImage, Image, ImageSize};
use serde::{Deserialize, Serialize};

use crate::{
    decode::{decode_quad, DecodeConfig, DecodedQuad},
    dictionary::Dictionary,
    errors::TargetError,
    quad::{fit_quad, FitQuadConfig},
    segmentation::find_connected_components,
    threshold::{adaptive_threshold_mean, IntegralImage},
    union_find::UnionFind,
};

/// A detected marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    /// The marker id in the dictionary.
    pub id: u32,
    /// Top-left, top-right, bottom-right and bottom-left corner of the marker in pixels.
    pub corners: [[f32; 2]; 4],
}

/// Parameters of the marker detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorParams {
    /// Window sizes of the adaptive threshold, one pass per window.
    pub threshold_windows: Vec<usize>,
    /// Offset subtracted from the local mean when thresholding.
    pub threshold_constant: f64,
    /// Configuration for quad fitting.
    pub fit_quad: FitQuadConfig,
    /// Configuration for reading marker bits.
    pub decode: DecodeConfig,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            threshold_windows: vec![11, 23, 41],
            threshold_constant: 7.0,
            fit_quad: FitQuadConfig::default(),
            decode: DecodeConfig::default(),
        }
    }
}

/// Detects square markers of one dictionary.
///
/// Keeps scratch buffers between calls; reuse one detector for a stream of
/// frames of the same size.
pub struct MarkerDetector {
    params: DetectorParams,
    dictionary: Dictionary,
    bin_img: GrayImage,
    uf: UnionFind,
}

impl MarkerDetector {
    /// Creates a detector for `dictionary`.
    pub fn new(dictionary: Dictionary, params: DetectorParams) -> Self {
        Self {
            params,
            dictionary,
            bin_img: Image::from_size_val(ImageSize::default(), 0),
            uf: UnionFind::new(0),
        }
    }

    /// Returns a reference to the detector parameters.
    #[inline]
    pub fn params(&self) -> &DetectorParams {
        &self.params
    }

    /// Returns the dictionary markers are looked up in.
    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Detects the markers in a grayscale image.
    ///
    /// # Returns
    ///
    /// The markers sorted by id, at most one per id.
    pub fn detect(&mut self, gray: &GrayImage) -> Result<Vec<Marker>, TargetError> {
        if self.bin_img.size() != gray.size() {
            self.bin_img = Image::from_size_val(gray.size(), 0);
        }

        let (width, height) = (gray.width(), gray.height());
        let integral = IntegralImage::new(gray);
        let mut best: BTreeMap<u32, DecodedQuad> = BTreeMap::new();
        let mut num_candidates = 0usize;

        for &window in &self.params.threshold_windows {
            // Step 1: adaptive threshold
            adaptive_threshold_mean(
                gray,
                &integral,
                &mut self.bin_img,
                window,
                self.params.threshold_constant,
            )?;

            // Step 2: dark connected components
            let components = find_connected_components(&self.bin_img, &mut self.uf);

            for component in &components {
                // Step 3: quad fitting
                let Some(quad) = fit_quad(component, width, height, &self.params.fit_quad) else {
                    continue;
                };
                num_candidates += 1;

                // Step 4: decoding
                let Some(decoded) =
                    decode_quad(gray, &quad, &self.dictionary, &self.params.decode)
                else {
                    continue;
                };

                best.entry(decoded.id)
                    .and_modify(|prev| {
                        if decoded.distance < prev.distance {
                            *prev = decoded;
                        }
                    })
                    .or_insert(decoded);
            }
        }

        log::trace!(
            "{} marker candidates, {} markers decoded",
            num_candidates,
            best.len()
        );

        Ok(best
            .into_values()
            .map(|d| Marker {
                id: d.id,
                corners: d.corners.map(|c| [c[0] as f32, c[1] as f32]),
            })
            .collect())
    }
}

/// Detects the markers of `dictionary` in a grayscale image.
///
/// Convenience wrapper around [`MarkerDetector`] for one-off calls.
pub fn detect_markers(
    gray: &GrayImage,
    dictionary: &Dictionary,
    params: &DetectorParams,
) -> Result<Vec<Marker>, TargetError> {
    MarkerDetector::new(dictionary.clone(), params.clone()).detect(gray)
}
