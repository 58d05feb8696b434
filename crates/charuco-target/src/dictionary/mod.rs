mod dict4x4_50;
mod dict5x5_50;
mod dict6x6_100;
mod dict6x6_50;

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::errors::TargetError;

/// The built-in marker dictionaries.
///
/// These tables have the sizes of the ArUco predefined dictionaries but not
/// their codes. Boards printed with OpenCV need the OpenCV table, loaded with
/// [`Dictionary::from_data`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DictionaryKind {
    /// 50 markers with 4x4 bits.
    #[serde(rename = "4x4_50")]
    Dict4x4_50,
    /// 50 markers with 5x5 bits.
    #[serde(rename = "5x5_50")]
    Dict5x5_50,
    /// 50 markers with 6x6 bits.
    #[serde(rename = "6x6_50")]
    #[default]
    Dict6x6_50,
    /// 100 markers with 6x6 bits.
    #[serde(rename = "6x6_100")]
    Dict6x6_100,
}

impl DictionaryKind {
    /// Returns all built-in dictionary kinds.
    pub fn all() -> [Self; 4] {
        [
            Self::Dict4x4_50,
            Self::Dict5x5_50,
            Self::Dict6x6_50,
            Self::Dict6x6_100,
        ]
    }

    /// The name used in configuration files and on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Dict4x4_50 => "4x4_50",
            Self::Dict5x5_50 => "5x5_50",
            Self::Dict6x6_50 => "6x6_50",
            Self::Dict6x6_100 => "6x6_100",
        }
    }
}

impl std::fmt::Display for DictionaryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for DictionaryKind {
    type Err = TargetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::all()
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| TargetError::UnknownDictionary(s.to_string()))
    }
}

/// A square binary marker dictionary.
///
/// Codes are stored row-major with the first bit in the most significant
/// position; a set bit is a white cell.
#[derive(Debug, Clone, PartialEq)]
pub struct Dictionary {
    kind: Option<DictionaryKind>,
    marker_size: usize,
    max_correction_bits: u32,
    codes: Cow<'static, [u64]>,
}

/// A marker table in the layout of OpenCV's `aruco.Dictionary`.
///
/// `bytes_list` holds the rotation 0 entry of `Dictionary.bytesList` for each
/// marker: the row-major bits packed most significant first, the last byte
/// holding the remaining `n * n % 8` bits in its low bits. From Python:
///
/// ```python
/// d = cv2.aruco.getPredefinedDictionary(cv2.aruco.DICT_6X6_50)
/// json.dump({"marker_size": d.markerSize,
///            "max_correction_bits": d.maxCorrectionBits,
///            "bytes_list": d.bytesList[:, :, 0].tolist()}, f)
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryData {
    /// Number of bits per marker side.
    pub marker_size: usize,
    /// Bit errors corrected during identification.
    pub max_correction_bits: u32,
    /// Packed codes, one entry per marker id.
    pub bytes_list: Vec<Vec<u8>>,
}

/// A successful dictionary lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identification {
    /// The marker id.
    pub id: u32,
    /// Number of clockwise quarter turns that map the stored code onto the observed bits.
    pub rotation: usize,
    /// Hamming distance between the observed bits and the rotated code.
    pub distance: u32,
}

impl Dictionary {
    /// Load one of the predefined dictionaries.
    pub fn new(kind: DictionaryKind) -> Self {
        let (marker_size, min_distance, codes): (usize, u32, &'static [u64]) = match kind {
            DictionaryKind::Dict4x4_50 => (4, 4, &dict4x4_50::CODE_DATA),
            DictionaryKind::Dict5x5_50 => (5, 8, &dict5x5_50::CODE_DATA),
            DictionaryKind::Dict6x6_50 => (6, 13, &dict6x6_50::CODE_DATA),
            DictionaryKind::Dict6x6_100 => (6, 12, &dict6x6_100::CODE_DATA),
        };

        Self {
            kind: Some(kind),
            marker_size,
            max_correction_bits: (min_distance - 1) / 2,
            codes: Cow::Borrowed(codes),
        }
    }

    /// Build a dictionary from an exported OpenCV table.
    ///
    /// # Errors
    ///
    /// [`TargetError::InvalidDictionary`] when the marker size is outside
    /// `3..=8`, the table is empty or an entry has the wrong number of bytes.
    pub fn from_data(data: &DictionaryData) -> Result<Self, TargetError> {
        let n = data.marker_size;
        if !(3..=8).contains(&n) {
            return Err(TargetError::InvalidDictionary(format!(
                "marker size {n} is not in 3..=8"
            )));
        }
        if data.bytes_list.is_empty() {
            return Err(TargetError::InvalidDictionary("no markers".to_string()));
        }

        let codes = data
            .bytes_list
            .iter()
            .enumerate()
            .map(|(id, bytes)| {
                code_from_bytes(bytes, n).ok_or_else(|| {
                    TargetError::InvalidDictionary(format!(
                        "marker {id} has {} bytes, expected {}",
                        bytes.len(),
                        (n * n).div_ceil(8)
                    ))
                })
            })
            .collect::<Result<Vec<u64>, _>>()?;

        Ok(Self {
            kind: None,
            marker_size: n,
            max_correction_bits: data.max_correction_bits,
            codes: Cow::Owned(codes),
        })
    }

    /// The built-in kind, `None` for a loaded table.
    #[inline]
    pub fn kind(&self) -> Option<DictionaryKind> {
        self.kind
    }

    /// Number of bits per marker side.
    #[inline]
    pub fn marker_size(&self) -> usize {
        self.marker_size
    }

    /// Number of markers in the dictionary.
    #[inline]
    pub fn len(&self) -> usize {
        self.codes.len()
    }

    /// Whether the dictionary holds no markers.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Maximum number of bit errors that can be corrected unambiguously.
    #[inline]
    pub fn max_correction_bits(&self) -> u32 {
        self.max_correction_bits
    }

    /// The packed code of a marker.
    pub fn code(&self, id: u32) -> Result<u64, TargetError> {
        self.codes
            .get(id as usize)
            .copied()
            .ok_or(TargetError::MarkerIdOutOfRange(id, self.codes.len()))
    }

    /// The bit matrix of a marker, row-major, `true` = white.
    pub fn bits(&self, id: u32) -> Result<Vec<bool>, TargetError> {
        Ok(unpack(self.code(id)?, self.marker_size))
    }

    /// Find the marker closest to the observed bits over all four rotations.
    ///
    /// Returns `None` when the best match needs more than `max_correction` bit flips.
    pub fn identify(&self, bits: &[bool], max_correction: u32) -> Option<Identification> {
        let n = self.marker_size;
        if bits.len() != n * n {
            return None;
        }

        let observed = pack(bits);
        let mut best: Option<Identification> = None;

        for (id, &code) in self.codes.iter().enumerate() {
            let mut rotated = code;
            for rotation in 0..4 {
                let distance = (rotated ^ observed).count_ones();
                if best.map_or(true, |b| distance < b.distance) {
                    best = Some(Identification {
                        id: id as u32,
                        rotation,
                        distance,
                    });
                }
                rotated = rotate_cw(rotated, n);
            }
        }

        best.filter(|b| b.distance <= max_correction)
    }
}

/// Pack a row-major bit matrix, first bit most significant.
pub fn pack(bits: &[bool]) -> u64 {
    bits.iter().fold(0u64, |acc, &b| (acc << 1) | b as u64)
}

/// Pack OpenCV `bytesList` bytes of an `n x n` marker into a code.
///
/// Returns `None` unless `bytes` holds exactly `ceil(n * n / 8)` bytes.
pub fn code_from_bytes(bytes: &[u8], n: usize) -> Option<u64> {
    let nbits = n * n;
    if bytes.len() != nbits.div_ceil(8) {
        return None;
    }
    let tail = nbits % 8;
    let code = bytes.iter().enumerate().fold(0u64, |acc, (i, &b)| {
        if i + 1 == bytes.len() && tail != 0 {
            (acc << tail) | (b as u64 & ((1 << tail) - 1))
        } else {
            (acc << 8) | b as u64
        }
    });
    Some(code)
}

/// Unpack a code into a row-major bit matrix of `n * n` bits.
pub fn unpack(code: u64, n: usize) -> Vec<bool> {
    let nbits = n * n;
    (0..nbits)
        .map(|i| (code >> (nbits - 1 - i)) & 1 == 1)
        .collect()
}

/// Rotate a packed `n x n` code a quarter turn clockwise.
pub fn rotate_cw(code: u64, n: usize) -> u64 {
    let nbits = n * n;
    let mut out = 0u64;
    for r in 0..n {
        for c in 0..n {
            // new[r][c] = old[n - 1 - c][r]
            let src = (n - 1 - c) * n + r;
            let bit = (code >> (nbits - 1 - src)) & 1;
            out |= bit << (nbits - 1 - (r * n + c));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dictionary_sizes() {
        for kind in DictionaryKind::all() {
            let dict = Dictionary::new(kind);
            let n = dict.marker_size();
            assert!(dict.codes.iter().all(|&c| c >> (n * n) == 0), "{kind}");
        }
        assert_eq!(Dictionary::new(DictionaryKind::Dict6x6_50).len(), 50);
        assert_eq!(Dictionary::new(DictionaryKind::Dict6x6_100).len(), 100);
        assert_eq!(Dictionary::new(DictionaryKind::Dict6x6_50).max_correction_bits(), 6);
    }

    #[test]
    fn rotate_four_times_is_identity() {
        let code = 0b1000_0000_0000_0000u64;
        let once = rotate_cw(code, 4);
        // top-left cell moves to the top-right cell
        assert!(unpack(once, 4)[3]);
        let mut rotated = code;
        for _ in 0..4 {
            rotated = rotate_cw(rotated, 4);
        }
        assert_eq!(rotated, code);
    }

    #[test]
    fn minimum_distance_holds() {
        for kind in DictionaryKind::all() {
            let dict = Dictionary::new(kind);
            let n = dict.marker_size();
            let min_distance = 2 * dict.max_correction_bits() + 1;
            for (i, &a) in dict.codes.iter().enumerate() {
                let mut rotated = rotate_cw(a, n);
                for _ in 1..4 {
                    assert!((rotated ^ a).count_ones() >= min_distance, "{kind} self {i}");
                    rotated = rotate_cw(rotated, n);
                }
                for &b in &dict.codes[i + 1..] {
                    let mut rotated = b;
                    for _ in 0..4 {
                        assert!((rotated ^ a).count_ones() >= min_distance, "{kind} {i}");
                        rotated = rotate_cw(rotated, n);
                    }
                }
            }
        }
    }

    #[test]
    fn identify_rotated_and_noisy() -> Result<(), TargetError> {
        let dict = Dictionary::new(DictionaryKind::Dict6x6_50);
        let code = dict.code(17)?;
        let rotated = rotate_cw(rotate_cw(code, 6), 6);

        let mut bits = unpack(rotated, 6);
        bits[0] = !bits[0];
        bits[20] = !bits[20];

        let found = dict.identify(&bits, dict.max_correction_bits());
        assert_eq!(
            found,
            Some(Identification {
                id: 17,
                rotation: 2,
                distance: 2
            })
        );
        assert_eq!(dict.identify(&bits, 1), None);
        Ok(())
    }

    #[test]
    fn parse_kind() -> Result<(), TargetError> {
        assert_eq!("6x6_50".parse::<DictionaryKind>()?, DictionaryKind::Dict6x6_50);
        assert_eq!("4X4_50".parse::<DictionaryKind>()?, DictionaryKind::Dict4x4_50);
        // OpenCV names refer to the OpenCV tables, which are loaded from a file
        assert!("DICT_6X6_50".parse::<DictionaryKind>().is_err());
        assert!("7x7_1000".parse::<DictionaryKind>().is_err());
        Ok(())
    }

    #[test]
    fn opencv_byte_layout() {
        // first entry of OpenCV DICT_6X6_50
        assert_eq!(code_from_bytes(&[30, 61, 216, 42, 6], 6), Some(0x1e3dd82a6));
        assert_eq!(code_from_bytes(&[181, 50], 4), Some(0xb532));
        // 25 bits: the last byte keeps a single bit
        assert_eq!(code_from_bytes(&[0xff, 0, 0, 0x03], 5), Some(0x1fe0001));
        assert_eq!(code_from_bytes(&[30, 61, 216, 42], 6), None);
        assert_eq!(code_from_bytes(&[30, 61, 216, 42, 6, 0], 6), None);
    }

    #[test]
    fn dictionary_from_opencv_table() -> Result<(), TargetError> {
        let data = DictionaryData {
            marker_size: 6,
            max_correction_bits: 6,
            bytes_list: vec![vec![30, 61, 216, 42, 6], vec![14, 251, 163, 137, 1]],
        };
        let dict = Dictionary::from_data(&data)?;
        assert_eq!(dict.kind(), None);
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.code(0)?, 0x1e3dd82a6);

        let bits = unpack(rotate_cw(dict.code(0)?, 6), 6);
        let found = dict.identify(&bits, dict.max_correction_bits());
        assert_eq!(found.map(|f| (f.id, f.rotation, f.distance)), Some((0, 1, 0)));
        Ok(())
    }

    #[test]
    fn malformed_tables_are_rejected() {
        let short = DictionaryData {
            marker_size: 6,
            max_correction_bits: 3,
            bytes_list: vec![vec![30, 61, 216, 42, 6], vec![1, 2]],
        };
        assert!(matches!(
            Dictionary::from_data(&short),
            Err(TargetError::InvalidDictionary(_))
        ));

        let empty = DictionaryData {
            marker_size: 4,
            max_correction_bits: 1,
            bytes_list: Vec::new(),
        };
        assert!(Dictionary::from_data(&empty).is_err());

        let huge = DictionaryData {
            marker_size: 9,
            max_correction_bits: 1,
            bytes_list: vec![vec![0; 11]],
        };
        assert!(Dictionary::from_data(&huge).is_err());
    }
}
