use std::path::{Path, PathBuf};

use crate::error::IoError;

/// File name prefix of calibration images.
pub const IMAGE_PREFIX: &str = "img_calib_";

/// One image of the calibration set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageSetEntry {
    /// Full path to the image file.
    pub path: PathBuf,
    /// The integer `n` embedded in `img_calib_<n>.png`.
    pub index: usize,
}

/// Ordered manifest of the `img_calib_<n>.png` files of a directory.
///
/// Entries are sorted by their embedded index. Files that do not end in `.png`
/// are ignored; a `.png` file with any other name is an error.
#[derive(Clone, Debug)]
pub struct ImageSet {
    dir: PathBuf,
    entries: Vec<ImageSetEntry>,
}

impl ImageSet {
    /// Enumerate an existing image directory.
    ///
    /// # Errors
    ///
    /// Fails when the directory does not exist, when a `.png` name does not
    /// follow the naming convention, or when two files share an index.
    pub fn scan(dir: impl AsRef<Path>) -> Result<Self, IoError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(IoError::FileDoesNotExist(dir.to_path_buf()));
        }

        let mut entries = Vec::new();
        for dir_entry in std::fs::read_dir(dir)? {
            let path = dir_entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_png = path
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if !is_png {
                continue;
            }
            let index = path
                .file_name()
                .and_then(|name| name.to_str())
                .and_then(parse_index)
                .ok_or_else(|| IoError::MalformedImageName(path.clone()))?;
            entries.push(ImageSetEntry { path, index });
        }

        entries.sort_by_key(|e| e.index);
        if let Some(pair) = entries.windows(2).find(|w| w[0].index == w[1].index) {
            return Err(IoError::DuplicateImageIndex(
                pair[1].index,
                pair[1].path.clone(),
            ));
        }

        log::debug!("found {} calibration images in {}", entries.len(), dir.display());

        Ok(Self {
            dir: dir.to_path_buf(),
            entries,
        })
    }

    /// Create the directory when missing, then enumerate it.
    pub fn open_or_create(dir: impl AsRef<Path>) -> Result<Self, IoError> {
        std::fs::create_dir_all(dir.as_ref())?;
        Self::scan(dir)
    }

    /// The directory holding the images.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The entries sorted by index.
    pub fn entries(&self) -> &[ImageSetEntry] {
        &self.entries
    }

    /// Number of images in the set.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the set holds no images.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The path an image with the given index is stored at.
    pub fn path_for(&self, index: usize) -> PathBuf {
        self.dir.join(file_name(index))
    }

    /// Register a newly written image and return its path.
    ///
    /// An entry with the same index is kept, its file having been replaced.
    pub fn insert(&mut self, index: usize) -> PathBuf {
        let path = self.path_for(index);
        if let Err(pos) = self.entries.binary_search_by_key(&index, |e| e.index) {
            self.entries.insert(
                pos,
                ImageSetEntry {
                    path: path.clone(),
                    index,
                },
            );
        }
        path
    }
}

/// The file name of the image with the given index, e.g. `img_calib_3.png`.
pub fn file_name(index: usize) -> String {
    format!("{IMAGE_PREFIX}{index}.png")
}

/// Extract `n` from `img_calib_<n>.png`, the extension in any case.
pub fn parse_index(file_name: &str) -> Option<usize> {
    let path = Path::new(file_name);
    if !path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
    {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(IMAGE_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn parse_names() {
        assert_eq!(parse_index("img_calib_0.png"), Some(0));
        assert_eq!(parse_index("img_calib_42.png"), Some(42));
        assert_eq!(parse_index("img_calib_.png"), None);
        assert_eq!(parse_index("img_calib_-1.png"), None);
        assert_eq!(parse_index("img_calib_3a.png"), None);
        assert_eq!(parse_index("board.png"), None);
        assert_eq!(parse_index("img_calib_3.Png"), Some(3));
        assert_eq!(parse_index("img_calib_5.PNG"), Some(5));
        assert_eq!(parse_index("img_calib_5.jpg"), None);
        assert_eq!(file_name(7), "img_calib_7.png");
    }

    #[test]
    fn scan_sorts_numerically() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        for n in [10, 2, 1, 0] {
            fs::write(tmp_dir.path().join(file_name(n)), b"")?;
        }
        fs::write(tmp_dir.path().join("notes.txt"), b"ignored")?;

        let set = ImageSet::scan(tmp_dir.path())?;
        let indices: Vec<usize> = set.entries().iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 1, 2, 10]);
        Ok(())
    }

    #[test]
    fn scan_accepts_mixed_case_extension() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        fs::write(tmp_dir.path().join("img_calib_3.Png"), b"")?;
        fs::write(tmp_dir.path().join("img_calib_1.png"), b"")?;

        let set = ImageSet::scan(tmp_dir.path())?;
        let indices: Vec<usize> = set.entries().iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![1, 3]);
        Ok(())
    }

    #[test]
    fn scan_rejects_malformed_png() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        fs::write(tmp_dir.path().join(file_name(0)), b"")?;
        fs::write(tmp_dir.path().join("snapshot.png"), b"")?;

        match ImageSet::scan(tmp_dir.path()) {
            Err(IoError::MalformedImageName(path)) => {
                assert!(path.ends_with("snapshot.png"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn scan_rejects_duplicate_index() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        fs::write(tmp_dir.path().join("img_calib_1.png"), b"")?;
        fs::write(tmp_dir.path().join("img_calib_01.png"), b"")?;

        assert!(matches!(
            ImageSet::scan(tmp_dir.path()),
            Err(IoError::DuplicateImageIndex(1, _))
        ));
        Ok(())
    }

    #[test]
    fn open_or_create_and_insert() -> Result<(), IoError> {
        let tmp_dir = tempfile::tempdir()?;
        let dir = tmp_dir.path().join("imgs-cal");

        assert!(matches!(
            ImageSet::scan(&dir),
            Err(IoError::FileDoesNotExist(_))
        ));

        let mut set = ImageSet::open_or_create(&dir)?;
        assert!(set.is_empty());

        assert_eq!(set.insert(2), dir.join("img_calib_2.png"));
        assert_eq!(set.insert(0), dir.join("img_calib_0.png"));
        // replacing keeps a single entry
        set.insert(2);
        let indices: Vec<usize> = set.entries().iter().map(|e| e.index).collect();
        assert_eq!(indices, vec![0, 2]);
        Ok(())
    }
}
