//! Ordered image sequences discovered from a folder.
//!
//! The sequence is built once when a folder is selected and is read-only
//! afterwards; selecting another folder replaces it wholesale.

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::error::SequenceError;

/// Supported image extensions (matched case-insensitively).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff"];

/// Extension of YOLO label files.
pub const LABEL_EXTENSION: &str = "txt";

/// Check if a path has a supported image extension.
pub fn is_image_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// One image of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageEntry {
    /// Full path of the image file
    pub path: PathBuf,
    /// File name without extension, used to find the label file
    pub stem: String,
}

impl ImageEntry {
    pub fn new(path: PathBuf) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, stem }
    }

    /// File name including extension.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// Label file for this image inside `label_dir`.
    pub fn label_path(&self, label_dir: &Path) -> PathBuf {
        label_dir.join(format!("{}.{}", self.stem, LABEL_EXTENSION))
    }
}

/// How many images of a sequence have a label file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelCoverage {
    pub labeled: usize,
    pub total: usize,
}

impl LabelCoverage {
    /// Labeled share in percent (0 for an empty sequence).
    pub fn percent(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.labeled as f32 / self.total as f32 * 100.0
        }
    }

    pub fn missing(&self) -> usize {
        self.total - self.labeled
    }

    pub fn is_complete(&self) -> bool {
        self.labeled == self.total
    }
}

/// Naturally sorted, de-duplicated list of images.
#[derive(Debug, Clone, Default)]
pub struct ImageSequence {
    entries: Vec<ImageEntry>,
}

impl ImageSequence {
    /// Discover image files in a folder, non-recursively.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn from_folder(folder: &Path) -> Result<Self, SequenceError> {
        let read_err = |source| SequenceError::ReadFolder {
            path: folder.to_path_buf(),
            source,
        };

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(folder).map_err(read_err)? {
            let path = entry.map_err(read_err)?.path();
            if path.is_file() && is_image_file(&path) {
                paths.push(path);
            }
        }

        let sequence = Self::from_paths(paths);
        if sequence.is_empty() {
            return Err(SequenceError::NoImages {
                path: folder.to_path_buf(),
            });
        }

        log::info!(
            "Loaded {} images from {:?} (natural order)",
            sequence.len(),
            folder
        );
        Ok(sequence)
    }

    /// Build a sequence from arbitrary paths: non-images and duplicates are
    /// dropped and the rest is naturally sorted.
    pub fn from_paths(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        let mut entries: Vec<ImageEntry> = paths
            .into_iter()
            .filter(|p| is_image_file(p))
            .map(ImageEntry::new)
            .collect();

        entries.sort_by(|a, b| {
            natural_cmp(&a.stem, &b.stem).then_with(|| a.path.cmp(&b.path))
        });
        entries.dedup_by(|a, b| a.path == b.path);

        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&ImageEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[ImageEntry] {
        &self.entries
    }

    /// Find an image by name, with or without extension.
    ///
    /// Exact stem matches win. If the input is all digits, an image whose stem
    /// is a number of the same value also matches (`"7"` finds `007.png`).
    pub fn find_by_name(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }

        let stem = Path::new(name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| name.to_string());

        if let Some(index) = self.entries.iter().position(|e| e.stem == stem) {
            return Some(index);
        }

        if is_all_digits(name) {
            let wanted = trim_leading_zeros(name);
            return self
                .entries
                .iter()
                .position(|e| is_all_digits(&e.stem) && trim_leading_zeros(&e.stem) == wanted);
        }

        None
    }

    /// Count images that have a label file in `label_dir`.
    pub fn label_coverage(&self, label_dir: &Path) -> LabelCoverage {
        let labeled = self
            .entries
            .iter()
            .filter(|e| e.label_path(label_dir).exists())
            .count();
        LabelCoverage {
            labeled,
            total: self.entries.len(),
        }
    }
}

/// Guess the label folder belonging to an image folder.
///
/// Tries, in order: the path with `images` replaced by `labels`, a sibling
/// `labels/<name>`, a sibling `labels`, and a nested `labels` folder. A path
/// without `images` in it matches itself first, which covers datasets that
/// keep each `.txt` next to its image.
pub fn detect_label_folder(image_folder: &Path) -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(
        image_folder.to_string_lossy().replace("images", "labels"),
    )];
    if let Some(parent) = image_folder.parent() {
        if let Some(name) = image_folder.file_name() {
            candidates.push(parent.join("labels").join(name));
        }
        candidates.push(parent.join("labels"));
    }
    candidates.push(image_folder.join("labels"));

    let found = candidates.into_iter().find(|c| c.is_dir());
    match &found {
        Some(dir) => log::info!("Detected label folder {:?}", dir),
        None => log::info!("No label folder detected next to {:?}", image_folder),
    }
    found
}

/// One run of a natural sort key.
#[derive(Debug, PartialEq, Eq)]
enum NaturalChunk {
    Text(String),
    /// Digit run with leading zeros removed
    Number(String),
}

impl PartialOrd for NaturalChunk {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NaturalChunk {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (NaturalChunk::Text(a), NaturalChunk::Text(b)) => a.cmp(b),
            // Without leading zeros a longer digit run is a larger number
            (NaturalChunk::Number(a), NaturalChunk::Number(b)) => {
                a.len().cmp(&b.len()).then_with(|| a.cmp(b))
            }
            (NaturalChunk::Number(_), NaturalChunk::Text(_)) => Ordering::Less,
            (NaturalChunk::Text(_), NaturalChunk::Number(_)) => Ordering::Greater,
        }
    }
}

/// Split a name into alternating text and number runs.
///
/// The key always starts with a text run (possibly empty), so two keys line up
/// kind by kind when compared.
fn natural_key(name: &str) -> Vec<NaturalChunk> {
    let mut key = Vec::new();
    let mut text = String::new();
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        if c.is_ascii_digit() {
            key.push(NaturalChunk::Text(std::mem::take(&mut text).to_lowercase()));
            let mut digits = String::from(c);
            while let Some(&d) = chars.peek() {
                if !d.is_ascii_digit() {
                    break;
                }
                digits.push(d);
                chars.next();
            }
            key.push(NaturalChunk::Number(trim_leading_zeros(&digits).to_string()));
        } else {
            text.push(c);
        }
    }
    key.push(NaturalChunk::Text(text.to_lowercase()));
    key
}

/// Compare two names in natural order (case-insensitive, numbers by value).
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    natural_key(a).cmp(&natural_key(b))
}

fn is_all_digits(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_digit())
}

fn trim_leading_zeros(digits: &str) -> &str {
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() { "0" } else { trimmed }
}
