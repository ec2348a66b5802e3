//! YOLO label file parsing.
//!
//! YOLO uses one `.txt` file per image, named after the image stem.
//!
//! # Detection Format (Bounding Boxes)
//!
//! ```text
//! <class_id> <x_center> <y_center> <width> <height>
//! ```
//!
//! # Segmentation Format (Polygons)
//!
//! ```text
//! <class_id> <x1> <y1> <x2> <y2> ... <xn> <yn>
//! ```
//!
//! All coordinates are normalized to [0, 1] relative to image size. Lines are
//! returned in file order, which is also the order they are drawn in.

use std::io::ErrorKind;
use std::path::Path;

use crate::constants::MIN_LINE_TOKENS;
use crate::model::{AnnotationRecord, ClassId};

/// Parse the label file at `path`.
///
/// A missing file means the image is unlabeled and yields no records. Read
/// failures are logged and treated the same way so a render never aborts on
/// a label file.
pub fn parse_file(path: &Path) -> Vec<AnnotationRecord> {
    match std::fs::read_to_string(path) {
        Ok(content) => parse_str(&content),
        Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
        Err(e) => {
            log::warn!("Failed to read label file {:?}: {}", path, e);
            Vec::new()
        }
    }
}

/// Parse label file content. Malformed lines are skipped.
pub fn parse_str(content: &str) -> Vec<AnnotationRecord> {
    content
        .lines()
        .enumerate()
        .filter_map(|(line_num, line)| {
            let record = parse_line(line);
            if record.is_none() && !line.trim().is_empty() {
                log::trace!("Skipping malformed label line {}: {:?}", line_num + 1, line);
            }
            record
        })
        .collect()
}

/// Parse a single label line.
fn parse_line(line: &str) -> Option<AnnotationRecord> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < MIN_LINE_TOKENS {
        return None;
    }

    let class_id: ClassId = parts[0].parse().ok()?;
    let coords = parts[1..]
        .iter()
        .map(|token| token.parse::<f32>().ok())
        .collect::<Option<Vec<f32>>>()?;

    if let [x_center, y_center, width, height] = coords[..] {
        return Some(AnnotationRecord::BBox {
            class_id,
            x_center,
            y_center,
            width,
            height,
        });
    }

    // chunks_exact drops an odd trailing value
    let points = coords
        .chunks_exact(2)
        .map(|pair| (pair[0], pair[1]))
        .collect();

    Some(AnnotationRecord::Segment { class_id, points })
}
