//! Annotation file formats.
//!
//! Only the YOLO text format is read. Label files are re-parsed on every full
//! render so edits made outside the viewer show up on the next visit.

pub mod yolo;

pub use yolo::{parse_file, parse_str};
