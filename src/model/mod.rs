//! Data models for annotations and class labels.

mod annotation;
mod label_map;

pub use annotation::{AnnotationRecord, AnnotationSummary, ClassId};
pub use label_map::ClassLabelMap;
