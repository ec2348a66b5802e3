//! Parsed annotation records.

/// Class identifier as written in a label file.
pub type ClassId = i64;

/// One annotation read from a YOLO label line.
///
/// All coordinates are fractions of the image width/height. They are not
/// validated: values outside [0, 1] simply land off-canvas when drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationRecord {
    /// Axis-aligned box in center/size form.
    BBox {
        class_id: ClassId,
        x_center: f32,
        y_center: f32,
        width: f32,
        height: f32,
    },
    /// Polygon vertex list in drawing order.
    Segment {
        class_id: ClassId,
        points: Vec<(f32, f32)>,
    },
}

impl AnnotationRecord {
    /// Class id shared by both variants.
    pub fn class_id(&self) -> ClassId {
        match self {
            AnnotationRecord::BBox { class_id, .. } | AnnotationRecord::Segment { class_id, .. } => {
                *class_id
            }
        }
    }

    pub fn is_bbox(&self) -> bool {
        matches!(self, AnnotationRecord::BBox { .. })
    }

    pub fn is_segment(&self) -> bool {
        matches!(self, AnnotationRecord::Segment { .. })
    }
}

/// Per-image annotation counts, shown next to a full render.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub total: usize,
    pub boxes: usize,
    pub segments: usize,
}

impl AnnotationSummary {
    pub fn from_records(records: &[AnnotationRecord]) -> Self {
        let boxes = records.iter().filter(|r| r.is_bbox()).count();
        Self {
            total: records.len(),
            boxes,
            segments: records.len() - boxes,
        }
    }
}
