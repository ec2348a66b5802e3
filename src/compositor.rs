//! Turns a decoded image and its annotations into draw primitives.
//!
//! The output is an ordered list: the base image first, then one or two
//! primitives per visible annotation in record order. A drawing surface must
//! paint them in that order so later label lines end up on top.

use serde::{Deserialize, Serialize};

use crate::color_utils::{Rgb, class_color};
use crate::constants::{DEFAULT_SEGMENT_ALPHA, LABEL_OFFSET, MIN_SEGMENT_POINTS, STROKE_WIDTH};
use crate::image_cache::DecodedImage;
use crate::model::{AnnotationRecord, ClassLabelMap};

/// User-toggled overlay settings, read once per render.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayOptions {
    pub show_boxes: bool,
    pub show_segments: bool,
    pub show_labels: bool,
    /// Fill opacity of segment polygons, in [0, 1]
    pub segment_alpha: f32,
}

impl DisplayOptions {
    /// Set the segment fill opacity, clamped to [0, 1].
    pub fn set_segment_alpha(&mut self, alpha: f32) {
        self.segment_alpha = if alpha.is_nan() {
            DEFAULT_SEGMENT_ALPHA
        } else {
            alpha.clamp(0.0, 1.0)
        };
    }
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_boxes: true,
            show_segments: true,
            show_labels: true,
            segment_alpha: DEFAULT_SEGMENT_ALPHA,
        }
    }
}

/// One drawing instruction, in image pixel coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawPrimitive {
    /// The decoded image itself, drawn at the origin.
    Image(DecodedImage),
    /// Unfilled rectangle outline.
    Rectangle {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        stroke: Rgb,
        stroke_width: f32,
    },
    /// Closed polygon with a translucent fill and an opaque outline.
    Polygon {
        points: Vec<(f32, f32)>,
        fill: Rgb,
        fill_alpha: f32,
        stroke: Rgb,
        stroke_width: f32,
    },
    /// Label text anchored at its bottom-left corner.
    Text {
        x: f32,
        y: f32,
        text: String,
        color: Rgb,
    },
}

impl DrawPrimitive {
    pub fn is_overlay(&self) -> bool {
        !matches!(self, DrawPrimitive::Image(_))
    }
}

/// Primitives for a preview render: the base image only.
pub fn compose_preview(image: &DecodedImage) -> Vec<DrawPrimitive> {
    vec![DrawPrimitive::Image(image.clone())]
}

/// Primitives for a full render: the base image plus annotation overlays.
pub fn compose(
    image: &DecodedImage,
    records: &[AnnotationRecord],
    labels: &ClassLabelMap,
    options: &DisplayOptions,
) -> Vec<DrawPrimitive> {
    let w = image.width() as f32;
    let h = image.height() as f32;
    let mut primitives = compose_preview(image);

    for record in records {
        let color = class_color(record.class_id());

        match record {
            AnnotationRecord::BBox {
                x_center,
                y_center,
                width,
                height,
                ..
            } if options.show_boxes => {
                let box_w = width * w;
                let box_h = height * h;
                let x1 = x_center * w - box_w / 2.0;
                let y1 = y_center * h - box_h / 2.0;

                primitives.push(DrawPrimitive::Rectangle {
                    x: x1,
                    y: y1,
                    width: box_w,
                    height: box_h,
                    stroke: color,
                    stroke_width: STROKE_WIDTH,
                });
                if options.show_labels {
                    primitives.push(label_text(labels, record, x1, y1, color));
                }
            }
            AnnotationRecord::Segment { points, .. }
                if options.show_segments && points.len() >= MIN_SEGMENT_POINTS =>
            {
                let pixel_points: Vec<(f32, f32)> =
                    points.iter().map(|(x, y)| (x * w, y * h)).collect();
                let (x0, y0) = pixel_points[0];

                primitives.push(DrawPrimitive::Polygon {
                    points: pixel_points,
                    fill: color,
                    fill_alpha: options.segment_alpha,
                    stroke: color,
                    stroke_width: STROKE_WIDTH,
                });
                if options.show_labels {
                    primitives.push(label_text(labels, record, x0, y0, color));
                }
            }
            _ => {}
        }
    }

    primitives
}

fn label_text(
    labels: &ClassLabelMap,
    record: &AnnotationRecord,
    x: f32,
    y: f32,
    color: Rgb,
) -> DrawPrimitive {
    DrawPrimitive::Text {
        x,
        y: y - LABEL_OFFSET,
        text: labels.resolve(record.class_id()),
        color,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color_utils::PALETTE;

    fn image(width: u32, height: u32) -> DecodedImage {
        DecodedImage::from_rgba8(vec![0; (width * height * 4) as usize], width, height)
    }

    fn bbox(class_id: i64) -> AnnotationRecord {
        AnnotationRecord::BBox {
            class_id,
            x_center: 0.5,
            y_center: 0.5,
            width: 0.25,
            height: 0.5,
        }
    }

    fn triangle(class_id: i64) -> AnnotationRecord {
        AnnotationRecord::Segment {
            class_id,
            points: vec![(0.1, 0.1), (0.2, 0.1), (0.15, 0.3)],
        }
    }

    #[test]
    fn test_bbox_to_pixel_rectangle() {
        let primitives = compose(
            &image(200, 100),
            &[bbox(1)],
            &ClassLabelMap::default(),
            &DisplayOptions::default(),
        );
        assert_eq!(primitives.len(), 3);
        assert!(matches!(primitives[0], DrawPrimitive::Image(_)));
        assert_eq!(
            primitives[1],
            DrawPrimitive::Rectangle {
                x: 75.0,
                y: 25.0,
                width: 50.0,
                height: 50.0,
                stroke: PALETTE[1],
                stroke_width: 2.0,
            }
        );
        assert_eq!(
            primitives[2],
            DrawPrimitive::Text {
                x: 75.0,
                y: 20.0,
                text: "1".to_string(),
                color: PALETTE[1],
            }
        );
    }

    #[test]
    fn test_segment_to_polygon() {
        let mut options = DisplayOptions::default();
        options.set_segment_alpha(0.5);
        let primitives = compose(
            &image(100, 100),
            &[triangle(12)],
            &ClassLabelMap::default(),
            &options,
        );
        assert_eq!(primitives.len(), 3);
        match &primitives[1] {
            DrawPrimitive::Polygon {
                points,
                fill,
                fill_alpha,
                stroke,
                stroke_width,
            } => {
                assert_eq!(points.len(), 3);
                assert!((points[0].0 - 10.0).abs() < 1e-4);
                assert!((points[2].1 - 30.0).abs() < 1e-4);
                assert_eq!(*fill, PALETTE[2]);
                assert_eq!(*stroke, PALETTE[2]);
                assert_eq!(*fill_alpha, 0.5);
                assert_eq!(*stroke_width, 2.0);
            }
            other => panic!("expected polygon, got {:?}", other),
        }
        match &primitives[2] {
            DrawPrimitive::Text { text, x, y, .. } => {
                assert_eq!(text, "class_12");
                assert!((x - 10.0).abs() < 1e-4);
                assert!((y - 5.0).abs() < 1e-4);
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[test]
    fn test_short_segment_skipped() {
        let record = AnnotationRecord::Segment {
            class_id: 0,
            points: vec![(0.1, 0.1), (0.2, 0.2)],
        };
        let primitives = compose(
            &image(10, 10),
            &[record],
            &ClassLabelMap::default(),
            &DisplayOptions::default(),
        );
        assert_eq!(primitives.len(), 1);
    }

    #[test]
    fn test_flags_disable_overlays() {
        let records = [bbox(0), triangle(1)];
        let labels = ClassLabelMap::default();

        let no_boxes = DisplayOptions {
            show_boxes: false,
            ..DisplayOptions::default()
        };
        let primitives = compose(&image(10, 10), &records, &labels, &no_boxes);
        assert!(!primitives
            .iter()
            .any(|p| matches!(p, DrawPrimitive::Rectangle { .. })));
        assert!(primitives
            .iter()
            .any(|p| matches!(p, DrawPrimitive::Polygon { .. })));

        let no_labels = DisplayOptions {
            show_labels: false,
            ..DisplayOptions::default()
        };
        let primitives = compose(&image(10, 10), &records, &labels, &no_labels);
        assert_eq!(primitives.len(), 3);
        assert!(!primitives
            .iter()
            .any(|p| matches!(p, DrawPrimitive::Text { .. })));

        let nothing = DisplayOptions {
            show_boxes: false,
            show_segments: false,
            ..DisplayOptions::default()
        };
        assert_eq!(compose(&image(10, 10), &records, &labels, &nothing).len(), 1);
    }

    #[test]
    fn test_record_order_is_draw_order() {
        let primitives = compose(
            &image(10, 10),
            &[triangle(3), bbox(4)],
            &ClassLabelMap::default(),
            &DisplayOptions {
                show_labels: false,
                ..DisplayOptions::default()
            },
        );
        assert!(matches!(primitives[1], DrawPrimitive::Polygon { .. }));
        assert!(matches!(primitives[2], DrawPrimitive::Rectangle { .. }));
    }

    #[test]
    fn test_palette_wrap_in_compose() {
        let primitives = compose(
            &image(10, 10),
            &[bbox(0), bbox(10)],
            &ClassLabelMap::default(),
            &DisplayOptions {
                show_labels: false,
                ..DisplayOptions::default()
            },
        );
        let strokes: Vec<Rgb> = primitives
            .iter()
            .filter_map(|p| match p {
                DrawPrimitive::Rectangle { stroke, .. } => Some(*stroke),
                _ => None,
            })
            .collect();
        assert_eq!(strokes, vec![PALETTE[0], PALETTE[0]]);
    }

    #[test]
    fn test_preview_is_base_image_only() {
        let img = image(4, 4);
        let primitives = compose_preview(&img);
        assert_eq!(primitives, vec![DrawPrimitive::Image(img)]);
        assert!(!primitives[0].is_overlay());
    }

    #[test]
    fn test_segment_alpha_clamped() {
        let mut options = DisplayOptions::default();
        options.set_segment_alpha(1.7);
        assert_eq!(options.segment_alpha, 1.0);
        options.set_segment_alpha(-0.2);
        assert_eq!(options.segment_alpha, 0.0);
        options.set_segment_alpha(f32::NAN);
        assert_eq!(options.segment_alpha, DEFAULT_SEGMENT_ALPHA);
    }
}
