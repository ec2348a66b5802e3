//! Global constants for the yview engine

use std::time::Duration;

/// Default number of decoded images held by the image cache
pub const DEFAULT_CACHE_CAPACITY: usize = 30;

/// Default number of images warmed on each side of the current index
pub const DEFAULT_PRELOAD_RADIUS: usize = 3;

/// Minimum time between two preview renders while dragging (~20 per second)
pub const DEFAULT_PREVIEW_INTERVAL: Duration = Duration::from_millis(50);

/// Quiet period before a deferred full render fires
pub const DEFAULT_DEBOUNCE_DELAY: Duration = Duration::from_millis(30);

/// Default fill opacity for segment polygons
pub const DEFAULT_SEGMENT_ALPHA: f32 = 0.3;

/// Stroke width for box and polygon outlines
pub const STROKE_WIDTH: f32 = 2.0;

/// Vertical offset of a label above its anchor point
pub const LABEL_OFFSET: f32 = 5.0;

/// Minimum number of vertices a segment needs to be drawn
pub const MIN_SEGMENT_POINTS: usize = 3;

/// Minimum token count of an annotation line (class id + 4 coordinates)
pub const MIN_LINE_TOKENS: usize = 5;

/// Step size for the large navigation jump
pub const LARGE_STEP: isize = 10;
