//! yview - YOLO dataset viewer engine
//!
//! Caches decoded images, preloads the neighborhood of the active image and
//! schedules preview and full renders so that scrubbing through a large image
//! folder stays responsive. Rendering produces an ordered list of draw
//! primitives; painting them is left to the embedding UI.

pub mod color_utils;
pub mod compositor;
pub mod config;
pub mod constants;
pub mod error;
pub mod formats;
pub mod image_cache;
pub mod model;
pub mod preload;
pub mod scheduler;
pub mod sequence;
pub mod viewer;

pub use compositor::{DisplayOptions, DrawPrimitive};
pub use config::ViewerConfig;
pub use image_cache::{DecodedImage, FileDecoder, ImageCache, ImageDecoder};
pub use model::{AnnotationRecord, ClassLabelMap};
pub use scheduler::{RenderDecision, RenderMode, RenderScheduler};
pub use sequence::{ImageEntry, ImageSequence};
pub use viewer::{Frame, RenderedFrame, Viewer};
