//! The viewer engine: event dispatch plus the render pipeline.
//!
//! [`Viewer`] owns every piece of mutable state (image sequence, cache,
//! scheduler, display options, label map). UI code forwards events to it and
//! paints whatever [`Frame`] comes back; deferred renders come out of
//! [`Viewer::tick`], which the UI calls from its event loop.

use std::path::{Path, PathBuf};

use web_time::Instant;

use crate::compositor::{DisplayOptions, DrawPrimitive, compose, compose_preview};
use crate::config::ViewerConfig;
use crate::constants::LARGE_STEP;
use crate::error::SequenceError;
use crate::formats::yolo;
use crate::image_cache::{FileDecoder, ImageCache, ImageDecoder};
use crate::model::{AnnotationSummary, ClassId, ClassLabelMap};
use crate::preload;
use crate::scheduler::{RenderDecision, RenderMode, RenderScheduler};
use crate::sequence::{ImageSequence, LabelCoverage, detect_label_folder};

/// A successfully rendered image.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedFrame {
    pub index: usize,
    pub total: usize,
    pub mode: RenderMode,
    /// Image file name
    pub name: String,
    /// Base image followed by overlays, in paint order
    pub primitives: Vec<DrawPrimitive>,
    /// Annotation counts; `None` for previews, which skip label parsing
    pub summary: Option<AnnotationSummary>,
}

impl RenderedFrame {
    /// Title line, e.g. `img3.png (3/120)`.
    pub fn title(&self) -> String {
        let mut title = format!("{} ({}/{})", self.name, self.index + 1, self.total);
        if self.mode == RenderMode::Preview {
            title.push_str(" [preview]");
        }
        title
    }

    /// Short description of the frame content.
    pub fn info_text(&self) -> String {
        match self.summary {
            Some(summary) => format!(
                "Image: {}\nAnnotations: {}\nBoxes: {}, Segments: {}",
                self.name, summary.total, summary.boxes, summary.segments
            ),
            None => format!("Image: {}\nPreviewing...", self.name),
        }
    }

    /// Number of primitives drawn on top of the base image.
    pub fn overlay_count(&self) -> usize {
        self.primitives.iter().filter(|p| p.is_overlay()).count()
    }
}

/// Result of a render.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Rendered(RenderedFrame),
    /// The image could not be decoded. Nothing is drawn.
    Unavailable {
        index: usize,
        path: PathBuf,
        reason: String,
    },
}

impl Frame {
    pub fn index(&self) -> usize {
        match self {
            Frame::Rendered(frame) => frame.index,
            Frame::Unavailable { index, .. } => *index,
        }
    }

    pub fn mode(&self) -> Option<RenderMode> {
        match self {
            Frame::Rendered(frame) => Some(frame.mode),
            Frame::Unavailable { .. } => None,
        }
    }

    pub fn as_rendered(&self) -> Option<&RenderedFrame> {
        match self {
            Frame::Rendered(frame) => Some(frame),
            Frame::Unavailable { .. } => None,
        }
    }
}

/// Image browsing engine.
pub struct Viewer {
    sequence: ImageSequence,
    label_dir: Option<PathBuf>,
    cache: ImageCache,
    decoder: Box<dyn ImageDecoder>,
    preload_radius: usize,
    labels: ClassLabelMap,
    options: DisplayOptions,
    scheduler: RenderScheduler,
}

impl Viewer {
    /// Create a viewer that decodes images from disk.
    pub fn new(config: &ViewerConfig) -> Self {
        Self::with_decoder(config, Box::new(FileDecoder))
    }

    /// Create a viewer with a custom decoder.
    pub fn with_decoder(config: &ViewerConfig, decoder: Box<dyn ImageDecoder>) -> Self {
        Self {
            sequence: ImageSequence::default(),
            label_dir: None,
            cache: ImageCache::new(config.cache_capacity),
            decoder,
            preload_radius: config.preload_radius,
            labels: config.labels.clone(),
            options: config.display,
            scheduler: RenderScheduler::new(0)
                .with_preview_interval(config.preview_interval())
                .with_debounce_delay(config.debounce_delay()),
        }
    }

    /// Load every image in `folder` and render the first one.
    ///
    /// A label folder next to the images is picked up automatically when one
    /// exists; otherwise the current label folder is kept.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn open_folder(&mut self, folder: &Path) -> Result<Option<Frame>, SequenceError> {
        let sequence = ImageSequence::from_folder(folder)?;
        if let Some(label_dir) = detect_label_folder(folder) {
            self.label_dir = Some(label_dir);
        }
        Ok(self.set_sequence(sequence))
    }

    /// Replace the image sequence and render its first image.
    pub fn set_sequence(&mut self, sequence: ImageSequence) -> Option<Frame> {
        self.cache.clear();
        self.scheduler.reset(sequence.len());
        self.sequence = sequence;

        if let Some(coverage) = self.label_coverage() {
            log::info!(
                "Label coverage: {}/{} ({:.1}%)",
                coverage.labeled,
                coverage.total,
                coverage.percent()
            );
        }
        let decision = self.scheduler.jump(0);
        self.apply(decision)
    }

    /// Use `dir` for label files and re-render the current image.
    pub fn set_label_dir(&mut self, dir: impl Into<PathBuf>) -> Option<Frame> {
        self.label_dir = Some(dir.into());
        let index = self.scheduler.current_index();
        let decision = self.scheduler.jump(index);
        self.apply(decision)
    }

    pub fn label_dir(&self) -> Option<&Path> {
        self.label_dir.as_deref()
    }

    pub fn sequence(&self) -> &ImageSequence {
        &self.sequence
    }

    pub fn current_index(&self) -> usize {
        self.scheduler.current_index()
    }

    pub fn scheduler(&self) -> &RenderScheduler {
        &self.scheduler
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn labels(&self) -> &ClassLabelMap {
        &self.labels
    }

    /// Label files present for the current sequence, if a label folder is set.
    pub fn label_coverage(&self) -> Option<LabelCoverage> {
        let dir = self.label_dir.as_deref()?;
        Some(self.sequence.label_coverage(dir))
    }

    // Discrete navigation: rendered immediately.

    pub fn step(&mut self, delta: isize) -> Option<Frame> {
        let decision = self.scheduler.step(delta);
        self.apply(decision)
    }

    pub fn next_image(&mut self) -> Option<Frame> {
        self.step(1)
    }

    pub fn prev_image(&mut self) -> Option<Frame> {
        self.step(-1)
    }

    pub fn next_page(&mut self) -> Option<Frame> {
        self.step(LARGE_STEP)
    }

    pub fn prev_page(&mut self) -> Option<Frame> {
        self.step(-LARGE_STEP)
    }

    pub fn jump_to(&mut self, index: usize) -> Option<Frame> {
        let decision = self.scheduler.jump(index);
        self.apply(decision)
    }

    /// Jump to the image called `name` (extension optional).
    ///
    /// Returns `None` and leaves the index alone when no image matches.
    pub fn jump_to_name(&mut self, name: &str) -> Option<Frame> {
        match self.sequence.find_by_name(name) {
            Some(index) => self.jump_to(index),
            None => {
                log::warn!("Image not found: {}", name);
                None
            }
        }
    }

    // Slider.

    pub fn drag_start(&mut self) {
        self.scheduler.drag_start();
    }

    pub fn drag_move(&mut self, index: usize, now: Instant) -> Option<Frame> {
        let decision = self.scheduler.drag_move(index, now);
        self.apply(decision)
    }

    pub fn drag_end(&mut self) -> Option<Frame> {
        let decision = self.scheduler.drag_end();
        self.apply(decision)
    }

    // Option and label changes: debounced.

    pub fn toggle_boxes(&mut self, now: Instant) {
        self.options.show_boxes = !self.options.show_boxes;
        self.options_changed(now);
    }

    pub fn toggle_segments(&mut self, now: Instant) {
        self.options.show_segments = !self.options.show_segments;
        self.options_changed(now);
    }

    pub fn toggle_labels(&mut self, now: Instant) {
        self.options.show_labels = !self.options.show_labels;
        self.options_changed(now);
    }

    pub fn set_segment_alpha(&mut self, alpha: f32, now: Instant) {
        self.options.set_segment_alpha(alpha);
        self.options_changed(now);
    }

    pub fn set_label(&mut self, class_id: ClassId, name: impl Into<String>, now: Instant) {
        self.labels.set(class_id, name);
        self.options_changed(now);
    }

    pub fn remove_label(&mut self, class_id: ClassId, now: Instant) {
        if self.labels.remove(class_id).is_some() {
            self.options_changed(now);
        }
    }

    /// Run the deferred render if its quiet period is over.
    pub fn tick(&mut self, now: Instant) -> Option<Frame> {
        let mode = self.scheduler.poll(now)?;
        self.render(mode)
    }

    /// Render the current image in `mode`, bypassing the scheduler.
    ///
    /// Returns `None` only when no images are loaded.
    pub fn render(&mut self, mode: RenderMode) -> Option<Frame> {
        let index = self.scheduler.current_index();
        let entry = self.sequence.get(index)?;

        let image = match self.cache.get_or_decode(&entry.path, self.decoder.as_ref()) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("{}", e);
                return Some(Frame::Unavailable {
                    index,
                    path: entry.path.clone(),
                    reason: e.to_string(),
                });
            }
        };

        preload::warm(
            index,
            self.preload_radius,
            &self.sequence,
            &mut self.cache,
            self.decoder.as_ref(),
        );

        let (primitives, summary) = match mode {
            RenderMode::Preview => (compose_preview(&image), None),
            RenderMode::Full => {
                let records = match &self.label_dir {
                    Some(dir) => yolo::parse_file(&entry.label_path(dir)),
                    None => Vec::new(),
                };
                let primitives = compose(&image, &records, &self.labels, &self.options);
                (primitives, Some(AnnotationSummary::from_records(&records)))
            }
        };

        log::debug!(
            "Rendered image {} ({:?}, {} primitives)",
            index,
            mode,
            primitives.len()
        );

        Some(Frame::Rendered(RenderedFrame {
            index,
            total: self.sequence.len(),
            mode,
            name: entry.file_name(),
            primitives,
            summary,
        }))
    }

    fn options_changed(&mut self, now: Instant) {
        let decision = self.scheduler.options_changed(now);
        self.apply(decision);
    }

    fn apply(&mut self, decision: RenderDecision) -> Option<Frame> {
        match decision {
            RenderDecision::Render(mode) => self.render(mode),
            RenderDecision::Deferred(handle) => {
                log::trace!("Render deferred ({:?})", handle);
                None
            }
            RenderDecision::Skip => None,
        }
    }
}
