//! Interactive editing session: one uploaded image at a time, recomposed as the text changes.
//!
//! The session is single-threaded and tick driven. An upload creates a fresh [`ImageSession`]
//! record and a [`LoadJob`]; each call to [`Session::tick`] runs at most one due load phase,
//! then drains the [`InteractionScheduler`]. Only the segmentation collaborator runs off-thread,
//! and its result is accepted only by the record that started it.
//!
//! Error policy: an empty mask or an unavailable text surface leaves the frame empty and the
//! session usable. Decode and segmentation failures end the current image; the session reports
//! [`SessionStatus::Failed`] until the next upload.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::assets::decode::{decode_image, encode_png};
use crate::assets::fonts::FontBook;
use crate::config::{DetectionMode, PipelineConfig};
use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{OccludeError, OccludeResult};
use crate::mask::overlay::debug_overlay;
use crate::mask::{Mask, MaskGenerator};
use crate::pipeline::prepare_cutout;
use crate::render::composite::{CompositeResult, composite};
use crate::render::resize::resize_to_fit;
use crate::render::text::{TextRasterizer, TextSpec};

/// Phase scheduling for an upload.
pub mod loader;
/// Drag debounce and idle coalescing.
pub mod scheduler;
/// Segmentation collaborator boundary.
pub mod segment;

use loader::{LoadJob, LoadPhase};
use scheduler::{InteractionScheduler, SchedulerStats};
use segment::{SegmentationTask, Segmenter};

/// How often [`Session::run_until_ready`] checks on a running segmentation worker.
const SEGMENTATION_POLL: Duration = Duration::from_millis(10);

/// What the host should show.
#[derive(Clone, Debug, PartialEq)]
pub enum SessionStatus {
    NoImage,
    Loading {
        phase: LoadPhase,
        /// Overall load progress in [0, 1].
        progress: f32,
    },
    Ready,
    /// The last upload cannot be used; a new upload is required.
    Failed { reason: String },
}

/// State owned by one uploaded image.
///
/// Never reused across uploads: a new upload drops the old record (cancelling its work) and
/// builds a new one.
#[derive(Debug)]
pub struct ImageSession {
    generation: u64,
    source: Option<ImageBuffer>,
    canvas: Option<Arc<ImageBuffer>>,
    mask: Option<Arc<Mask>>,
    job: LoadJob,
    segmentation: Option<SegmentationTask>,
    last: Option<CompositeResult>,
}

impl ImageSession {
    fn new(generation: u64, source: ImageBuffer, job: LoadJob) -> Self {
        Self {
            generation,
            source: Some(source),
            canvas: None,
            mask: None,
            job,
            segmentation: None,
            last: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Resized working image, once the resize phase has run.
    pub fn canvas(&self) -> Option<&ImageBuffer> {
        self.canvas.as_deref()
    }

    pub fn mask(&self) -> Option<&Arc<Mask>> {
        self.mask.as_ref()
    }

    pub fn phase(&self) -> LoadPhase {
        self.job.phase()
    }

    pub fn last_result(&self) -> Option<&CompositeResult> {
        self.last.as_ref()
    }

    fn cancel(&self) {
        self.job.cancel();
        if let Some(task) = &self.segmentation {
            task.cancel();
        }
    }

    fn segmentation_progress(&self) -> f32 {
        self.segmentation.as_ref().map_or(0.0, |t| t.progress())
    }
}

/// Text-behind-subject editor state.
pub struct Session {
    config: PipelineConfig,
    generator: MaskGenerator,
    rasterizer: TextRasterizer,
    segmenter: Option<Arc<dyn Segmenter>>,
    scheduler: InteractionScheduler<TextSpec>,
    text: TextSpec,
    current: Option<ImageSession>,
    generation: u64,
    failure: Option<OccludeError>,
}

impl Session {
    pub fn new(config: PipelineConfig, fonts: FontBook) -> OccludeResult<Self> {
        config.validate()?;
        Ok(Self {
            generator: MaskGenerator::from_config(&config),
            rasterizer: TextRasterizer::new(fonts, config.line_height_factor),
            segmenter: None,
            scheduler: InteractionScheduler::new(config.drag_debounce()),
            text: TextSpec::default(),
            current: None,
            generation: 0,
            failure: None,
            config,
        })
    }

    /// Attach the collaborator used in segmentation mode.
    pub fn with_segmenter(mut self, segmenter: Arc<dyn Segmenter>) -> Self {
        self.segmenter = Some(segmenter);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn text(&self) -> &TextSpec {
        &self.text
    }

    /// Generation of the current (or most recent) upload; 0 before the first.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn image(&self) -> Option<&ImageSession> {
        self.current.as_ref()
    }

    pub fn scheduler_stats(&self) -> SchedulerStats {
        self.scheduler.stats()
    }

    /// Start loading `image`, abandoning whatever the previous upload was doing.
    #[tracing::instrument(skip(self, image), fields(w = image.width(), h = image.height()))]
    pub fn upload(&mut self, image: ImageBuffer, now: Instant) -> OccludeResult<u64> {
        self.invalidate();
        self.generation += 1;
        if self.config.mode == DetectionMode::Segmentation && self.segmenter.is_none() {
            let e = OccludeError::segmentation("segmentation mode requires a segmenter");
            self.failure = Some(e.replicate());
            return Err(e);
        }
        self.failure = None;
        self.current = Some(ImageSession::new(
            self.generation,
            image,
            LoadJob::new(self.config.phase_delay(), now),
        ));
        tracing::debug!(generation = self.generation, "upload accepted");
        Ok(self.generation)
    }

    /// Decode and upload encoded image bytes.
    pub fn upload_bytes(&mut self, bytes: &[u8], now: Instant) -> OccludeResult<u64> {
        match decode_image(bytes) {
            Ok(image) => self.upload(image, now),
            Err(e) => {
                self.invalidate();
                self.generation += 1;
                self.failure = Some(e.replicate());
                Err(e)
            }
        }
    }

    fn invalidate(&mut self) {
        self.scheduler.cancel();
        if let Some(old) = self.current.take() {
            old.cancel();
            tracing::debug!(generation = old.generation, "image session invalidated");
        }
    }

    fn fail(&mut self, e: OccludeError) -> OccludeError {
        tracing::warn!(error = %e, generation = self.generation, "image failed");
        self.invalidate();
        self.failure = Some(e.replicate());
        e
    }

    /// Replace the text and schedule a recomposition.
    pub fn set_text(&mut self, spec: TextSpec, now: Instant) -> OccludeResult<()> {
        spec.validate()?;
        self.text = spec.clone();
        self.scheduler.request(spec, now);
        Ok(())
    }

    /// Pointer pressed over the canvas.
    pub fn pointer_down(&mut self) {
        self.scheduler.pointer_down();
    }

    /// Move the text anchor to (`x`, `y`) percent, clamped to the canvas.
    pub fn drag_to(&mut self, x: f32, y: f32, now: Instant) {
        self.text = self.text.with_anchor(x, y);
        self.scheduler.request(self.text.clone(), now);
    }

    pub fn pointer_up(&mut self, now: Instant) {
        self.scheduler.pointer_up(now);
    }

    pub fn pointer_leave(&mut self, now: Instant) {
        self.scheduler.pointer_leave(now);
    }

    /// Advance the session to `now`. Returns whether a new frame was produced.
    ///
    /// Runs at most one load phase per call. Segmentation and decode failures end the current
    /// image and are returned once.
    pub fn tick(&mut self, now: Instant) -> OccludeResult<bool> {
        let (due, done) = match self.current.as_ref() {
            None => return Ok(false),
            Some(img) => (img.job.due(now), img.job.is_done()),
        };
        if let Some(phase) = due {
            return self.run_phase(phase, now).map_err(|e| self.fail(e));
        }
        if !done {
            return Ok(false);
        }
        match self.scheduler.tick(now) {
            Some(spec) => Ok(self.recompose(&spec)),
            None => Ok(false),
        }
    }

    fn run_phase(&mut self, phase: LoadPhase, now: Instant) -> OccludeResult<bool> {
        let Some(img) = self.current.as_mut() else {
            return Ok(false);
        };
        tracing::trace!(phase = phase.name(), generation = img.generation, "load phase");

        match phase {
            LoadPhase::Resize => {
                let source = img
                    .source
                    .take()
                    .ok_or_else(|| OccludeError::validation("upload was already resized"))?;
                let canvas = Arc::new(resize_to_fit(&source, self.config.max_dimension)?);
                if self.config.mode == DetectionMode::Segmentation {
                    let segmenter = self.segmenter.clone().ok_or_else(|| {
                        OccludeError::segmentation("segmentation mode requires a segmenter")
                    })?;
                    img.segmentation = Some(SegmentationTask::spawn(
                        segmenter,
                        Arc::clone(&canvas),
                        img.generation,
                    )?);
                }
                img.canvas = Some(canvas);
                img.job.advance(now);
                Ok(false)
            }
            LoadPhase::DetectMask => {
                let canvas = img
                    .canvas
                    .clone()
                    .ok_or_else(|| OccludeError::validation("mask requested before resize"))?;
                let mask = match img.segmentation.as_mut() {
                    None => self.generator.detect_edges(canvas.view()),
                    Some(task) => {
                        let Some(outcome) = task.poll() else {
                            return Ok(false);
                        };
                        img.segmentation = None;
                        let cutout = outcome?;
                        let cutout = prepare_cutout(&cutout, canvas.width(), canvas.height())?;
                        self.generator.detect_from_cutout(cutout)
                    }
                };
                if mask.is_empty() {
                    tracing::warn!("mask unavailable, frames stay empty");
                }
                img.mask = Some(Arc::new(mask));
                img.job.advance(now);
                Ok(false)
            }
            LoadPhase::FirstRender => {
                img.job.advance(now);
                self.scheduler.cancel();
                let spec = self.text.clone();
                Ok(self.recompose(&spec))
            }
            LoadPhase::Done => Ok(false),
        }
    }

    fn recompose(&mut self, spec: &TextSpec) -> bool {
        let Some(img) = self.current.as_mut() else {
            return false;
        };
        let (Some(canvas), Some(mask)) = (img.canvas.as_ref(), img.mask.as_ref()) else {
            return false;
        };
        let layer = match self
            .rasterizer
            .rasterize(spec, canvas.width(), canvas.height())
        {
            Ok(layer) => layer,
            Err(e) => {
                tracing::warn!(error = %e, "text layer unavailable");
                return false;
            }
        };
        let result = composite(canvas, mask, &layer);
        if result.is_empty() {
            return false;
        }
        img.last = Some(result);
        true
    }

    /// Latest composited frame.
    pub fn frame(&self) -> Option<&ImageBuffer> {
        self.current.as_ref()?.last.as_ref()?.image()
    }

    /// Latest frame as PNG bytes, for download.
    pub fn encode_frame(&self) -> OccludeResult<Option<Vec<u8>>> {
        self.frame().map(encode_png).transpose()
    }

    /// Canvas with the last frame's mask tinted in the configured overlay color.
    pub fn debug_overlay(&self) -> OccludeResult<Option<ImageBuffer>> {
        let Some(img) = self.current.as_ref() else {
            return Ok(None);
        };
        let (Some(canvas), Some(last)) = (img.canvas.as_ref(), img.last.as_ref()) else {
            return Ok(None);
        };
        debug_overlay(canvas, last.mask(), self.config.overlay_color).map(Some)
    }

    pub fn status(&self) -> SessionStatus {
        if let Some(e) = &self.failure {
            return SessionStatus::Failed {
                reason: e.to_string(),
            };
        }
        let Some(img) = self.current.as_ref() else {
            return SessionStatus::NoImage;
        };
        let phase = img.job.phase();
        if phase == LoadPhase::Done {
            return SessionStatus::Ready;
        }
        let within = match phase {
            LoadPhase::DetectMask => img.segmentation_progress(),
            _ => 0.0,
        };
        SessionStatus::Loading {
            phase,
            progress: img.job.progress(within),
        }
    }

    /// Earliest instant at which [`tick`](Self::tick) has work to do.
    ///
    /// `None` while the segmentation worker is still running: its completion time is unknown,
    /// so hosts keep ticking on their own cadence (e.g. when repainting progress).
    pub fn next_deadline(&self) -> Option<Instant> {
        let img = self.current.as_ref()?;
        if img.job.is_done() {
            self.scheduler.next_due()
        } else if img.segmentation.is_some() {
            None
        } else {
            img.job.next_due()
        }
    }

    /// Whether the current image is waiting on the segmentation worker.
    pub fn is_segmenting(&self) -> bool {
        self.current
            .as_ref()
            .is_some_and(|img| img.segmentation.is_some())
    }

    /// Tick on the wall clock until the current image is ready and no recomposition is pending.
    pub fn run_until_ready(&mut self, timeout: Duration) -> OccludeResult<()> {
        let deadline = Instant::now() + timeout;
        loop {
            self.tick(Instant::now())?;
            if let Some(e) = &self.failure {
                return Err(e.replicate());
            }
            match self.status() {
                SessionStatus::Ready if !self.scheduler.has_pending() => return Ok(()),
                SessionStatus::NoImage => return Ok(()),
                _ => {}
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(OccludeError::Other(anyhow::anyhow!(
                    "session not ready after {timeout:?}"
                )));
            }
            let wake = self
                .next_deadline()
                .unwrap_or(now + SEGMENTATION_POLL)
                .max(now + Duration::from_millis(1))
                .min(deadline);
            std::thread::sleep(wake - now);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/session.rs"]
mod tests;
