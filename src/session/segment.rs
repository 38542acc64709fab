use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use crate::assets::decode::load_image;
use crate::foundation::core::ImageBuffer;
use crate::foundation::error::{OccludeError, OccludeResult};

/// Shared cooperative cancellation flag.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// External subject-segmentation collaborator.
///
/// Implementations return an RGBA cutout whose alpha isolates the subject. They may report
/// fractional progress and should poll `cancel` between expensive steps. Failures are
/// terminal for the image being segmented.
pub trait Segmenter: Send + Sync {
    fn segment(
        &self,
        image: &ImageBuffer,
        progress: &mut dyn FnMut(f32),
        cancel: &CancelToken,
    ) -> OccludeResult<ImageBuffer>;
}

/// Segmenter that ignores its input and reads a precomputed cutout from disk.
#[derive(Clone, Debug)]
pub struct CutoutFileSegmenter {
    path: PathBuf,
}

impl CutoutFileSegmenter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Segmenter for CutoutFileSegmenter {
    fn segment(
        &self,
        _image: &ImageBuffer,
        progress: &mut dyn FnMut(f32),
        cancel: &CancelToken,
    ) -> OccludeResult<ImageBuffer> {
        progress(0.0);
        if cancel.is_cancelled() {
            return Err(OccludeError::cancelled("segmentation cancelled"));
        }
        let cutout = load_image(&self.path).map_err(|e| {
            OccludeError::segmentation(format!("cutout '{}': {e}", self.path.display()))
        })?;
        progress(1.0);
        Ok(cutout)
    }
}

/// Messages from a segmentation worker.
#[derive(Debug)]
pub enum SegmentationEvent {
    /// Fraction complete in [0, 1].
    Progress(f32),
    /// Terminal outcome; no events follow.
    Finished(OccludeResult<ImageBuffer>),
}

/// A segmentation run on a worker thread.
///
/// The owner polls for progress without blocking. Dropping the task cancels it; a worker that
/// finishes afterwards has nobody left to deliver to.
#[derive(Debug)]
pub struct SegmentationTask {
    generation: u64,
    rx: mpsc::Receiver<SegmentationEvent>,
    cancel: CancelToken,
    progress: f32,
    finished: bool,
}

impl SegmentationTask {
    /// Start segmenting `image` for the image session identified by `generation`.
    #[tracing::instrument(skip(segmenter, image), fields(w = image.width(), h = image.height()))]
    pub fn spawn(
        segmenter: Arc<dyn Segmenter>,
        image: Arc<ImageBuffer>,
        generation: u64,
    ) -> OccludeResult<Self> {
        let (tx, rx) = mpsc::channel::<SegmentationEvent>();
        let cancel = CancelToken::new();
        let token = cancel.clone();

        std::thread::Builder::new()
            .name(format!("occlude-segment-{generation}"))
            .spawn(move || {
                let progress_tx = tx.clone();
                let mut report = |p: f32| {
                    let p = if p.is_finite() { p.clamp(0.0, 1.0) } else { 0.0 };
                    let _ = progress_tx.send(SegmentationEvent::Progress(p));
                };
                let result = segmenter.segment(&image, &mut report, &token);
                let result = if token.is_cancelled() {
                    Err(OccludeError::cancelled("segmentation cancelled"))
                } else {
                    result
                };
                let _ = tx.send(SegmentationEvent::Finished(result));
            })
            .map_err(|e| OccludeError::segmentation(format!("spawn segmentation worker: {e}")))?;

        Ok(Self {
            generation,
            rx,
            cancel,
            progress: 0.0,
            finished: false,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Latest reported progress.
    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain pending events without blocking; returns the outcome once it arrives.
    pub fn poll(&mut self) -> Option<OccludeResult<ImageBuffer>> {
        if self.finished {
            return None;
        }
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    if let Some(out) = self.handle(event) {
                        return Some(out);
                    }
                }
                Err(mpsc::TryRecvError::Empty) => return None,
                Err(mpsc::TryRecvError::Disconnected) => return Some(self.lost()),
            }
        }
    }

    /// Block until the worker finishes.
    pub fn wait(&mut self) -> OccludeResult<ImageBuffer> {
        if self.finished {
            return Err(OccludeError::segmentation("segmentation result already taken"));
        }
        loop {
            match self.rx.recv() {
                Ok(event) => {
                    if let Some(out) = self.handle(event) {
                        return out;
                    }
                }
                Err(_) => return self.lost(),
            }
        }
    }

    fn handle(&mut self, event: SegmentationEvent) -> Option<OccludeResult<ImageBuffer>> {
        match event {
            SegmentationEvent::Progress(p) => {
                self.progress = p;
                None
            }
            SegmentationEvent::Finished(result) => {
                self.finished = true;
                if result.is_ok() {
                    self.progress = 1.0;
                }
                Some(result)
            }
        }
    }

    fn lost(&mut self) -> OccludeResult<ImageBuffer> {
        self.finished = true;
        Err(OccludeError::segmentation(
            "segmentation worker exited without a result",
        ))
    }
}

impl Drop for SegmentationTask {
    fn drop(&mut self) {
        if !self.finished {
            self.cancel.cancel();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/segment.rs"]
mod tests;
