use std::time::{Duration, Instant};

use crate::session::segment::CancelToken;

/// Steps between an upload and its first frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum LoadPhase {
    /// Resample the upload to the processing size.
    Resize,
    /// Build the mask (gradient passes, or wait for the segmentation cutout).
    DetectMask,
    /// Rasterize the current text and composite the first frame.
    FirstRender,
    /// Nothing left to do.
    Done,
}

impl LoadPhase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Resize => "resize",
            Self::DetectMask => "detect_mask",
            Self::FirstRender => "first_render",
            Self::Done => "done",
        }
    }

    fn next(self) -> Self {
        match self {
            Self::Resize => Self::DetectMask,
            Self::DetectMask => Self::FirstRender,
            Self::FirstRender | Self::Done => Self::Done,
        }
    }

    /// Fraction of the load completed when this phase starts.
    fn start_fraction(self) -> f32 {
        match self {
            Self::Resize => 0.0,
            Self::DetectMask => 1.0 / 3.0,
            Self::FirstRender => 2.0 / 3.0,
            Self::Done => 1.0,
        }
    }
}

/// Cooperative schedule for one image's load phases.
///
/// Each phase becomes due `delay` after the previous one finished so the host can repaint its
/// progress indicator in between. The job can be cancelled at any phase boundary; once
/// cancelled, no phase is ever due again.
#[derive(Debug)]
pub struct LoadJob {
    phase: LoadPhase,
    due: Instant,
    delay: Duration,
    cancel: CancelToken,
}

impl LoadJob {
    /// Job whose first phase is due at `now`.
    pub fn new(delay: Duration, now: Instant) -> Self {
        Self {
            phase: LoadPhase::Resize,
            due: now,
            delay,
            cancel: CancelToken::new(),
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    pub fn is_done(&self) -> bool {
        self.phase == LoadPhase::Done
    }

    /// Phase to run at `now`, if any.
    pub fn due(&self, now: Instant) -> Option<LoadPhase> {
        if self.cancel.is_cancelled() || self.is_done() || now < self.due {
            return None;
        }
        Some(self.phase)
    }

    /// When the next phase becomes due.
    pub fn next_due(&self) -> Option<Instant> {
        if self.cancel.is_cancelled() || self.is_done() {
            return None;
        }
        Some(self.due)
    }

    /// Mark the current phase finished at `now`.
    pub fn advance(&mut self, now: Instant) {
        self.phase = self.phase.next();
        self.due = now + self.delay;
        tracing::trace!(phase = self.phase.name(), "load phase advanced");
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Progress in [0, 1]; `within` is how far the current phase has got.
    pub fn progress(&self, within: f32) -> f32 {
        let start = self.phase.start_fraction();
        let end = self.phase.next().start_fraction();
        start + (end - start) * within.clamp(0.0, 1.0)
    }
}
