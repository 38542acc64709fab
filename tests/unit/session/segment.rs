use std::time::{Duration, Instant};

use super::*;
use crate::assets::decode::save_png;

struct Fixed(ImageBuffer);

impl Segmenter for Fixed {
    fn segment(
        &self,
        _image: &ImageBuffer,
        progress: &mut dyn FnMut(f32),
        _cancel: &CancelToken,
    ) -> OccludeResult<ImageBuffer> {
        progress(0.25);
        progress(7.0);
        Ok(self.0.clone())
    }
}

struct Failing;

impl Segmenter for Failing {
    fn segment(
        &self,
        _image: &ImageBuffer,
        _progress: &mut dyn FnMut(f32),
        _cancel: &CancelToken,
    ) -> OccludeResult<ImageBuffer> {
        Err(OccludeError::segmentation("model produced no cutout"))
    }
}

/// Spins until cancelled, giving up after a few seconds so a broken test cannot hang.
struct UntilCancelled;

impl Segmenter for UntilCancelled {
    fn segment(
        &self,
        image: &ImageBuffer,
        progress: &mut dyn FnMut(f32),
        cancel: &CancelToken,
    ) -> OccludeResult<ImageBuffer> {
        let start = Instant::now();
        while !cancel.is_cancelled() && start.elapsed() < Duration::from_secs(5) {
            progress(0.1);
            std::thread::sleep(Duration::from_millis(1));
        }
        Ok(image.clone())
    }
}

fn canvas() -> Arc<ImageBuffer> {
    Arc::new(ImageBuffer::filled(4, 3, [9, 9, 9, 255]).unwrap())
}

fn poll_until_done(task: &mut SegmentationTask) -> OccludeResult<ImageBuffer> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(out) = task.poll() {
            return out;
        }
        assert!(Instant::now() < deadline, "segmentation never finished");
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn finished_cutout_is_delivered() {
    let cutout = ImageBuffer::filled(4, 3, [1, 2, 3, 200]).unwrap();
    let mut task = SegmentationTask::spawn(Arc::new(Fixed(cutout.clone())), canvas(), 3).unwrap();
    assert_eq!(task.generation(), 3);
    assert_eq!(poll_until_done(&mut task).unwrap(), cutout);
    assert!(task.is_finished());
    assert_eq!(task.progress(), 1.0);
    assert!(task.poll().is_none());
}

#[test]
fn failure_is_segmentation_failed() {
    let mut task = SegmentationTask::spawn(Arc::new(Failing), canvas(), 1).unwrap();
    assert!(matches!(
        task.wait(),
        Err(OccludeError::SegmentationFailed(_))
    ));
}

#[test]
fn cancelled_run_reports_cancelled() {
    let mut task = SegmentationTask::spawn(Arc::new(UntilCancelled), canvas(), 1).unwrap();
    task.cancel();
    assert!(matches!(task.wait(), Err(OccludeError::Cancelled(_))));
}

#[test]
fn wait_after_completion_is_an_error() {
    let cutout = ImageBuffer::filled(1, 1, [0, 0, 0, 0]).unwrap();
    let mut task = SegmentationTask::spawn(Arc::new(Fixed(cutout)), canvas(), 1).unwrap();
    task.wait().unwrap();
    assert!(task.wait().is_err());
}

#[test]
fn cancel_token_is_shared() {
    let a = CancelToken::new();
    let b = a.clone();
    assert!(!b.is_cancelled());
    a.cancel();
    assert!(b.is_cancelled());
}

#[test]
fn cutout_file_segmenter_reads_png() {
    let path = std::env::temp_dir().join(format!("occlude_cutout_{}.png", std::process::id()));
    let cutout = ImageBuffer::filled(2, 2, [10, 20, 30, 200]).unwrap();
    save_png(&cutout, &path).unwrap();

    let seg = CutoutFileSegmenter::new(&path);
    let mut seen = Vec::new();
    let out = seg
        .segment(&canvas(), &mut |p| seen.push(p), &CancelToken::new())
        .unwrap();
    assert_eq!(out, cutout);
    assert_eq!(seen, vec![0.0, 1.0]);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn missing_cutout_file_is_segmentation_failed() {
    let seg = CutoutFileSegmenter::new("/nonexistent/occlude/cutout.png");
    assert!(matches!(
        seg.segment(&canvas(), &mut |_| {}, &CancelToken::new()),
        Err(OccludeError::SegmentationFailed(_))
    ));
}
