//! Replays still images from a directory as if they came from a camera.
//!
//! Stands in for device capture: images are decoded once, oriented, and then
//! pushed to a [`FrameSink`] at a fixed frame rate, looping until cancelled.

use crate::common::Frame;
use crate::config::{CaptureSettings, Orientation};
use crate::error::AppError;
use crate::intake::FrameSink;
use futures::StreamExt;
use image::DynamicImage;
use image::metadata::Orientation as ImageOrientation;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct DirectoryFrameSource {
    images: Vec<DynamicImage>,
    fps: u32,
}

impl DirectoryFrameSource {
    pub fn new(images: Vec<DynamicImage>, fps: u32) -> Self {
        Self {
            images,
            fps: fps.max(1),
        }
    }

    pub fn from_settings(settings: &CaptureSettings) -> Result<Option<Self>, AppError> {
        let Some(directory) = &settings.directory else {
            return Ok(None);
        };
        let images = load_images(directory, settings.orientation)?;
        Ok(Some(Self::new(images, settings.fps)))
    }

    /// Pushes frames until `cancel_token` fires. Returns the number of frames
    /// pushed. Ticks missed because the sink was slow are skipped.
    pub async fn run<S: FrameSink>(self, mut sink: S, cancel_token: CancellationToken) -> u64 {
        if self.images.is_empty() {
            warn!("Frame source has no images, nothing to capture");
            return 0;
        }

        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / self.fps as f64));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut frames =
            IntervalStream::new(interval).zip(futures::stream::iter(self.images.iter().cycle()));

        info!(images = self.images.len(), fps = self.fps, "Starting frame source");
        let mut pushed = 0u64;
        loop {
            tokio::select! {
                _ = cancel_token.cancelled() => break,
                next = frames.next() => match next {
                    Some((_, image)) => {
                        sink.push(Frame::capture(image.clone()));
                        pushed += 1;
                    }
                    None => break,
                },
            }
        }
        debug!(pushed, "Frame source stopped");
        pushed
    }
}

/// Decodes every readable image in `directory`, sorted by file name.
/// Files that fail to decode are skipped.
pub fn load_images(
    directory: &Path,
    orientation: Orientation,
) -> Result<Vec<DynamicImage>, AppError> {
    let entries = std::fs::read_dir(directory)
        .map_err(|e| AppError::Capture(directory.to_path_buf(), e))?;

    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect();
    paths.sort();

    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        match image::open(&path) {
            Ok(mut image) => {
                image.apply_orientation(image_orientation(orientation));
                images.push(image);
            }
            Err(e) => warn!("Skipping {}: {}", path.display(), e),
        }
    }

    if images.is_empty() {
        return Err(AppError::Pipeline(format!(
            "No readable images in {}",
            directory.display()
        )));
    }
    Ok(images)
}

fn image_orientation(orientation: Orientation) -> ImageOrientation {
    match orientation {
        Orientation::Up => ImageOrientation::NoTransforms,
        Orientation::Down => ImageOrientation::Rotate180,
        Orientation::Left => ImageOrientation::Rotate270,
        Orientation::Right => ImageOrientation::Rotate90,
        Orientation::UpMirrored => ImageOrientation::FlipHorizontal,
        Orientation::LeftMirrored => ImageOrientation::Rotate90FlipH,
    }
}
