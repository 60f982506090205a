use crate::common::Frame;
use crate::config::{ClassifierKind, ClassifierSettings};
use crate::error::ClassifierError;
use image::imageops::FilterType;
use imghash::perceptual::PerceptualHasher;
use imghash::{ImageHash, ImageHasher};
use std::collections::VecDeque;

/// Decides whether a frame is worth uploading. Runs on the frame delivery
/// path, so implementations must be cheap.
pub trait FrameClassifier: Send {
    fn has_subject(&mut self, frame: &Frame) -> Result<bool, ClassifierError>;

    fn name(&self) -> &'static str;
}

pub fn from_settings(settings: &ClassifierSettings) -> Box<dyn FrameClassifier> {
    match settings.kind {
        ClassifierKind::Motion => Box::new(
            MotionClassifier::new()
                .with_threshold(settings.change_threshold)
                .with_history_window(settings.history_window),
        ),
        ClassifierKind::AcceptAll => Box::new(AcceptAllClassifier),
    }
}

/// Treats every frame as interesting; the endpoint does all the work.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAllClassifier;

impl FrameClassifier for AcceptAllClassifier {
    fn has_subject(&mut self, _frame: &Frame) -> Result<bool, ClassifierError> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "AcceptAllClassifier"
    }
}

const HASH_INPUT_SIDE: u32 = 64;

/// Flags frames whose content changed noticeably from the previous frame,
/// i.e. someone walked into view.
///
/// Each frame is reduced to a perceptual hash; the median hash distance over
/// a short rolling window is compared against the threshold so that
/// single-frame sensor noise does not trigger an upload. A subject standing
/// still does not change the hash, so this classifier is opt-in.
pub struct MotionClassifier {
    hasher: PerceptualHasher,
    last_hash: Option<ImageHash>,
    distance_history: VecDeque<usize>,
    change_threshold: usize,
    history_window_size: usize,
}

impl MotionClassifier {
    pub fn new() -> Self {
        Self {
            hasher: PerceptualHasher::default(),
            last_hash: None,
            distance_history: VecDeque::with_capacity(1),
            change_threshold: 5,
            history_window_size: 1,
        }
    }

    pub fn with_threshold(mut self, threshold: usize) -> Self {
        self.change_threshold = threshold;
        self
    }

    pub fn with_history_window(mut self, window_size: usize) -> Self {
        self.history_window_size = window_size.max(1);
        self
    }

    /// Current median distance, if any frame pair has been compared yet.
    pub fn median_distance(&self) -> Option<usize> {
        if self.distance_history.is_empty() {
            return None;
        }
        let mut sorted: Vec<usize> = self.distance_history.iter().copied().collect();
        sorted.sort_unstable();
        Some(sorted[sorted.len() / 2])
    }

    fn hash(&self, frame: &Frame) -> Result<ImageHash, ClassifierError> {
        let image = frame.image();
        if image.width() == 0 || image.height() == 0 {
            return Err(ClassifierError::Unprocessable("empty image".to_string()));
        }
        // Downscale first; hashing the full frame is needlessly slow.
        let small = image.resize(HASH_INPUT_SIDE, HASH_INPUT_SIDE, FilterType::Nearest);
        Ok(self.hasher.hash_from_img(&small))
    }
}

impl Default for MotionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameClassifier for MotionClassifier {
    fn has_subject(&mut self, frame: &Frame) -> Result<bool, ClassifierError> {
        let current = self.hash(frame)?;

        let distance = match &self.last_hash {
            Some(last) => Some(last.distance(&current).map_err(|e| {
                ClassifierError::Unprocessable(format!("hash mismatch: {e:?}"))
            })?),
            None => None,
        };
        self.last_hash = Some(current);

        let Some(distance) = distance else {
            // First frame only seeds the comparison.
            return Ok(false);
        };

        if self.distance_history.len() >= self.history_window_size {
            self.distance_history.pop_front();
        }
        self.distance_history.push_back(distance);

        Ok(self
            .median_distance()
            .is_some_and(|median| median > self.change_threshold))
    }

    fn name(&self) -> &'static str {
        "MotionClassifier"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GrayImage, Luma};
    use tokio::time::Instant;

    fn solid(value: u8) -> Frame {
        Frame::new(
            DynamicImage::ImageLuma8(GrayImage::from_pixel(32, 32, Luma([value]))),
            Instant::now(),
        )
    }

    /// Deterministic noise; different seeds give unrelated scenes.
    fn scene(seed: u32) -> Frame {
        let image = GrayImage::from_fn(32, 32, |x, y| {
            let mut v = x
                .wrapping_mul(374_761_393)
                .wrapping_add(y.wrapping_mul(668_265_263))
                .wrapping_add(seed.wrapping_mul(2_246_822_519));
            v = (v ^ (v >> 13)).wrapping_mul(1_274_126_177);
            Luma([(v >> 24) as u8])
        });
        Frame::new(DynamicImage::ImageLuma8(image), Instant::now())
    }

    #[test]
    fn first_frame_has_no_subject() {
        let mut classifier = MotionClassifier::new();
        assert!(!classifier.has_subject(&scene(1)).unwrap());
        assert_eq!(classifier.median_distance(), None);
    }

    #[test]
    fn static_scene_has_no_subject() {
        let mut classifier = MotionClassifier::new();
        for _ in 0..10 {
            assert!(!classifier.has_subject(&scene(1)).unwrap());
        }
        assert_eq!(classifier.median_distance(), Some(0));
    }

    #[test]
    fn sustained_change_is_a_subject() {
        let mut classifier = MotionClassifier::new().with_history_window(1);
        classifier.has_subject(&scene(1)).unwrap();
        assert!(classifier.has_subject(&scene(2)).unwrap());
    }

    #[test]
    fn single_noisy_frame_is_smoothed_by_median() {
        let mut classifier = MotionClassifier::new().with_history_window(5);
        for _ in 0..5 {
            classifier.has_subject(&scene(1)).unwrap();
        }
        // One changed frame produces two large distances (out and back) at most,
        // which stay below the median of five.
        assert!(!classifier.has_subject(&scene(2)).unwrap());
        assert!(!classifier.has_subject(&scene(1)).unwrap());
    }

    #[test]
    fn empty_image_is_unprocessable() {
        let mut classifier = MotionClassifier::new();
        let frame = Frame::new(DynamicImage::new_luma8(0, 0), Instant::now());
        assert!(classifier.has_subject(&frame).is_err());
    }

    #[test]
    fn accept_all_accepts_everything() {
        let mut classifier = AcceptAllClassifier;
        assert!(classifier.has_subject(&solid(0)).unwrap());
    }

    #[test]
    fn default_classifier_accepts_a_still_subject() {
        let mut classifier = from_settings(&ClassifierSettings::default());
        assert_eq!(classifier.name(), "AcceptAllClassifier");
        for _ in 0..5 {
            assert!(classifier.has_subject(&scene(3)).unwrap());
        }
    }

    #[test]
    fn builds_from_settings() {
        let settings = ClassifierSettings {
            kind: ClassifierKind::Motion,
            ..ClassifierSettings::default()
        };
        assert_eq!(from_settings(&settings).name(), "MotionClassifier");
        assert_eq!(
            from_settings(&ClassifierSettings::default()).name(),
            "AcceptAllClassifier"
        );
    }
}
