use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::sync::Arc;
use tokio::time::Instant;
use uuid::Uuid;

/// A captured camera frame. Immutable once built; cloning shares the image buffer.
#[derive(Clone, Debug)]
pub struct Frame {
    frame_id: Uuid,
    image: Arc<DynamicImage>,
    captured_at: Instant,
    captured_wall: DateTime<Utc>,
}

impl Frame {
    /// Stamps the frame with the current monotonic and wall-clock time.
    pub fn capture(image: DynamicImage) -> Self {
        Self::new(image, Instant::now())
    }

    pub fn new(image: DynamicImage, captured_at: Instant) -> Self {
        Self {
            frame_id: Uuid::new_v4(),
            image: Arc::new(image),
            captured_at,
            captured_wall: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.frame_id
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn captured_at(&self) -> Instant {
        self.captured_at
    }

    pub fn captured_wall(&self) -> DateTime<Utc> {
        self.captured_wall
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    #[test]
    fn cloning_frame_shares_image_buffer() {
        let img: DynamicImage = DynamicImage::ImageRgb8(
            ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(16, 16, Rgb([1, 2, 3])),
        );
        let f1 = Frame::new(img, Instant::now());
        let f2 = f1.clone();
        assert!(Arc::ptr_eq(&f1.image, &f2.image));
        assert_eq!(f1.id(), f2.id());
    }

    #[test]
    fn frames_get_distinct_ids() {
        let img = DynamicImage::new_rgb8(2, 2);
        let f1 = Frame::new(img.clone(), Instant::now());
        let f2 = Frame::new(img, Instant::now());
        assert_ne!(f1.id(), f2.id());
    }
}
