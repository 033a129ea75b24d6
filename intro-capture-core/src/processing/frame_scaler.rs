use image::imageops::{self, FilterType};
use image::RgbImage;

/// Largest even-sized dimensions that fit `max_width × max_height` while
/// keeping the source aspect ratio. Never upscales.
pub fn fit_within(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (0, 0);
    }
    let scale = (max_width as f64 / width as f64)
        .min(max_height as f64 / height as f64)
        .min(1.0);
    let w = ((width as f64 * scale).floor() as u32).max(2);
    let h = ((height as f64 * scale).floor() as u32).max(2);
    // Most video encoders require even dimensions.
    (w - w % 2, h - h % 2)
}

/// Resample `image` to exactly `width × height`, borrowing when no work is needed.
pub fn scale_frame(image: &RgbImage, width: u32, height: u32) -> std::borrow::Cow<'_, RgbImage> {
    if image.width() == width && image.height() == height {
        std::borrow::Cow::Borrowed(image)
    } else {
        std::borrow::Cow::Owned(imageops::resize(image, width, height, FilterType::Triangle))
    }
}
