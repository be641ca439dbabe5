//! Test-only adapter between `rastermark::Image` and the `image` crate
//! (dev-dependency only, §6, §10). Exists so scenarios 2 and 3 of the
//! end-to-end test suite can exercise real PNG/JPEG encode/decode and
//! real bilinear resizing instead of a synthetic stand-in.

use image::{DynamicImage, ImageEncoder, ImageFormat, RgbImage};
use rastermark::Image;

pub fn to_dynamic(image: &Image) -> DynamicImage {
    let buf = RgbImage::from_raw(image.width() as u32, image.height() as u32, image.as_rgb_bytes().to_vec())
        .expect("Image invariants guarantee width*height*3 == data.len()");
    DynamicImage::ImageRgb8(buf)
}

pub fn from_dynamic(dynamic: &DynamicImage) -> Image {
    let rgb = dynamic.to_rgb8();
    let (width, height) = rgb.dimensions();
    Image::new(height as usize, width as usize, rgb.into_raw()).expect("decoded image has valid dimensions")
}

pub fn encode_png(image: &Image) -> Vec<u8> {
    let mut bytes = Vec::new();
    to_dynamic(image)
        .write_to(&mut std::io::Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("png encode");
    bytes
}

pub fn decode_png(bytes: &[u8]) -> Image {
    let dynamic = image::load_from_memory_with_format(bytes, ImageFormat::Png).expect("png decode");
    from_dynamic(&dynamic)
}

pub fn encode_jpeg(image: &Image, quality: u8) -> Vec<u8> {
    let mut bytes = Vec::new();
    let rgb = to_dynamic(image).to_rgb8();
    let encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, quality);
    encoder
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), image::ExtendedColorType::Rgb8)
        .expect("jpeg encode");
    bytes
}

pub fn decode_jpeg(bytes: &[u8]) -> Image {
    let dynamic = image::load_from_memory_with_format(bytes, ImageFormat::Jpeg).expect("jpeg decode");
    from_dynamic(&dynamic)
}

pub fn resize_bilinear(image: &Image, new_height: usize, new_width: usize) -> Image {
    let resized = image::imageops::resize(
        &to_dynamic(image).to_rgb8(),
        new_width as u32,
        new_height as u32,
        image::imageops::FilterType::Triangle,
    );
    from_dynamic(&DynamicImage::ImageRgb8(resized))
}

/// A deterministic, non-uniform "photograph" stand-in: a smooth gradient
/// plus a few sine-wave bands, so JPEG recompression actually has texture
/// to quantize away rather than re-encoding a flat field losslessly.
pub fn synthetic_photograph(height: usize, width: usize) -> Image {
    let mut data = vec![0u8; height * width * 3];
    for row in 0..height {
        for col in 0..width {
            let fx = col as f32 / width as f32;
            let fy = row as f32 / height as f32;
            let r = (128.0 + 100.0 * (fx * std::f32::consts::PI * 3.0).sin()) as u8;
            let g = (128.0 + 100.0 * (fy * std::f32::consts::PI * 4.0).cos()) as u8;
            let b = (96.0 + 80.0 * ((fx + fy) * std::f32::consts::PI * 2.0).sin()) as u8;
            let idx = (row * width + col) * 3;
            data[idx] = r;
            data[idx + 1] = g;
            data[idx + 2] = b;
        }
    }
    Image::new(height, width, data).expect("synthetic photograph has valid dimensions")
}

pub fn solid_gray(height: usize, width: usize, value: u8) -> Image {
    Image::new(height, width, vec![value; height * width * 3]).expect("solid image has valid dimensions")
}
