//! Page-image encoding for the vision recogniser.
//!
//! Pages are reduced to 8-bit greyscale and PNG-encoded. Lossy formats are
//! not used: thin fraction slashes do not survive JPEG artefacts.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use tracing::debug;

/// Greyscale PNG, base64-wrapped, requested at high detail so small print
/// (fractions, inch marks) survives the provider's tiling.
pub fn encode_page(img: &DynamicImage) -> Result<ImageData, image::ImageError> {
    let grey = DynamicImage::ImageLuma8(img.to_luma8());
    let mut buf = Vec::new();
    grey.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;

    let b64 = STANDARD.encode(&buf);
    debug!(
        "Encoded {}x{} page → {} bytes base64",
        img.width(),
        img.height(),
        b64.len()
    );
    Ok(ImageData::new(b64, "image/png").with_detail("high"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn encodes_greyscale_png() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(12, 8, Rgba([200, 10, 10, 255])));
        let data = encode_page(&img).unwrap();
        assert_eq!(data.mime_type, "image/png");

        let bytes = STANDARD.decode(&data.data).unwrap();
        let decoded = image::load_from_memory_with_format(&bytes, ImageFormat::Png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (12, 8));
        assert!(matches!(decoded, DynamicImage::ImageLuma8(_)));
    }
}
