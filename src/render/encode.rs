use std::io::Cursor;

use image::ImageEncoder;

use crate::foundation::error::{CardError, CardResult};

/// Encoded output format.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Png,
    Jpeg,
    /// Lossless WebP; `quality` is ignored.
    Webp,
}

impl OutputFormat {
    /// Parse a case-insensitive format name. `jpg` is accepted as `jpeg`.
    pub fn parse(s: &str) -> CardResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "png" => Ok(Self::Png),
            "jpeg" | "jpg" => Ok(Self::Jpeg),
            "webp" => Ok(Self::Webp),
            other => Err(CardError::validation(format!(
                "unsupported format '{other}' (expected png, jpeg or webp)"
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
        }
    }

    /// MIME type of the encoded bytes.
    pub fn mime(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = CardError;

    fn from_str(s: &str) -> CardResult<Self> {
        Self::parse(s)
    }
}

/// Encode straight-alpha RGBA8 pixels.
///
/// JPEG has no alpha channel: pixels are composited over black first. `quality` is `1..=100` and
/// only affects JPEG.
pub fn encode_rgba8(
    rgba: &[u8],
    width: u32,
    height: u32,
    format: OutputFormat,
    quality: u8,
) -> CardResult<Vec<u8>> {
    let expected = (width as usize)
        .saturating_mul(height as usize)
        .saturating_mul(4);
    if rgba.len() != expected {
        return Err(CardError::render(
            "ENCODE_FAILED",
            format!("pixel buffer is {} bytes, expected {expected}", rgba.len()),
        ));
    }

    let mut out = Cursor::new(Vec::new());
    let res = match format {
        OutputFormat::Png => image::codecs::png::PngEncoder::new(&mut out).write_image(
            rgba,
            width,
            height,
            image::ExtendedColorType::Rgba8,
        ),
        OutputFormat::Jpeg => {
            let rgb = flatten_to_rgb(rgba);
            image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100))
                .write_image(&rgb, width, height, image::ExtendedColorType::Rgb8)
        }
        OutputFormat::Webp => image::codecs::webp::WebPEncoder::new_lossless(&mut out)
            .write_image(rgba, width, height, image::ExtendedColorType::Rgba8),
    };
    res.map_err(|e| {
        CardError::render("ENCODE_FAILED", format!("{} encode failed: {e}", format.as_str()))
            .with_context(serde_json::json!({ "format": format.as_str() }))
    })?;
    Ok(out.into_inner())
}

fn flatten_to_rgb(rgba: &[u8]) -> Vec<u8> {
    let mut rgb = Vec::with_capacity(rgba.len() / 4 * 3);
    for px in rgba.chunks_exact(4) {
        let a = u16::from(px[3]);
        for &c in &px[..3] {
            rgb.push(((u16::from(c) * a + 127) / 255) as u8);
        }
    }
    rgb
}

#[cfg(test)]
#[path = "../../tests/unit/render/encode.rs"]
mod tests;
