use vello_cpu::kurbo::{self as vk, Shape};

use crate::assets::decode::LoadedImage;
use crate::foundation::color::Rgba8;
use crate::foundation::core::{Affine, Bounds};
use crate::foundation::error::{CardError, CardResult};
use crate::render::text::TextEngine;

/// How an image is scaled into its bounds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ImageFit {
    /// Scale to cover the bounds, cropping overflow.
    #[default]
    Cover,
    /// Scale to fit inside the bounds, letterboxing.
    Contain,
    /// Stretch to the bounds exactly.
    Fill,
}

impl ImageFit {
    pub fn parse(s: Option<&str>) -> Self {
        match s {
            Some("contain") => Self::Contain,
            Some("fill") => Self::Fill,
            _ => Self::Cover,
        }
    }
}

/// Clip shape applied while drawing an image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClipShape {
    Rect,
    Rounded(f64),
    Circle,
}

/// One drawing surface: a `vello_cpu` context, its target pixmap, a text engine and a DPI factor.
///
/// Drawing methods take canvas-pixel coordinates; the DPI scale is applied as the base transform.
/// Pixels become readable after [`Surface::flush`]; each flush composites over the previous ones.
pub struct Surface {
    ctx: vello_cpu::RenderContext,
    pixmap: vello_cpu::Pixmap,
    scratch: vello_cpu::Pixmap,
    text: TextEngine,
    width: u16,
    height: u16,
    dpi: f64,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("dpi", &self.dpi)
            .finish_non_exhaustive()
    }
}

impl Surface {
    /// Allocate a surface of `width x height` device pixels.
    pub fn new(width: u32, height: u32) -> CardResult<Self> {
        let (w, h) = device_dims(width, height)?;
        Ok(Self {
            ctx: vello_cpu::RenderContext::new(w, h),
            pixmap: vello_cpu::Pixmap::new(w, h),
            scratch: vello_cpu::Pixmap::new(w, h),
            text: TextEngine::new(),
            width: w,
            height: h,
            dpi: 1.0,
        })
    }

    /// Device size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (u32::from(self.width), u32::from(self.height))
    }

    pub fn dpi(&self) -> f64 {
        self.dpi
    }

    /// Reset drawing state and clear to transparent for a new render at `dpi`.
    pub(crate) fn begin(&mut self, dpi: f64) {
        self.ctx.reset();
        self.pixmap.data_as_u8_slice_mut().fill(0);
        self.dpi = dpi;
        self.ctx.set_transform(self.base_transform());
    }

    fn base_transform(&self) -> vk::Affine {
        affine_to_cpu(Affine::scale(self.dpi))
    }

    /// Raw context, with the base transform applied. Callers that change the transform must
    /// restore it.
    pub fn ctx(&mut self) -> &mut vello_cpu::RenderContext {
        &mut self.ctx
    }

    pub(crate) fn text_engine(&mut self) -> &mut TextEngine {
        &mut self.text
    }

    /// Transform mapping canvas pixels translated by `offset` to device pixels.
    pub fn transform_at(&self, x: f64, y: f64) -> vk::Affine {
        affine_to_cpu(Affine::scale(self.dpi) * Affine::translate((x, y)))
    }

    pub fn fill_rect(&mut self, b: Bounds, color: Rgba8) {
        if b.is_empty() || color.a == 0 {
            return;
        }
        self.ctx.set_transform(self.base_transform());
        self.ctx.set_paint(color.to_paint());
        self.ctx.fill_rect(&to_cpu_rect(b));
    }

    /// Fill `b` with rounded corners. `radius` is clamped to half the shorter side.
    pub fn fill_rounded(&mut self, b: Bounds, radius: f64, color: Rgba8) {
        if b.is_empty() || color.a == 0 {
            return;
        }
        if radius <= 0.0 {
            self.fill_rect(b, color);
            return;
        }
        self.ctx.set_transform(self.base_transform());
        self.ctx.set_paint(color.to_paint());
        self.ctx.fill_path(&rounded_path(b, radius));
    }

    /// Fill `b` with a left-to-right linear gradient.
    pub fn fill_gradient(&mut self, b: Bounds, radius: f64, from: Rgba8, to: Rgba8) {
        if b.is_empty() {
            return;
        }
        let gradient = vello_cpu::peniko::Gradient::new_linear(
            vk::Point::new(b.x, b.y),
            vk::Point::new(b.right(), b.y),
        )
        .with_stops([from.to_paint(), to.to_paint()]);
        self.ctx.set_transform(self.base_transform());
        self.ctx.set_paint(gradient);
        self.ctx.fill_path(&rounded_path(b, radius.max(0.0)));
    }

    /// Stroke the outline of `b` inside its edges.
    pub fn stroke_rounded(&mut self, b: Bounds, radius: f64, width: f64, color: Rgba8) {
        if b.is_empty() || width <= 0.0 || color.a == 0 {
            return;
        }
        let half = width * 0.5;
        let inner = Bounds::new(b.x + half, b.y + half, b.width - width, b.height - width);
        self.ctx.set_transform(self.base_transform());
        self.ctx.set_paint(color.to_paint());
        self.ctx.set_stroke(vk::Stroke::new(width));
        self.ctx
            .stroke_path(&rounded_path(inner, (radius - half).max(0.0)));
    }

    /// Draw `image` into `b`, clipped to `clip`, at `opacity`.
    pub fn draw_image(
        &mut self,
        image: &LoadedImage,
        b: Bounds,
        fit: ImageFit,
        clip: ClipShape,
        opacity: f32,
    ) {
        if b.is_empty() || image.width == 0 || image.height == 0 {
            return;
        }
        let (iw, ih) = (f64::from(image.width), f64::from(image.height));
        let (sx, sy) = match fit {
            ImageFit::Fill => (b.width / iw, b.height / ih),
            ImageFit::Cover => {
                let s = (b.width / iw).max(b.height / ih);
                (s, s)
            }
            ImageFit::Contain => {
                let s = (b.width / iw).min(b.height / ih);
                (s, s)
            }
        };
        let ox = b.x + (b.width - iw * sx) * 0.5;
        let oy = b.y + (b.height - ih * sy) * 0.5;

        self.ctx.set_transform(self.base_transform());
        self.ctx.push_clip_layer(&clip_path(b, clip));
        let opaque = opacity >= 1.0;
        if !opaque {
            self.ctx.push_opacity_layer(opacity.clamp(0.0, 1.0));
        }
        self.ctx.set_transform(affine_to_cpu(
            Affine::scale(self.dpi) * Affine::translate((ox, oy)) * Affine::scale_non_uniform(sx, sy),
        ));
        self.ctx.set_paint(image.paint());
        self.ctx.fill_rect(&vk::Rect::new(0.0, 0.0, iw, ih));
        if !opaque {
            self.ctx.pop_layer();
        }
        self.ctx.pop_layer();
        self.ctx.set_transform(self.base_transform());
    }

    /// Rasterize everything drawn since the last flush and composite it source-over onto the
    /// pixels.
    pub fn flush(&mut self) {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut self.scratch);
        over_in_place(
            self.pixmap.data_as_u8_slice_mut(),
            self.scratch.data_as_u8_slice(),
        );
        self.ctx.reset();
        self.ctx.set_transform(self.base_transform());
    }

    /// Premultiplied RGBA8 device pixels.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Straight-alpha copy of the pixels, as encoders expect.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = self.pixels().to_vec();
        unpremultiply_rgba8_in_place(&mut out);
        out
    }
}

fn device_dims(width: u32, height: u32) -> CardResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CardError::validation(format!("surface width {width} exceeds u16")))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CardError::validation(format!("surface height {height} exceeds u16")))?;
    if w == 0 || h == 0 {
        return Err(CardError::validation("surface size must be non-zero"));
    }
    Ok((w, h))
}

pub(crate) fn affine_to_cpu(a: Affine) -> vk::Affine {
    vk::Affine::new(a.as_coeffs())
}

fn to_cpu_rect(b: Bounds) -> vk::Rect {
    vk::Rect::new(b.x, b.y, b.right(), b.bottom())
}

fn rounded_path(b: Bounds, radius: f64) -> vk::BezPath {
    let r = radius.min(b.width.min(b.height) * 0.5).max(0.0);
    vk::RoundedRect::new(b.x, b.y, b.right(), b.bottom(), r).to_path(0.1)
}

fn clip_path(b: Bounds, clip: ClipShape) -> vk::BezPath {
    match clip {
        ClipShape::Rect => to_cpu_rect(b).to_path(0.1),
        ClipShape::Rounded(r) => rounded_path(b, r),
        ClipShape::Circle => {
            let c = b.center();
            vk::Circle::new(vk::Point::new(c.x, c.y), b.width.min(b.height) * 0.5).to_path(0.1)
        }
    }
}

/// Premultiplied source-over of equal-length RGBA8 buffers.
fn over_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let sa = s[3];
        if sa == 0 {
            continue;
        }
        if sa == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - u16::from(sa);
        for i in 0..4 {
            let dc = (u16::from(d[i]) * inv + 127) / 255;
            d[i] = (u16::from(s[i]) + dc).min(255) as u8;
        }
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
