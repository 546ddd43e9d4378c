use serde_json::Value;

use crate::foundation::color::{Rgba8, resolve_color};
use crate::foundation::core::TokenMap;
use crate::foundation::error::{CardError, CardResult};

/// Post effect applied to the finished surface.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Additive bloom: a blurred, tinted copy of the image's bright areas added on top.
    Glow {
        color: Option<Value>,
        radius: Option<f64>,
        intensity: Option<f64>,
    },
    /// Flat color laid over the whole card.
    Overlay {
        color: Option<Value>,
        opacity: f64,
    },
    /// Deterministic per-pixel luminance noise.
    Noise { amount: f64, seed: u64 },
    /// Radial darkening toward the corners.
    Vignette { strength: f64 },
}

impl Effect {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Glow { .. } => "glow",
            Self::Overlay { .. } => "overlay",
            Self::Noise { .. } => "noise",
            Self::Vignette { .. } => "vignette",
        }
    }

    /// Parse one declared effect: a bare name (`"glow"`) or an object with a `type` key.
    pub fn parse(v: &Value) -> CardResult<Self> {
        let (kind, params) = match v {
            Value::String(s) => (s.as_str(), None),
            Value::Object(m) => match m.get("type").and_then(Value::as_str) {
                Some(t) => (t, Some(m)),
                None => return Err(CardError::validation("effect object needs a string `type`")),
            },
            _ => return Err(CardError::validation("effect must be a string or object")),
        };
        let num = |k: &str| {
            params
                .and_then(|m| m.get(k))
                .and_then(Value::as_f64)
                .filter(|f| f.is_finite())
        };
        let raw = |k: &str| params.and_then(|m| m.get(k)).cloned();

        match kind.to_ascii_lowercase().as_str() {
            "glow" => Ok(Self::Glow {
                color: raw("color"),
                radius: num("radius"),
                intensity: num("intensity"),
            }),
            "overlay" => Ok(Self::Overlay {
                color: raw("color"),
                opacity: num("opacity").unwrap_or(1.0).clamp(0.0, 1.0),
            }),
            "noise" => Ok(Self::Noise {
                amount: num("amount").unwrap_or(0.04).clamp(0.0, 1.0),
                seed: num("seed").map(|s| s.max(0.0) as u64).unwrap_or(0),
            }),
            "vignette" => Ok(Self::Vignette {
                strength: num("strength").unwrap_or(0.4).clamp(0.0, 1.0),
            }),
            other => Err(CardError::render(
                "UNKNOWN_EFFECT",
                format!("unknown effect '{other}'"),
            )
            .with_context(serde_json::json!({ "effect": other }))),
        }
    }

    /// Apply to premultiplied RGBA8 `pixels` of `width x height`. `dpi` scales pixel radii.
    pub fn apply(
        &self,
        pixels: &mut [u8],
        width: u32,
        height: u32,
        dpi: f64,
        tokens: &TokenMap,
    ) -> CardResult<()> {
        match self {
            Self::Glow {
                color,
                radius,
                intensity,
            } => {
                let color = resolve_color(color.as_ref(), tokens)
                    .or_else(|| resolve_color(tokens.get("glow.color"), tokens))
                    .unwrap_or(Rgba8::WHITE);
                let radius = radius
                    .or_else(|| token_f64(tokens, "effects.glowRadius"))
                    .unwrap_or(12.0);
                let intensity = intensity
                    .or_else(|| token_f64(tokens, "effects.glowIntensity"))
                    .unwrap_or(0.6);
                glow(pixels, width, height, color, radius * dpi, intensity)
            }
            Self::Overlay { color, opacity } => {
                let color = resolve_color(color.as_ref(), tokens)
                    .or_else(|| resolve_color(tokens.get("overlay.color"), tokens))
                    .unwrap_or(Rgba8::TRANSPARENT);
                overlay(pixels, color.with_opacity(*opacity as f32));
                Ok(())
            }
            Self::Noise { amount, seed } => {
                noise(pixels, width, height, *amount, *seed);
                Ok(())
            }
            Self::Vignette { strength } => {
                vignette(pixels, width, height, *strength);
                Ok(())
            }
        }
    }
}

/// Parse a declared effect list, failing on the first invalid entry.
pub fn parse_effects(values: &[Value]) -> CardResult<Vec<Effect>> {
    values.iter().map(Effect::parse).collect()
}

fn token_f64(tokens: &TokenMap, key: &str) -> Option<f64> {
    tokens.get(key).and_then(Value::as_f64).filter(|f| f.is_finite())
}

fn glow(
    pixels: &mut [u8],
    width: u32,
    height: u32,
    color: Rgba8,
    radius: f64,
    intensity: f64,
) -> CardResult<()> {
    let intensity = intensity.clamp(0.0, 4.0);
    if intensity <= 0.0 || radius <= 0.0 {
        return Ok(());
    }
    let r = radius.round().clamp(1.0, 256.0) as u32;
    let kernel = gaussian_kernel_q16(r, (radius / 2.0) as f32)?;

    // Luminance mask tinted with the glow color, premultiplied.
    let mut src = vec![0u8; pixels.len()];
    for (d, s) in src.chunks_exact_mut(4).zip(pixels.chunks_exact(4)) {
        let lum = (u32::from(s[0]) * 54 + u32::from(s[1]) * 183 + u32::from(s[2]) * 19) >> 8;
        let a = mul_div255(lum as u16, u16::from(color.a));
        d[0] = mul_div255(u16::from(color.r), u16::from(a));
        d[1] = mul_div255(u16::from(color.g), u16::from(a));
        d[2] = mul_div255(u16::from(color.b), u16::from(a));
        d[3] = a;
    }
    let mut blurred = vec![0u8; pixels.len()];
    let mut tmp = vec![0u8; pixels.len()];
    blur_rgba8_premul_q16(&src, &mut blurred, &mut tmp, width, height, &kernel);

    let k = (intensity * 256.0).round() as u32;
    for (p, g) in pixels.chunks_exact_mut(4).zip(blurred.chunks_exact(4)) {
        for c in 0..3 {
            let add = ((u32::from(g[c]) * k) >> 8).min(255) as u8;
            p[c] = p[c].saturating_add(add).min(p[3].max(add));
        }
        let add_a = ((u32::from(g[3]) * k) >> 8).min(255) as u8;
        p[3] = p[3].saturating_add(add_a);
    }
    Ok(())
}

fn overlay(pixels: &mut [u8], color: Rgba8) {
    if color.a == 0 {
        return;
    }
    let src = color.to_premul();
    let inv = 255 - u16::from(color.a);
    for p in pixels.chunks_exact_mut(4) {
        for c in 0..4 {
            p[c] = src[c].saturating_add(mul_div255(u16::from(p[c]), inv));
        }
    }
}

fn noise(pixels: &mut [u8], width: u32, height: u32, amount: f64, seed: u64) {
    if amount <= 0.0 {
        return;
    }
    let span = (amount * 255.0).round() as i32;
    for y in 0..height {
        for x in 0..width {
            let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
            let Some(p) = pixels.get_mut(idx..idx + 4) else {
                return;
            };
            let a = i32::from(p[3]);
            if a == 0 {
                continue;
            }
            let h = hash_u32(seed, x, y);
            let delta = ((h % 511) as i32 - 255) * span / 255;
            for c in &mut p[..3] {
                *c = (i32::from(*c) + delta * a / 255).clamp(0, a) as u8;
            }
        }
    }
}

fn vignette(pixels: &mut [u8], width: u32, height: u32, strength: f64) {
    if strength <= 0.0 {
        return;
    }
    let (cx, cy) = (f64::from(width) * 0.5, f64::from(height) * 0.5);
    let max_d = (cx * cx + cy * cy).sqrt().max(1.0);
    for y in 0..height {
        for x in 0..width {
            let idx = ((y as usize) * (width as usize) + (x as usize)) * 4;
            let Some(p) = pixels.get_mut(idx..idx + 3) else {
                return;
            };
            let dx = f64::from(x) + 0.5 - cx;
            let dy = f64::from(y) + 0.5 - cy;
            let d = (dx * dx + dy * dy).sqrt() / max_d;
            let t = ((d - 0.5) / 0.5).clamp(0.0, 1.0);
            let falloff = t * t * (3.0 - 2.0 * t);
            let f = (1.0 - strength * falloff).clamp(0.0, 1.0);
            let k = (f * 255.0).round() as u16;
            for c in p.iter_mut() {
                *c = mul_div255(u16::from(*c), k);
            }
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    ((u32::from(x) * u32::from(y) + 127) / 255).min(255) as u8
}

fn hash_u32(seed: u64, x: u32, y: u32) -> u32 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut h = seed ^ OFFSET;
    for b in u64::from(x)
        .to_le_bytes()
        .into_iter()
        .chain(u64::from(y).to_le_bytes())
    {
        h ^= u64::from(b);
        h = h.wrapping_mul(PRIME);
    }
    (h & 0xFFFF_FFFF) as u32
}

fn gaussian_kernel_q16(radius: u32, sigma: f32) -> CardResult<Vec<u32>> {
    if radius == 0 {
        return Ok(vec![1 << 16]);
    }
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CardError::validation("blur sigma must be finite and > 0"));
    }

    let r = radius as i32;
    let sigma = f64::from(sigma);
    let denom = 2.0 * sigma * sigma;
    let weights_f: Vec<f64> = (-r..=r)
        .map(|i| (-(f64::from(i) * f64::from(i)) / denom).exp())
        .collect();
    let sum: f64 = weights_f.iter().sum();
    if sum <= 0.0 {
        return Err(CardError::render("BLUR_KERNEL", "gaussian kernel sum is zero"));
    }

    let mut weights: Vec<u32> = weights_f
        .iter()
        .map(|wf| ((wf / sum) * 65536.0).round().clamp(0.0, 65536.0) as u32)
        .collect();
    let acc: i64 = weights.iter().map(|&w| i64::from(w)).sum();
    let delta = 65536 - acc;
    if delta != 0 {
        let mid = weights.len() / 2;
        weights[mid] = (i64::from(weights[mid]) + delta).clamp(0, 65536) as u32;
    }
    Ok(weights)
}

fn blur_rgba8_premul_q16(
    src: &[u8],
    dst: &mut [u8],
    tmp: &mut [u8],
    width: u32,
    height: u32,
    kernel: &[u32],
) {
    if kernel.len() == 1 {
        dst.copy_from_slice(src);
        return;
    }
    blur_pass(src, tmp, width, height, kernel, true);
    blur_pass(tmp, dst, width, height, kernel, false);
}

fn blur_pass(src: &[u8], dst: &mut [u8], width: u32, height: u32, k: &[u32], horizontal: bool) {
    let radius = (k.len() / 2) as i32;
    let (w, h) = (width as i32, height as i32);
    for y in 0..h {
        for x in 0..w {
            let mut acc = [0u64; 4];
            for (ki, &kw) in k.iter().enumerate() {
                let off = ki as i32 - radius;
                let (sx, sy) = if horizontal {
                    ((x + off).clamp(0, w - 1), y)
                } else {
                    (x, (y + off).clamp(0, h - 1))
                };
                let idx = ((sy * w + sx) as usize) * 4;
                for c in 0..4 {
                    acc[c] += u64::from(kw) * u64::from(src[idx + c]);
                }
            }
            let out = ((y * w + x) as usize) * 4;
            for c in 0..4 {
                dst[out + c] = ((acc[c] + (1 << 15)) >> 16).min(255) as u8;
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/fx.rs"]
mod tests;
