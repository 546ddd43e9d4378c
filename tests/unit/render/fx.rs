use serde_json::json;

use super::*;

fn solid(w: u32, h: u32, px: [u8; 4]) -> Vec<u8> {
    px.iter().copied().cycle().take((w * h * 4) as usize).collect()
}

#[test]
fn parses_names_and_objects() {
    assert_eq!(
        Effect::parse(&json!("vignette")).unwrap(),
        Effect::Vignette { strength: 0.4 }
    );
    assert_eq!(
        Effect::parse(&json!({ "type": "Noise", "amount": 0.1, "seed": 7 })).unwrap(),
        Effect::Noise { amount: 0.1, seed: 7 }
    );
    assert_eq!(
        Effect::parse(&json!({ "type": "overlay", "color": "#ff0000", "opacity": 3 })).unwrap(),
        Effect::Overlay {
            color: Some(json!("#ff0000")),
            opacity: 1.0
        }
    );
    assert_eq!(Effect::parse(&json!("glow")).unwrap().name(), "glow");
}

#[test]
fn unknown_effects_are_render_errors() {
    let err = Effect::parse(&json!("sparkle")).unwrap_err();
    assert_eq!(err.code(), "UNKNOWN_EFFECT");
    assert!(parse_effects(&[json!("glow"), json!({ "kind": "x" })]).is_err());
    assert!(Effect::parse(&json!(3)).is_err());
}

#[test]
fn overlay_blends_over_premultiplied_pixels() {
    let mut px = solid(2, 2, [0, 0, 255, 255]);
    let fx = Effect::Overlay {
        color: Some(json!("#ff0000")),
        opacity: 0.5,
    };
    fx.apply(&mut px, 2, 2, 1.0, &TokenMap::new()).unwrap();
    assert_eq!(&px[..4], &[128, 0, 127, 255]);
}

#[test]
fn overlay_color_can_come_from_tokens() {
    let mut px = solid(1, 1, [0, 0, 0, 255]);
    let mut tokens = TokenMap::new();
    tokens.insert("overlay.color".to_owned(), json!("#ffffff"));
    let fx = Effect::Overlay {
        color: None,
        opacity: 1.0,
    };
    fx.apply(&mut px, 1, 1, 1.0, &tokens).unwrap();
    assert_eq!(px, vec![255, 255, 255, 255]);
}

#[test]
fn vignette_darkens_corners_not_center() {
    let (w, h) = (21, 21);
    let mut px = solid(w, h, [200, 200, 200, 255]);
    Effect::Vignette { strength: 1.0 }
        .apply(&mut px, w, h, 1.0, &TokenMap::new())
        .unwrap();
    let center = ((10 * w + 10) * 4) as usize;
    assert_eq!(px[center], 200);
    assert!(px[0] < 100, "corner {}", px[0]);
    assert_eq!(px[3], 255);
}

#[test]
fn noise_is_deterministic_and_respects_alpha() {
    let (w, h) = (8, 8);
    let base = solid(w, h, [128, 128, 128, 255]);
    let fx = Effect::Noise { amount: 0.2, seed: 42 };
    let mut a = base.clone();
    let mut b = base.clone();
    fx.apply(&mut a, w, h, 1.0, &TokenMap::new()).unwrap();
    fx.apply(&mut b, w, h, 1.0, &TokenMap::new()).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, base);

    let mut clear = solid(w, h, [0, 0, 0, 0]);
    fx.apply(&mut clear, w, h, 1.0, &TokenMap::new()).unwrap();
    assert!(clear.iter().all(|&c| c == 0));
}

#[test]
fn glow_spreads_bright_pixels() {
    let (w, h) = (9, 9);
    let mut px = solid(w, h, [0, 0, 0, 255]);
    let mid = ((4 * w + 4) * 4) as usize;
    px[mid..mid + 4].copy_from_slice(&[255, 255, 255, 255]);
    let fx = Effect::Glow {
        color: Some(json!("#00ff00")),
        radius: Some(3.0),
        intensity: Some(1.0),
    };
    fx.apply(&mut px, w, h, 1.0, &TokenMap::new()).unwrap();
    let neighbor = ((4 * w + 5) * 4) as usize;
    assert!(px[neighbor + 1] > 0, "green should bleed into neighbors");
    assert_eq!(px[neighbor], 0);
    assert!(px.chunks_exact(4).all(|p| p[0] <= p[3] && p[1] <= p[3]));
}

#[test]
fn kernel_sums_to_one_in_q16() {
    let k = gaussian_kernel_q16(4, 2.0).unwrap();
    assert_eq!(k.len(), 9);
    assert_eq!(k.iter().sum::<u32>(), 1 << 16);
    assert_eq!(gaussian_kernel_q16(0, 1.0).unwrap(), vec![1 << 16]);
    assert!(gaussian_kernel_q16(2, 0.0).is_err());
}
