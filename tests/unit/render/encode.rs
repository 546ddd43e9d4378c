use super::*;

fn pixels(w: u32, h: u32) -> Vec<u8> {
    (0..w * h)
        .flat_map(|i| [(i * 7) as u8, (i * 13) as u8, 200, 255])
        .collect()
}

#[test]
fn format_names() {
    assert_eq!(OutputFormat::parse("PNG").unwrap(), OutputFormat::Png);
    assert_eq!(OutputFormat::parse("jpg").unwrap(), OutputFormat::Jpeg);
    assert_eq!(" WebP ".parse::<OutputFormat>().unwrap(), OutputFormat::Webp);
    assert_eq!(OutputFormat::Jpeg.mime(), "image/jpeg");

    let err = OutputFormat::parse("gif").unwrap_err();
    assert!(matches!(err, CardError::Validation(_)));
    assert!(err.to_string().contains("gif"));
}

#[test]
fn png_decodes_back_to_the_same_pixels() {
    let px = pixels(5, 3);
    let bytes = encode_rgba8(&px, 5, 3, OutputFormat::Png, 90).unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    let back = image::load_from_memory(&bytes).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (5, 3));
    assert_eq!(back.as_raw(), &px);
}

#[test]
fn jpeg_and_webp_have_their_signatures() {
    let px = pixels(16, 16);
    let jpeg = encode_rgba8(&px, 16, 16, OutputFormat::Jpeg, 80).unwrap();
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
    let webp = encode_rgba8(&px, 16, 16, OutputFormat::Webp, 80).unwrap();
    assert_eq!(&webp[..4], b"RIFF");
    assert_eq!(&webp[8..12], b"WEBP");
}

#[test]
fn wrong_buffer_length_fails() {
    let err = encode_rgba8(&[0; 7], 1, 2, OutputFormat::Png, 90).unwrap_err();
    assert_eq!(err.code(), "ENCODE_FAILED");
}

#[test]
fn jpeg_flattens_alpha_over_black() {
    assert_eq!(flatten_to_rgb(&[255, 255, 255, 0, 200, 100, 50, 255]), vec![0, 0, 0, 200, 100, 50]);
}
