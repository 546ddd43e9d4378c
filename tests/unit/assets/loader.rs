use std::io::Cursor;

use super::*;

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "cardstock_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn write_png(path: &Path) {
    let img = image::RgbaImage::from_raw(1, 1, vec![1u8, 2u8, 3u8, 255u8]).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    std::fs::write(path, &buf).unwrap();
}

#[test]
fn normalize_rel_path_rules() {
    assert_eq!(normalize_rel_path("a/./b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("a\\b.png").unwrap(), "a/b.png");
    assert_eq!(normalize_rel_path("./img//x.png").unwrap(), "img/x.png");
    assert!(normalize_rel_path("").is_err());
    assert!(normalize_rel_path("/etc/passwd").is_err());
    assert!(normalize_rel_path("../secret.png").is_err());
    assert!(normalize_rel_path("a/../../b.png").is_err());
    assert!(normalize_rel_path("./.").is_err());
}

#[test]
fn remote_detection_is_case_insensitive() {
    assert!(is_remote("https://cdn.example.com/a.png"));
    assert!(is_remote("HTTP://x"));
    assert!(!is_remote("file:///tmp/a.png"));
    assert!(!is_remote("img/a.png"));
    assert!(!is_remote("http"));
}

#[test]
fn loads_relative_files_from_the_asset_root() {
    let root = temp_dir("loader_rel");
    std::fs::create_dir_all(root.join("img")).unwrap();
    write_png(&root.join("img/a.png"));

    let loader = SourceLoader::new(SourceLoaderOpts {
        asset_root: root.clone(),
        ..SourceLoaderOpts::default()
    });
    let img = loader.load("img/a.png").unwrap();
    assert_eq!((img.width, img.height), (1, 1));

    let abs = root.join("img/a.png");
    let img = loader.load(abs.to_str().unwrap()).unwrap();
    assert_eq!(img.width, 1);

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn failures_are_asset_errors_naming_the_source() {
    let root = temp_dir("loader_fail");
    std::fs::create_dir_all(&root).unwrap();
    std::fs::write(root.join("bad.png"), b"not a png").unwrap();
    let loader = SourceLoader::new(SourceLoaderOpts {
        asset_root: root.clone(),
        ..SourceLoaderOpts::default()
    });

    for source in ["missing.png", "bad.png", "../escape.png", "  "] {
        match loader.load(source) {
            Err(CardError::Asset { url, .. }) => assert_eq!(url, source),
            other => panic!("expected asset error for {source:?}, got {other:?}"),
        }
    }

    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn byte_limit_applies_to_local_files() {
    let root = temp_dir("loader_limit");
    std::fs::create_dir_all(&root).unwrap();
    write_png(&root.join("a.png"));
    let loader = SourceLoader::new(SourceLoaderOpts {
        asset_root: root.clone(),
        max_bytes: 8,
        ..SourceLoaderOpts::default()
    });
    let err = loader.load("a.png").unwrap_err();
    assert!(err.to_string().contains("exceeds 8 bytes"), "{err}");
    std::fs::remove_dir_all(&root).ok();
}

#[test]
fn closures_are_loaders() {
    let loader = |source: &str| -> CardResult<LoadedImage> {
        if source == "ok" {
            LoadedImage::from_rgba8(1, 1, &[0, 0, 0, 255])
        } else {
            Err(CardError::asset(source, "nope"))
        }
    };
    assert!(AssetLoader::load(&loader, "ok").is_ok());
    assert!(AssetLoader::load(&loader, "other").is_err());
}
