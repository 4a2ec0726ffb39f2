//! Integration tests for the sprc CLI
//!
//! These tests verify end-to-end behavior by running the binary in a
//! scratch directory and checking exit codes, stdout and written files.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

const BOOK: &str = r##"{
    palette: [[0, 0, 0, 0], "#ffffff", [35, 255, 70]],
    filters: { green: { "1": 2 } },
    sprites: {
        hero: { idle: "1001" },
        hero_green: ["filter", "hero", "green"],
        panel: ["multiple", "vertical", { top: "11", middle: "00", bottom: "22" }],
    },
}"##;

/// Path to the sprc binary built for this test run
fn sprc_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_sprc"))
}

fn sprc(dir: &Path, args: &[&str]) -> Output {
    Command::new(sprc_binary())
        .current_dir(dir)
        .args(args)
        .output()
        .expect("Failed to execute sprc")
}

fn write_book(dir: &Path) -> PathBuf {
    let path = dir.join("book.json5");
    fs::write(&path, BOOK).unwrap();
    path
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn test_decode_writes_png() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());

    let output = sprc(dir.path(), &["decode", "book.json5", "hero.idle", "--width", "2", "--height", "2"]);
    assert!(output.status.success(), "decode failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Saved: hero.idle.png"));

    let image = image::open(dir.path().join("hero.idle.png")).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (2, 2));
    assert_eq!(image.get_pixel(0, 0), &Rgba([255, 255, 255, 255]));
    assert_eq!(image.get_pixel(1, 0), &Rgba([0, 0, 0, 0]));
}

#[test]
fn test_decode_infers_missing_dimensions() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());

    let output = sprc(dir.path(), &["decode", "book.json5", "hero.idle"]);
    assert!(output.status.success(), "decode failed: {}", stderr(&output));
    let image = image::open(dir.path().join("hero.idle.png")).unwrap();
    assert_eq!((image.width(), image.height()), (4, 1));

    let output = sprc(dir.path(), &["decode", "book.json5", "hero.idle", "--width", "1", "-o", "column.png"]);
    assert!(output.status.success(), "decode failed: {}", stderr(&output));
    let image = image::open(dir.path().join("column.png")).unwrap();
    assert_eq!((image.width(), image.height()), (1, 4));
}

#[test]
fn test_decode_scale_and_filter() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());

    let output = sprc(
        dir.path(),
        &["decode", "book.json5", "hero_green.idle", "--width", "2", "--height", "2", "--scale", "3", "-o", "out/green.png"],
    );
    assert!(output.status.success(), "decode failed: {}", stderr(&output));

    let image = image::open(dir.path().join("out/green.png")).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (6, 6));
    assert_eq!(image.get_pixel(2, 2), &Rgba([35, 255, 70, 255]));
    assert_eq!(image.get_pixel(5, 5), &Rgba([35, 255, 70, 255]));
    assert_eq!(image.get_pixel(3, 0), &Rgba([0, 0, 0, 0]));
}

#[test]
fn test_decode_composite_writes_parts() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());

    let output = sprc(dir.path(), &["decode", "book.json5", "panel", "--width", "2", "-o", "panel.png"]);
    assert!(output.status.success(), "decode failed: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("top thickness 1"));

    for part in ["top", "middle", "bottom"] {
        let path = dir.path().join(format!("panel_{}.png", part));
        assert!(path.exists(), "missing {}", path.display());
    }
}

#[test]
fn test_decode_unknown_sprite_lists_names() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());

    let output = sprc(dir.path(), &["decode", "book.json5", "villain", "--width", "1", "--height", "1"]);
    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("Error: sprite 'villain' not found"));
    assert!(err.contains("Available sprites:"));
    assert!(err.contains("hero.idle"));
}

#[test]
fn test_decode_missing_book() {
    let dir = TempDir::new().unwrap();
    let output = sprc(dir.path(), &["decode", "missing.json5", "hero"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("Cannot open sprite book"));
}

#[test]
fn test_invalid_scale_rejected() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());
    let output = sprc(dir.path(), &["decode", "book.json5", "hero.idle", "--scale", "0"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_encode_then_decode() {
    let dir = TempDir::new().unwrap();
    let original = RgbaImage::from_fn(4, 3, |x, y| {
        if (x + y) % 2 == 0 {
            Rgba([200, 30, 30, 255])
        } else if x == 3 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([40, 40, 40, 255])
        }
    });
    original.save(dir.path().join("knight.png")).unwrap();

    let output = sprc(dir.path(), &["encode", "knight.png", "-o", "knight.json"]);
    assert!(output.status.success(), "encode failed: {}", stderr(&output));
    assert!(stdout(&output).contains("Saved: knight.json"));

    let book: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("knight.json")).unwrap()).unwrap();
    assert_eq!(book["palette"][0], serde_json::json!([0, 0, 0, 0]));
    assert!(book["sprites"]["knight"].as_str().unwrap().starts_with("p["));

    let output = sprc(
        dir.path(),
        &["decode", "knight.json", "knight", "--width", "4", "--height", "3", "-o", "decoded.png"],
    );
    assert!(output.status.success(), "decode failed: {}", stderr(&output));
    let decoded = image::open(dir.path().join("decoded.png")).unwrap().to_rgba8();
    assert_eq!(decoded, original);
}

#[test]
fn test_encode_glob_against_book_palette() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());
    fs::create_dir(dir.path().join("art")).unwrap();
    RgbaImage::from_pixel(2, 1, Rgba([255, 255, 255, 255])).save(dir.path().join("art/a.png")).unwrap();
    RgbaImage::from_pixel(1, 1, Rgba([30, 250, 80, 255])).save(dir.path().join("art/b.png")).unwrap();

    let output = sprc(dir.path(), &["encode", "art/*.png", "--book", "book.json5"]);
    assert!(output.status.success(), "encode failed: {}", stderr(&output));

    let book: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(book["palette"].as_array().map(Vec::len), Some(3));
    assert_eq!(book["sprites"]["a"], "p[1]00");
    assert_eq!(book["sprites"]["b"], "p[2]0");
}

#[test]
fn test_encode_no_matches() {
    let dir = TempDir::new().unwrap();
    let output = sprc(dir.path(), &["encode", "*.png"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(stderr(&output).contains("No images match"));
}

#[test]
fn test_palette_hex() {
    let dir = TempDir::new().unwrap();
    let image = RgbaImage::from_fn(3, 1, |x, _| match x {
        0 => Rgba([35, 255, 70, 255]),
        1 => Rgba([255, 255, 255, 255]),
        _ => Rgba([9, 9, 9, 0]),
    });
    image.save(dir.path().join("dot.png")).unwrap();

    let output = sprc(dir.path(), &["palette", "dot.png", "--hex"]);
    assert!(output.status.success(), "palette failed: {}", stderr(&output));
    let colors: Vec<String> = serde_json::from_str(stdout(&output).trim()).unwrap();
    assert_eq!(colors, vec!["#00000000", "#ffffffff", "#23ff46ff"]);
}

#[test]
fn test_palette_force_transparent() {
    let dir = TempDir::new().unwrap();
    RgbaImage::from_pixel(2, 2, Rgba([10, 20, 30, 255])).save(dir.path().join("solid.png")).unwrap();

    let plain = sprc(dir.path(), &["palette", "solid.png"]);
    let colors: Vec<[u8; 4]> = serde_json::from_str(stdout(&plain).trim()).unwrap();
    assert_eq!(colors, vec![[10, 20, 30, 255]]);

    let forced = sprc(dir.path(), &["palette", "solid.png", "--force-transparent"]);
    let colors: Vec<[u8; 4]> = serde_json::from_str(stdout(&forced).trim()).unwrap();
    assert_eq!(colors, vec![[0, 0, 0, 0], [10, 20, 30, 255]]);
}

#[test]
fn test_config_file_sets_scale() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());
    fs::write(dir.path().join("sprc.toml"), "[codec]\nscale = 2\n").unwrap();

    let output = sprc(dir.path(), &["decode", "book.json5", "hero.idle", "--width", "2", "--height", "2"]);
    assert!(output.status.success(), "decode failed: {}", stderr(&output));
    let image = image::open(dir.path().join("hero.idle.png")).unwrap();
    assert_eq!((image.width(), image.height()), (4, 4));
}

#[test]
fn test_invalid_config_is_an_error() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());
    fs::write(dir.path().join("sprc.toml"), "[codec]\nscale = 99\n").unwrap();

    let output = sprc(dir.path(), &["info", "book.json5"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stderr(&output).contains("codec.scale"));
}

#[test]
fn test_info_json() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());

    let output = sprc(dir.path(), &["info", "book.json5", "--json"]);
    assert!(output.status.success(), "info failed: {}", stderr(&output));
    let info: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(info["palette_size"], 3);
    assert_eq!(info["digit_size"], 1);
    assert_eq!(info["filters"], serde_json::json!(["green"]));

    let entries = info["entries"].as_array().unwrap();
    let kinds: Vec<(&str, &str)> = entries
        .iter()
        .map(|e| (e["name"].as_str().unwrap(), e["kind"].as_str().unwrap()))
        .collect();
    assert_eq!(
        kinds,
        vec![("hero.idle", "literal"), ("hero_green", "filter"), ("panel", "multiple")]
    );
}

#[test]
fn test_info_text() {
    let dir = TempDir::new().unwrap();
    write_book(dir.path());

    let output = sprc(dir.path(), &["info", "book.json5"]);
    assert!(output.status.success());
    let text = stdout(&output);
    assert!(text.contains("Palette: 3 colors (1-digit groups)"));
    assert!(text.contains("Filters: green"));
    assert!(text.contains("hero @green"));
}
