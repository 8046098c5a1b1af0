use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use image::{Rgb, RgbImage};
use predicates::prelude::*;
use serde_json::Value;
use tempfile::tempdir;

fn write_image(dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.join(name);
    RgbImage::from_pixel(width, height, Rgb([90, 120, 200]))
        .save(&path)
        .unwrap();
    path
}

fn layout(args: &[&str]) -> Result<Value, Box<dyn Error>> {
    let output = Command::cargo_bin("centerprint-cli")?
        .arg("layout")
        .args(args)
        .output()?;
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    Ok(serde_json::from_slice(&output.stdout)?)
}

fn approx(value: &Value, expected: f64) -> bool {
    value.as_f64().map_or(false, |actual| (actual - expected).abs() < 0.01)
}

#[test]
fn print_writes_one_pdf_page_per_image() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let first = write_image(dir.path(), "a.png", 100, 50);
    let second = write_image(dir.path(), "b.png", 400, 300);
    let output = dir.path().join("job.pdf");

    Command::cargo_bin("centerprint-cli")?
        .args([
            "print",
            first.to_str().unwrap(),
            second.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Printed 2 page(s)"));

    let data = fs::read(&output)?;
    let text = String::from_utf8_lossy(&data);
    assert!(text.starts_with("%PDF"));
    assert!(text.contains("/Type /Pages /Count 2"));
    // A4 landscape media box.
    assert!(text.contains("/MediaBox [0 0 841.890 595.276]"));
    Ok(())
}

#[test]
fn print_rejects_range_beyond_the_last_image() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let first = write_image(dir.path(), "a.png", 10, 10);
    let second = write_image(dir.path(), "b.png", 10, 10);
    let output = dir.path().join("job.pdf");

    Command::cargo_bin("centerprint-cli")?
        .args([
            "print",
            first.to_str().unwrap(),
            second.to_str().unwrap(),
            "--range",
            "2-5",
            "--output",
            output.to_str().unwrap(),
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid page range"));

    assert!(!output.exists());
    Ok(())
}

#[test]
fn print_writes_previews_for_the_selected_pages() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let images: Vec<PathBuf> = (1..=3)
        .map(|n| write_image(dir.path(), &format!("{n}.png"), 60, 40))
        .collect();
    let output = dir.path().join("job.pdf");
    let previews = dir.path().join("previews");

    let mut command = Command::cargo_bin("centerprint-cli")?;
    command.arg("print");
    for image in &images {
        command.arg(image);
    }
    command
        .args(["--range", "2-3", "--preview-dpi", "36", "--output"])
        .arg(&output)
        .arg("--preview-dir")
        .arg(&previews)
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 2 preview page(s)"));

    assert!(!previews.join("page-001.png").exists());
    let preview = image::open(previews.join("page-002.png"))?;
    // A4 landscape at half of 72 dpi.
    assert_eq!((preview.width(), preview.height()), (421, 298));
    assert!(previews.join("page-003.png").exists());
    Ok(())
}

#[test]
fn print_rejects_an_unbounded_preview_dpi() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let image = write_image(dir.path(), "a.png", 10, 10);
    let output = dir.path().join("job.pdf");
    let previews = dir.path().join("previews");

    Command::cargo_bin("centerprint-cli")?
        .args(["print", image.to_str().unwrap(), "--preview-dpi", "4294967295"])
        .arg("--output")
        .arg(&output)
        .arg("--preview-dir")
        .arg(&previews)
        .assert()
        .failure()
        .stderr(predicate::str::contains("preview dpi must be between 1 and 1200"));

    assert!(!output.exists());
    assert!(!previews.exists());
    Ok(())
}

#[test]
fn layout_centres_fitting_images_and_shrinks_large_ones() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let small = write_image(dir.path(), "small.png", 100, 50);
    let large = write_image(dir.path(), "large.png", 2000, 1000);

    let report = layout(&[small.to_str().unwrap(), large.to_str().unwrap()])?;
    assert_eq!(report["range"], "all");
    assert!(approx(&report["printable_area"]["width"], 841.89));

    let pages = report["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 2);
    assert_eq!(pages[0]["page"], 1);
    assert!(approx(&pages[0]["scale"], 1.0));
    assert!(approx(&pages[0]["x"], (841.89 - 100.0) / 2.0));
    assert!(approx(&pages[0]["y"], (595.276 - 50.0) / 2.0));

    // Height ratio (0.595) beats width ratio (0.421); the width then overflows and
    // the offset is clamped at zero.
    assert!(approx(&pages[1]["scale"], 595.276 / 1000.0));
    assert!(approx(&pages[1]["x"], 0.0));
    Ok(())
}

#[test]
fn layout_current_page_prints_only_that_page() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let images: Vec<PathBuf> = (1..=3)
        .map(|n| write_image(dir.path(), &format!("{n}.png"), 10, 10))
        .collect();
    let paths: Vec<&str> = images.iter().map(|p| p.to_str().unwrap()).collect();

    let mut args = paths.clone();
    args.extend(["--range", "current", "--current-page", "2"]);
    let report = layout(&args)?;

    let pages = report["pages"].as_array().unwrap();
    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0]["page"], 2);
    assert!(pages[0]["image"].as_str().unwrap().ends_with("2.png"));
    Ok(())
}

#[test]
fn layout_unknown_range_word_prints_every_page() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let first = write_image(dir.path(), "a.png", 10, 10);
    let second = write_image(dir.path(), "b.png", 10, 10);

    let report = layout(&[
        first.to_str().unwrap(),
        second.to_str().unwrap(),
        "--range",
        "selection",
    ])?;
    assert_eq!(report["range"], "all");
    assert_eq!(report["pages"].as_array().unwrap().len(), 2);
    Ok(())
}

#[test]
fn layout_reads_page_setup_from_settings_file() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let image = write_image(dir.path(), "a.png", 10, 10);
    let settings = dir.path().join("settings.json");
    fs::write(
        &settings,
        r#"{ "orientation": "portrait", "margin": 36, "scaling": "no-scale" }"#,
    )?;

    let report = layout(&[
        image.to_str().unwrap(),
        "--settings",
        settings.to_str().unwrap(),
    ])?;
    assert!(approx(&report["printable_area"]["width"], 595.276 - 72.0));
    assert!(approx(&report["printable_area"]["height"], 841.89 - 72.0));
    Ok(())
}

#[test]
fn missing_image_is_reported() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("missing.png");

    Command::cargo_bin("centerprint-cli")?
        .args(["layout", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read dimensions"));
    Ok(())
}
