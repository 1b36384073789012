use std::fs;
use std::path::Path;

use icon_press::{Config, ConfigError, Converter, ExecutionMode, LogSettings, TaskKind, plan};

const ICON: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" fill="none" stroke="black" stroke-width="1"><circle cx="12" cy="12" r="9"/></svg>"#;

fn write_icon(dir: &Path, name: &str) {
    fs::create_dir_all(dir).unwrap();
    fs::write(dir.join(name), ICON).unwrap();
}

fn yaml(source: &str, out: &Path, extra_icons: &[&str], settings_tail: &str) -> String {
    let mut icons = String::from("  - a.svg\n");
    for icon in extra_icons {
        icons.push_str(&format!("  - {icon}\n"));
    }
    format!(
        "icons:\n{icons}sources:\n  - source: \"{source}\"\n    suffix: _s\nsettings:\n  size: 10\n  outputDirectory: \"{}\"\n{settings_tail}",
        out.display()
    )
}

fn converter() -> Converter {
    Converter::new(LogSettings::default()).unwrap()
}

#[tokio::test]
async fn local_source_produces_square_and_wide_pngs() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("x");
    let out = dir.path().join("out");
    write_icon(&source, "a.svg");

    let config =
        Config::from_yaml_str(&yaml(&source.display().to_string(), &out, &[], "")).unwrap();
    let summary = converter()
        .run(&config, ExecutionMode::Sequential)
        .await
        .unwrap();

    assert_eq!(summary.total, 2);
    assert_eq!(summary.successful, 2);
    assert_eq!(summary.failed, 0);

    let square = image::open(out.join("a_s.png")).unwrap();
    assert_eq!((square.width(), square.height()), (10, 10));

    let wide = image::open(out.join("a_s_wide.png")).unwrap().to_rgba8();
    assert_eq!(wide.dimensions(), (320, 180));
    // Letterbox margins stay transparent.
    assert_eq!(wide.get_pixel(0, 0)[3], 0);
    assert_eq!(wide.get_pixel(319, 179)[3], 0);

    let on_disk = fs::metadata(out.join("a_s.png")).unwrap().len()
        + fs::metadata(out.join("a_s_wide.png")).unwrap().len();
    assert_eq!(summary.total_bytes, on_disk);
}

#[tokio::test]
async fn batched_run_completes_despite_missing_icon() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("icons");
    let out = dir.path().join("out");
    write_icon(&source, "a.svg");
    write_icon(&source, "b.svg");
    write_icon(&source, "c.svg");

    let config = Config::from_yaml_str(&yaml(
        &source.display().to_string(),
        &out,
        &["missing.svg", "b.svg", "c.svg"],
        "  color: \"#0ea5e9\"\n",
    ))
    .unwrap();
    let summary = converter()
        .run(&config, ExecutionMode::Batched)
        .await
        .unwrap();

    assert_eq!(summary.total, 8);
    assert_eq!(summary.successful, 6);
    assert_eq!(summary.failed, 2);
    assert!(out.join("c_s_wide.png").exists());
    assert!(!out.join("missing_s.png").exists());
}

#[tokio::test]
async fn file_urls_are_fetched_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("remote");
    let out = dir.path().join("out");
    write_icon(&source, "a.svg");

    let base = format!("file://{}/", source.display());
    let config = Config::from_yaml_str(&yaml(
        &base,
        &out,
        &[],
        "  wide:\n    width: 64\n    height: 32\n    wideSuffix: \"-banner\"\n",
    ))
    .unwrap();
    let summary = converter()
        .run(&config, ExecutionMode::Sequential)
        .await
        .unwrap();

    assert_eq!(summary.successful, 2, "{summary}");
    let banner = image::open(out.join("a_s-banner.png")).unwrap();
    assert_eq!((banner.width(), banner.height()), (64, 32));
}

#[test]
fn config_file_round_trip_through_plan() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("icons.yaml");
    fs::write(
        &path,
        yaml("https://cdn.example.com/icons/", Path::new("out"), &["b.svg"], ""),
    )
    .unwrap();

    let config = Config::load(&path).unwrap();
    let tasks = plan(&config);

    let summary: Vec<_> = tasks
        .iter()
        .map(|t| (t.kind, t.source.as_str(), t.output_path.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (TaskKind::Square, "https://cdn.example.com/icons/a.svg", "out/a_s.png".to_string()),
            (TaskKind::Wide, "https://cdn.example.com/icons/a.svg", "out/a_s_wide.png".to_string()),
            (TaskKind::Square, "https://cdn.example.com/icons/b.svg", "out/b_s.png".to_string()),
            (TaskKind::Wide, "https://cdn.example.com/icons/b.svg", "out/b_s_wide.png".to_string()),
        ]
    );
}

#[test]
fn missing_config_file_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let err = Config::load(dir.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn invalid_config_lists_every_problem() {
    let text = "icons: []\nsources: []\nsettings:\n  size: 0\n  outputDirectory: out\n";
    let err = Config::from_yaml_str(text).unwrap_err();
    assert_eq!(err.violations().len(), 3, "{err}");
}
