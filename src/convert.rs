//! The conversion engine.
//!
//! [`Converter`] performs a single task end to end (fetch, restyle,
//! rasterize, write) and drives whole runs through the scheduler.
//!
//! # Example
//!
//! ```no_run
//! use icon_press::{Config, Converter, ExecutionMode, LogSettings};
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load("icons.yaml")?;
//! let converter = Converter::new(LogSettings::default())?;
//! let summary = converter.run(&config, ExecutionMode::Batched).await?;
//! println!("{summary}");
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, FetchError, Result};
use crate::fetch::ContentFetcher;
use crate::logging::LogSettings;
use crate::plan::{ConversionTask, TaskKind, plan};
use crate::raster::{encode_png, render_square, render_wide};
use crate::scheduler::{ExecutionMode, execute};
use crate::stats::{ResultAggregator, RunSummary, TaskResult};
use crate::style::{StyleOptions, StyleTransformer};

/// Converts icons according to planned tasks.
///
/// Cloning is cheap and clones share the fetch cache.
#[derive(Clone)]
pub struct Converter {
    fetcher: Arc<ContentFetcher>,
    transformer: StyleTransformer,
    use_cache: bool,
    log: LogSettings,
}

impl Converter {
    /// Creates a converter that fetches with the default retriever.
    pub fn new(log: LogSettings) -> Result<Self, FetchError> {
        Ok(Self::with_fetcher(
            ContentFetcher::with_default_retriever()?,
            log,
        ))
    }

    /// Creates a converter around an existing fetcher.
    pub fn with_fetcher(fetcher: ContentFetcher, log: LogSettings) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            transformer: StyleTransformer::default(),
            use_cache: true,
            log,
        }
    }

    /// Replaces the style transformer.
    pub fn with_transformer(mut self, transformer: StyleTransformer) -> Self {
        self.transformer = transformer;
        self
    }

    /// Enables or disables the fetch cache (enabled by default).
    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn fetcher(&self) -> &ContentFetcher {
        &self.fetcher
    }

    /// Plans and executes every task in `config`.
    ///
    /// Only failure to create the output directory aborts the run; task
    /// failures are counted in the summary.
    pub async fn run(&self, config: &Config, mode: ExecutionMode) -> Result<RunSummary> {
        let tasks = plan(config);
        let mut aggregator = ResultAggregator::new(tasks.len());

        let out_dir = &config.settings.output_directory;
        tokio::fs::create_dir_all(out_dir)
            .await
            .map_err(|source| Error::Write {
                path: out_dir.clone(),
                source,
            })?;

        tracing::info!(
            tasks = tasks.len(),
            ?mode,
            output = %out_dir.display(),
            "starting conversion"
        );

        let converter = self.clone();
        execute(tasks, mode, &mut aggregator, move |task| {
            let converter = converter.clone();
            async move { converter.convert(&task).await }
        })
        .await;

        let summary = aggregator.summarize();
        tracing::info!(
            successful = summary.successful,
            failed = summary.failed,
            bytes = summary.total_bytes,
            elapsed_ms = summary.elapsed_millis,
            "conversion finished"
        );
        Ok(summary)
    }

    /// Runs one task, capturing any failure in the result.
    pub async fn convert(&self, task: &ConversionTask) -> TaskResult {
        match self.try_convert(task).await {
            Ok(bytes) => {
                if self.log.verbose {
                    tracing::info!(
                        output = %task.output_path.display(),
                        bytes,
                        "converted {} ({})",
                        task.icon_name,
                        task.kind
                    );
                }
                TaskResult::succeeded(task.output_path.clone(), bytes)
            }
            Err(e) => {
                tracing::warn!(
                    source = %task.source,
                    output = %task.output_path.display(),
                    "failed to convert {} ({}): {e}",
                    task.icon_name,
                    task.kind
                );
                TaskResult::failed(Some(task.output_path.clone()), e.to_string())
            }
        }
    }

    async fn try_convert(&self, task: &ConversionTask) -> Result<u64> {
        let markup = self.fetcher.fetch(&task.source, self.use_cache).await?;
        let png = self.render(&markup, task)?;
        write_output(&task.output_path, &png).await?;
        Ok(png.len() as u64)
    }

    /// Restyles and rasterizes markup for a task, returning PNG bytes.
    pub fn render(&self, markup: &str, task: &ConversionTask) -> Result<Vec<u8>> {
        let params = &task.parameters;
        let options = StyleOptions {
            color: params.color.clone(),
            ..StyleOptions::new().with_size(params.icon_size)
        };
        let styled = self.transformer.transform(markup, &options)?;

        let image = match task.kind {
            TaskKind::Square => render_square(&styled, params.icon_size)?,
            TaskKind::Wide => render_wide(
                &styled,
                params.icon_size,
                params.canvas.width,
                params.canvas.height,
            )?,
        };
        encode_png(&image)
    }
}

async fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| Error::Write {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{Retrieve, SourceLocation};
    use crate::geometry::SizePx;
    use crate::plan::RenderParameters;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::path::PathBuf;

    const DOT: &str = r##"<svg viewBox="0 0 24 24"><circle cx="12" cy="12" r="6" fill="#000"/></svg>"##;

    /// Serves markup from memory, keyed by source string.
    struct MemoryRetriever(HashMap<String, String>);

    #[async_trait]
    impl Retrieve for MemoryRetriever {
        async fn retrieve(&self, location: &SourceLocation) -> Result<String, FetchError> {
            let key = match location {
                SourceLocation::Remote(url) => url.to_string(),
                SourceLocation::Local(path) => path.to_string_lossy().into_owned(),
            };
            self.0
                .get(&key)
                .cloned()
                .ok_or(FetchError::NotFound { path: key.into() })
        }
    }

    fn converter(files: &[(&str, &str)]) -> Converter {
        let files = files
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Converter::with_fetcher(
            ContentFetcher::new(Arc::new(MemoryRetriever(files))),
            LogSettings::default(),
        )
    }

    fn task(kind: TaskKind, source: &str, output: PathBuf, canvas: SizePx) -> ConversionTask {
        ConversionTask {
            kind,
            source: source.into(),
            output_path: output,
            icon_name: "dot".into(),
            suffix: String::new(),
            parameters: RenderParameters {
                color: Some("#ff0000".into()),
                icon_size: 16,
                canvas,
            },
        }
    }

    #[tokio::test]
    async fn square_task_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dot.png");
        let task = task(TaskKind::Square, "dot.svg", output.clone(), SizePx::square(16));

        let result = converter(&[("dot.svg", DOT)]).convert(&task).await;

        assert!(result.success, "{:?}", result.error_message);
        let written = std::fs::read(&output).unwrap();
        assert_eq!(result.byte_size, Some(written.len() as u64));

        let img = image::load_from_memory(&written).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (16, 16));
        // Recolored solid icon.
        assert_eq!(img.get_pixel(8, 8).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(0, 0)[3], 0);
    }

    #[tokio::test]
    async fn wide_task_uses_canvas_size() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("dot_wide.png");
        let task = task(TaskKind::Wide, "dot.svg", output.clone(), SizePx::new(64, 32));

        let result = converter(&[("dot.svg", DOT)]).convert(&task).await;

        assert!(result.success, "{:?}", result.error_message);
        let img = image::open(&output).unwrap().to_rgba8();
        assert_eq!(img.dimensions(), (64, 32));
        assert_eq!(img.get_pixel(32, 16).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(5, 16)[3], 0);
    }

    #[tokio::test]
    async fn missing_source_fails_without_output() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("gone.png");
        let task = task(TaskKind::Square, "gone.svg", output.clone(), SizePx::square(16));

        let result = converter(&[]).convert(&task).await;

        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("not found"));
        assert!(!output.exists());
    }

    #[tokio::test]
    async fn non_svg_markup_fails() {
        let dir = tempfile::tempdir().unwrap();
        let task = task(
            TaskKind::Square,
            "page.html",
            dir.path().join("page.png"),
            SizePx::square(16),
        );

        let result = converter(&[("page.html", "<html/>")]).convert(&task).await;

        assert!(!result.success);
        assert!(result.error_message.unwrap().contains("malformed markup"));
    }

    #[tokio::test]
    async fn unwritable_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("missing-dir").join("dot.png");
        let task = task(TaskKind::Square, "dot.svg", output, SizePx::square(16));

        let result = converter(&[("dot.svg", DOT)]).convert(&task).await;

        assert!(!result.success);
        assert!(result.error_message.unwrap().starts_with("failed to write"));
    }
}
