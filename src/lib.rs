//! icon-press: batch conversion of SVG icons into restyled PNG renditions
//!
//! This crate fetches icon markup from URLs or local directories, recolors
//! it uniformly, and rasterizes each icon twice: as a square image and as a
//! wide, letterboxed image with the icon centered on a transparent canvas.
//!
//! # Pipeline
//!
//! ```text
//! Config ──► plan ──► [ConversionTask] ──► scheduler
//!                                             │ per task
//!                                             ▼
//!                      ContentFetcher ─► StyleTransformer ─► raster ─► PNG file
//!                                             │
//!                                             ▼
//!                                  ResultAggregator ──► RunSummary
//! ```
//!
//! # Example
//!
//! ```no_run
//! use icon_press::{Config, Converter, ExecutionMode, LogSettings};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let log = LogSettings::new(true);
//!     log.init();
//!
//!     let config = Config::load("icons.yaml")?;
//!     let summary = Converter::new(log)?
//!         .run(&config, ExecutionMode::Batched)
//!         .await?;
//!
//!     println!("{summary}");
//!     Ok(())
//! }
//! ```
//!
//! The stages are usable on their own as well:
//!
//! ```
//! use icon_press::{StyleOptions, StyleTransformer, render_square};
//!
//! let styled = StyleTransformer::default()
//!     .transform(
//!         r#"<svg viewBox="0 0 24 24"><path d="M4 12h16"/></svg>"#,
//!         &StyleOptions::new().with_color("crimson").with_size(48),
//!     )
//!     .unwrap();
//!
//! let image = render_square(&styled, 48).unwrap();
//! assert_eq!(image.dimensions(), (48, 48));
//! ```

mod config;
mod convert;
mod error;
mod fetch;
mod geometry;
mod logging;
mod markup;
mod plan;
mod raster;
mod scheduler;
mod stats;
mod style;

pub use config::{Config, ConfigError, Settings, SourceConfig, WideLayout, WideSettings};
pub use convert::Converter;
pub use error::{Error, FetchError, Result};
pub use fetch::{ContentFetcher, DefaultRetriever, Retrieve, SourceLocation, is_url};
pub use geometry::{RectPx, SizePx};
pub use logging::LogSettings;
pub use markup::{Element, MAX_DEPTH, Node, SvgDocument};
pub use plan::{ConversionTask, RenderParameters, TaskKind, basename, plan};
pub use raster::{composite_over, encode_png, render_square, render_wide};
pub use scheduler::{BATCH_SIZE, ExecutionMode, execute};
pub use stats::{ResultAggregator, RunStatistics, RunSummary, TaskResult, human_bytes};
pub use style::{DEFAULT_STROKE_WIDTH, IconStyle, StyleOptions, StyleTransformer};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
