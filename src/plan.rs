//! Expansion of a [`Config`] into conversion tasks.
//!
//! Planning is pure: it does no I/O and the same config always yields the
//! same tasks in the same order.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::config::{Config, SourceConfig};
use crate::fetch::is_url;
use crate::geometry::SizePx;

/// Which rendition a task produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKind {
    /// 1:1 output of `settings.size`.
    Square,
    /// Letterboxed output with the icon centered.
    Wide,
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Square => "square",
            Self::Wide => "wide",
        })
    }
}

/// How a task renders its icon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderParameters {
    /// Uniform color, or `None` to keep the icon's own styling.
    pub color: Option<String>,
    /// Edge length of the rendered icon square.
    pub icon_size: u32,
    /// Output image size. Equals the icon square for square tasks.
    pub canvas: SizePx,
}

/// One output file to produce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionTask {
    pub kind: TaskKind,
    /// Full URL or path of the icon markup.
    pub source: String,
    pub output_path: PathBuf,
    /// Icon filename without directories or `.svg`.
    pub icon_name: String,
    pub suffix: String,
    pub parameters: RenderParameters,
}

/// Expands every icon × source pair into a square task followed by a wide
/// task, grouped by icon, then source, then kind.
pub fn plan(config: &Config) -> Vec<ConversionTask> {
    let settings = &config.settings;
    let wide = settings.wide_layout();
    let out_dir = &settings.output_directory;

    let mut tasks = Vec::with_capacity(2 * config.icons.len() * config.sources.len());

    for icon in &config.icons {
        let name = basename(icon);

        for source in &config.sources {
            let location = source_location(source, icon);

            tasks.push(ConversionTask {
                kind: TaskKind::Square,
                source: location.clone(),
                output_path: out_dir.join(format!("{name}{}.png", source.suffix)),
                icon_name: name.to_string(),
                suffix: source.suffix.clone(),
                parameters: RenderParameters {
                    color: settings.color.clone(),
                    icon_size: settings.size,
                    canvas: SizePx::square(settings.size),
                },
            });

            tasks.push(ConversionTask {
                kind: TaskKind::Wide,
                source: location,
                output_path: out_dir.join(format!("{name}{}{}.png", source.suffix, wide.suffix)),
                icon_name: name.to_string(),
                suffix: source.suffix.clone(),
                parameters: RenderParameters {
                    color: settings.color.clone(),
                    icon_size: wide.icon_size,
                    canvas: SizePx::new(wide.width, wide.height),
                },
            });
        }
    }

    tracing::debug!(tasks = tasks.len(), "planned conversion tasks");
    tasks
}

/// Returns the final path component with a trailing `.svg` removed.
pub fn basename(icon: &str) -> &str {
    let file_name = Path::new(icon)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(icon);
    file_name.strip_suffix(".svg").unwrap_or(file_name)
}

/// URL sources are prefixes and get the icon appended verbatim; local
/// sources are directories.
fn source_location(source: &SourceConfig, icon: &str) -> String {
    if is_url(&source.location) {
        format!("{}{icon}", source.location)
    } else {
        Path::new(&source.location)
            .join(icon)
            .to_string_lossy()
            .into_owned()
    }
}
