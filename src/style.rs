//! Uniform restyling of SVG icons.
//!
//! Icon sets come in two flavours: *outline* icons drawn with stroked,
//! unfilled shapes and *solid* icons drawn with filled shapes. Recoloring has
//! to respect that, so [`StyleTransformer`] first classifies the icon and then
//! rewrites its presentation attributes accordingly.

use crate::error::Result;
use crate::markup::{Element, SvgDocument};

/// Stroke width applied to outline icons.
pub const DEFAULT_STROKE_WIDTH: &str = "2";

/// Elements that draw geometry.
pub const SHAPE_ELEMENTS: &[&str] = &[
    "path", "circle", "rect", "ellipse", "line", "polyline", "polygon",
];

/// Presentation attributes cleared before recoloring.
const STYLE_ATTRIBUTES: &[&str] = &["fill", "stroke", "stroke-width"];

const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

// ============================================================================
// IconStyle
// ============================================================================

/// How an icon draws its shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconStyle {
    /// Stroked, unfilled shapes.
    Outline,
    /// Filled shapes without stroke.
    Solid,
}

impl IconStyle {
    /// Classifies an icon from its shape elements.
    ///
    /// A single shape that has a `stroke`, has `fill="none"` or has no `fill`
    /// at all makes the whole icon an outline icon.
    pub fn detect(root: &Element) -> Self {
        let is_outline = root.descendants().filter(|el| is_shape(el)).any(|shape| {
            shape.has_attr("stroke")
                || shape.attr("fill").is_none_or(|fill| fill.trim() == "none")
        });

        if is_outline { Self::Outline } else { Self::Solid }
    }
}

fn is_shape(element: &Element) -> bool {
    SHAPE_ELEMENTS.contains(&element.local_name())
}

// ============================================================================
// StyleOptions
// ============================================================================

/// What to change on an icon. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleOptions {
    /// Color applied to every shape. `None` leaves styling untouched.
    pub color: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl StyleOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = Some(color.into());
        self
    }

    /// Sets both dimensions to `size`.
    pub fn with_size(mut self, size: u32) -> Self {
        self.width = Some(size);
        self.height = Some(size);
        self
    }
}

// ============================================================================
// StyleTransformer
// ============================================================================

/// Rewrites icon markup with new dimensions and a uniform color.
#[derive(Debug, Clone)]
pub struct StyleTransformer {
    stroke_width: String,
}

impl Default for StyleTransformer {
    fn default() -> Self {
        Self::new(DEFAULT_STROKE_WIDTH)
    }
}

impl StyleTransformer {
    /// Creates a transformer that gives outline icons the given stroke width.
    pub fn new(stroke_width: impl Into<String>) -> Self {
        Self {
            stroke_width: stroke_width.into(),
        }
    }

    pub fn stroke_width(&self) -> &str {
        &self.stroke_width
    }

    /// Applies `options` to `markup` and returns the restyled `<svg>` element,
    /// preceded by the source's doctype if it had one.
    ///
    /// Fails with [`MalformedMarkup`](crate::Error::MalformedMarkup) if the
    /// markup has no `svg` element.
    pub fn transform(&self, markup: &str, options: &StyleOptions) -> Result<String> {
        let mut doc = SvgDocument::parse(markup)?;
        let root = &mut doc.root;

        if !root.has_attr("xmlns") {
            root.set_attr("xmlns", SVG_NAMESPACE);
        }
        if let Some(width) = options.width {
            root.set_attr("width", &width.to_string());
        }
        if let Some(height) = options.height {
            root.set_attr("height", &height.to_string());
        }

        if let Some(color) = &options.color {
            let style = IconStyle::detect(root);
            tracing::trace!(?style, "recoloring icon");
            self.recolor(root, style, color);
        }

        Ok(doc.to_string())
    }

    fn recolor(&self, root: &mut Element, style: IconStyle, color: &str) {
        strip_style(root);
        root.for_each_descendant_mut(&mut strip_style);

        match style {
            IconStyle::Outline => {
                root.set_attr("stroke", color);
                root.set_attr("fill", "none");
                root.set_attr("stroke-width", &self.stroke_width);
                root.for_each_descendant_mut(&mut |el| {
                    if is_shape(el) {
                        el.set_attr("stroke", color);
                        el.set_attr("fill", "none");
                        if !el.has_attr("stroke-width") {
                            el.set_attr("stroke-width", &self.stroke_width);
                        }
                    }
                });
            }
            IconStyle::Solid => {
                root.set_attr("fill", color);
                root.for_each_descendant_mut(&mut |el| {
                    if is_shape(el) {
                        el.set_attr("fill", color);
                    }
                });
            }
        }
    }
}

fn strip_style(element: &mut Element) {
    for attr in STYLE_ATTRIBUTES {
        element.remove_attr(attr);
    }
}

// ============================================================================
// Tests
// ============================================================================
