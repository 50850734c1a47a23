//! # Page Elements
//!
//! Pre-positioned content handed over by a layout step: text runs and image
//! placements. Coordinates are in points with the origin at the top-left
//! corner of the page and y growing downwards; elements flip them into PDF
//! user space when they write their operators.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::color::{Color, ColorMode};
use crate::error::{FolioError, Result};
use crate::font::{FontRegistry, FontStyle};
use crate::pdf::content::ContentStream;
use crate::pdf::image::XObjectImage;

/// Horizontal shear applied to a regular face standing in for an italic.
pub const SYNTHETIC_ITALIC_SKEW: f64 = 0.25;

/// Something an element needs registered before it can be drawn.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Font { family: String, style: FontStyle },
    Image(String),
}

/// What elements can see while writing their operators.
pub struct RenderContext<'a> {
    pub page_height: f64,
    pub color_mode: ColorMode,
    pub font_fallback: bool,
    pub fonts: &'a FontRegistry,
    pub images: &'a IndexMap<String, XObjectImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Element {
    Text(TextRun),
    Image(ImagePlacement),
}

impl Element {
    pub fn resource_keys(&self) -> Vec<ResourceKey> {
        match self {
            Element::Text(run) => vec![ResourceKey::Font {
                family: run.font_family.clone(),
                style: run.font_style,
            }],
            Element::Image(image) => vec![ResourceKey::Image(image.src.clone())],
        }
    }

    /// Characters the element draws, for font subsetting.
    pub fn text(&self) -> Option<&str> {
        match self {
            Element::Text(run) => Some(&run.content),
            Element::Image(_) => None,
        }
    }

    pub fn write_to(&self, content: &mut ContentStream, ctx: &RenderContext) -> Result<()> {
        match self {
            Element::Text(run) => run.write_to(content, ctx),
            Element::Image(image) => image.write_to(content, ctx),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextDecoration {
    #[default]
    None,
    Underline,
    LineThrough,
}

/// A single line of text in one font, already positioned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextRun {
    pub content: String,
    pub x: f64,
    /// Baseline, measured from the top of the page.
    pub y: f64,
    pub font_family: String,
    pub font_style: FontStyle,
    pub font_size: f64,
    pub color: Color,
    pub letter_spacing: f64,
    pub word_spacing: f64,
    /// Clockwise, in degrees, about the start of the baseline.
    pub rotate: f64,
    pub decoration: TextDecoration,
    /// Measured run width. Needed by decorations for standard fonts, which
    /// carry no metrics.
    pub width: Option<f64>,
}

impl Default for TextRun {
    fn default() -> Self {
        Self {
            content: String::new(),
            x: 0.0,
            y: 0.0,
            font_family: "Helvetica".to_string(),
            font_style: FontStyle::Normal,
            font_size: 12.0,
            color: Color::BLACK,
            letter_spacing: 0.0,
            word_spacing: 0.0,
            rotate: 0.0,
            decoration: TextDecoration::None,
            width: None,
        }
    }
}

impl TextRun {
    pub fn new(content: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            content: content.into(),
            x,
            y,
            ..Self::default()
        }
    }

    pub fn font(mut self, family: &str, style: FontStyle, size: f64) -> Self {
        self.font_family = family.to_string();
        self.font_style = style;
        self.font_size = size;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn decoration(mut self, decoration: TextDecoration) -> Self {
        self.decoration = decoration;
        self
    }

    fn write_to(&self, content: &mut ContentStream, ctx: &RenderContext) -> Result<()> {
        let resolved = ctx.fonts.resolve(&self.font_family, self.font_style, ctx.font_fallback)?;
        let font = ctx
            .fonts
            .get(resolved.id)
            .ok_or_else(|| FolioError::MissingResource(format!("font object {}", resolved.id.number())))?;
        let skew = if resolved.synthetic_italic { SYNTHETIC_ITALIC_SKEW } else { 0.0 };

        content.save_state();
        content.transform(place(self.x, ctx.page_height - self.y, self.rotate));
        content.begin_text();
        content.set_font(&font.resource_name(), self.font_size);
        if self.letter_spacing != 0.0 {
            content.set_char_spacing(self.letter_spacing);
        }
        if self.word_spacing != 0.0 {
            content.set_word_spacing(self.word_spacing);
        }
        content.set_text_matrix([1.0, 0.0, skew, 1.0, 0.0, 0.0]);
        content.set_fill_color(&self.color, ctx.color_mode);
        content.show_text(&font.encode_text(&self.content));
        content.end_text();

        let offset = match self.decoration {
            TextDecoration::None => None,
            TextDecoration::Underline => Some(-0.1 * self.font_size),
            TextDecoration::LineThrough => Some(0.3 * self.font_size),
        };
        let width = self
            .width
            .or_else(|| font.measure(&self.content, self.font_size, self.letter_spacing));
        if let (Some(dy), Some(width)) = (offset, width) {
            content.set_stroke_color(&self.color, ctx.color_mode);
            content.set_line_width(self.font_size * 0.05);
            content.move_to(0.0, dy);
            content.line_to(width, dy);
            content.stroke();
        }
        content.restore_state();
        Ok(())
    }
}

/// An image drawn into a box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePlacement {
    /// Key the image was registered under; for JSON input, its source.
    pub src: String,
    pub x: f64,
    /// Top edge, measured from the top of the page.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Clockwise, in degrees, about the center of the box.
    #[serde(default)]
    pub rotate: f64,
}

impl ImagePlacement {
    pub fn new(src: impl Into<String>, x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            src: src.into(),
            x,
            y,
            width,
            height,
            rotate: 0.0,
        }
    }

    fn write_to(&self, content: &mut ContentStream, ctx: &RenderContext) -> Result<()> {
        let image = ctx
            .images
            .get(&self.src)
            .ok_or_else(|| FolioError::MissingResource(format!("image '{}'", self.src)))?;

        content.save_state();
        if self.rotate == 0.0 {
            let bottom = ctx.page_height - (self.y + self.height);
            content.transform([self.width, 0.0, 0.0, self.height, self.x, bottom]);
        } else {
            let cx = self.x + self.width / 2.0;
            let cy = ctx.page_height - (self.y + self.height / 2.0);
            content.transform(place(cx, cy, self.rotate));
            content.transform([
                self.width,
                0.0,
                0.0,
                self.height,
                -self.width / 2.0,
                -self.height / 2.0,
            ]);
        }
        content.draw_xobject(&image.resource_name());
        content.restore_state();
        Ok(())
    }
}

/// Translate to `(x, y)` in PDF space, then rotate clockwise by `degrees`.
fn place(x: f64, y: f64, degrees: f64) -> [f64; 6] {
    let theta = -degrees.to_radians();
    let (sin, cos) = (snap(theta.sin()), snap(theta.cos()));
    [cos, sin, -sin, cos, x, y]
}

/// Drop floating-point noise so right angles print as exact integers.
fn snap(v: f64) -> f64 {
    let rounded = (v * 1e9).round() / 1e9;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
