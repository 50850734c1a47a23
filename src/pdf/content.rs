//! Page content-stream operators.
//!
//! ```text
//! q                     % save graphics state
//! 1 0 0 1 72 700 cm     % position
//! BT
//!  /R5 12 Tf            % font + size
//!  (Hi) Tj
//! ET
//! Q                     % restore
//! ```

use std::fmt::Write as FmtWrite;

use super::object::format_number;
use crate::color::{Color, ColorMode};

#[derive(Debug, Clone, Default)]
pub struct ContentStream {
    ops: String,
}

impl ContentStream {
    pub fn new() -> Self {
        Self::default()
    }

    fn op(&mut self, operands: &[f64], operator: &str) {
        for value in operands {
            self.ops.push_str(&format_number(*value));
            self.ops.push(' ');
        }
        self.ops.push_str(operator);
        self.ops.push('\n');
    }

    pub fn save_state(&mut self) {
        self.ops.push_str("q\n");
    }

    pub fn restore_state(&mut self) {
        self.ops.push_str("Q\n");
    }

    /// Concatenate `[a b c d e f]` to the current transformation matrix.
    pub fn transform(&mut self, matrix: [f64; 6]) {
        self.op(&matrix, "cm");
    }

    pub fn begin_text(&mut self) {
        self.ops.push_str("BT\n");
    }

    pub fn end_text(&mut self) {
        self.ops.push_str("ET\n");
    }

    pub fn set_font(&mut self, resource_name: &str, size: f64) {
        let _ = writeln!(self.ops, "/{} {} Tf", resource_name, format_number(size));
    }

    pub fn set_leading(&mut self, leading: f64) {
        self.op(&[leading], "TL");
    }

    pub fn set_char_spacing(&mut self, spacing: f64) {
        self.op(&[spacing], "Tc");
    }

    pub fn set_word_spacing(&mut self, spacing: f64) {
        self.op(&[spacing], "Tw");
    }

    pub fn set_text_matrix(&mut self, matrix: [f64; 6]) {
        self.op(&matrix, "Tm");
    }

    /// `operand` is an already-encoded string: `(...)` or `<...>`.
    pub fn show_text(&mut self, operand: &str) {
        let _ = writeln!(self.ops, "{} Tj", operand);
    }

    pub fn set_fill_color(&mut self, color: &Color, mode: ColorMode) {
        let operator = match mode {
            ColorMode::Rgb => "rg",
            ColorMode::Cmyk => "k",
        };
        self.op(&color.rgb_or_cmyk(mode), operator);
    }

    pub fn set_stroke_color(&mut self, color: &Color, mode: ColorMode) {
        let operator = match mode {
            ColorMode::Rgb => "RG",
            ColorMode::Cmyk => "K",
        };
        self.op(&color.rgb_or_cmyk(mode), operator);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.op(&[width], "w");
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.op(&[x, y], "m");
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.op(&[x, y], "l");
    }

    pub fn stroke(&mut self) {
        self.ops.push_str("S\n");
    }

    /// Paint an XObject registered under `resource_name`.
    pub fn draw_xobject(&mut self, resource_name: &str) {
        let _ = writeln!(self.ops, "/{} Do", resource_name);
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.ops.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}
