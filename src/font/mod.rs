//! # Font Engine
//!
//! Reads TrueType, OpenType and WOFF binaries, derives the metrics a PDF
//! font descriptor needs, and writes sfnt binaries back out, whole or
//! subset, for embedding as `/FontFile2`.
//!
//! The pipeline is `sfnt` (container + WOFF inflate) → `metrics` + `cmap`
//! (table decode) → `subset` (optional) → `encode` (checksummed sfnt).

pub mod cmap;
pub mod encode;
pub mod metrics;
pub mod reader;
pub mod registry;
pub mod sfnt;
pub mod standard;
pub mod subset;

#[cfg(test)]
pub(crate) mod test_font;

use std::collections::BTreeSet;

pub use cmap::Cmap;
pub use metrics::{FontMetrics, GlyphMetrics};
pub use registry::{FontKey, FontRegistry, ResolvedFont};
pub use sfnt::{Flavor, Sfnt, Signature};
pub use standard::{FontStyle, StandardFont};

use crate::error::Result;

/// A font binary together with its decoded tables and metrics.
#[derive(Debug, Clone)]
pub struct ParsedFont {
    source: Vec<u8>,
    sfnt: Sfnt,
    metrics: FontMetrics,
}

impl ParsedFont {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let sfnt = Sfnt::from_bytes(data)?;
        let metrics = FontMetrics::from_sfnt(&sfnt)?;
        Ok(Self {
            source: data.to_vec(),
            sfnt,
            metrics,
        })
    }

    pub fn metrics(&self) -> &FontMetrics {
        &self.metrics
    }

    pub fn sfnt(&self) -> &Sfnt {
        &self.sfnt
    }

    /// Bytes to embed for the whole font: the original buffer for plain
    /// sfnt/OTTO input, a re-encoded sfnt for WOFF input.
    pub fn embeddable(&self) -> Vec<u8> {
        match self.sfnt.signature() {
            Signature::Woff => self.sfnt.encode(),
            Signature::TrueType | Signature::OpenType => self.source.clone(),
        }
    }

    /// A reduced font covering `chars`, re-parsed so its metrics and cmap
    /// describe the renumbered glyphs.
    pub fn subset(&self, chars: &BTreeSet<char>) -> Result<ParsedFont> {
        let reduced = subset::subset(&self.sfnt, &self.metrics.cmap, chars)?;
        ParsedFont::parse(&reduced.sfnt.encode())
    }
}
