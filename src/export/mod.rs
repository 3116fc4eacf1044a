//! Artifact rendering
//!
//! Each exporter turns a [`LayoutDocument`] into the bytes of one artifact.
//! Rendering happens fully in memory so the generator can write the set
//! all-or-nothing.

pub mod gds;
pub mod metadata;
pub mod plot;
pub mod svg;

use std::fmt;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::layout::LayoutDocument;

pub use gds::SkeletonSummary;
pub use metadata::Metadata;

/// The four artifacts of a generation run, in write order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Layout,
    Plot,
    Metadata,
    Gds,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 4] = [
        ArtifactKind::Layout,
        ArtifactKind::Plot,
        ArtifactKind::Metadata,
        ArtifactKind::Gds,
    ];

    /// File name inside the output directory.
    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Layout => "layout.svg",
            ArtifactKind::Plot => "phase_fidelity.svg",
            ArtifactKind::Metadata => "metadata.json",
            ArtifactKind::Gds => "skeleton.gds",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArtifactKind::Layout => "SVG layout",
            ArtifactKind::Plot => "phase-fidelity plot",
            ArtifactKind::Metadata => "JSON metadata",
            ArtifactKind::Gds => "GDS skeleton",
        };
        f.write_str(name)
    }
}

/// An artifact rendered in memory, not yet on disk.
#[derive(Debug, Clone)]
pub struct RenderedArtifact {
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

/// Render all four artifacts in [`ArtifactKind::ALL`] order.
pub fn render_all(
    document: &LayoutDocument,
    config: &GeneratorConfig,
    generated_at: DateTime<Utc>,
) -> Result<Vec<RenderedArtifact>> {
    let mut rendered = Vec::with_capacity(ArtifactKind::ALL.len());
    for kind in ArtifactKind::ALL {
        let bytes = match kind {
            ArtifactKind::Layout => svg::render(document).into_bytes(),
            ArtifactKind::Plot => plot::render(document)?.into_bytes(),
            ArtifactKind::Metadata => Metadata::from_document(document, generated_at).to_json()?,
            ArtifactKind::Gds => {
                gds::render(document, config.gds_full_geometry(), generated_at)?
            }
        };
        debug!("Rendered {} ({} bytes)", kind, bytes.len());
        rendered.push(RenderedArtifact { kind, bytes });
    }
    Ok(rendered)
}

/// Fixed-precision number for SVG output. Never prints `-0.000`.
pub(crate) fn num(value: f64) -> String {
    let text = format!("{:.3}", value);
    if text.trim_start_matches('-').chars().all(|c| c == '0' || c == '.') {
        "0.000".to_string()
    } else {
        text
    }
}

/// Escape text content for XML.
pub(crate) fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_names_are_distinct() {
        let mut names: Vec<_> = ArtifactKind::ALL.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 4);
    }

    #[test]
    fn test_num_normalises_negative_zero() {
        assert_eq!(num(-0.0), "0.000");
        assert_eq!(num(-0.0001), "0.000");
        assert_eq!(num(-52.5), "-52.500");
        assert_eq!(num(1.23456), "1.235");
    }

    #[test]
    fn test_xml_escape() {
        assert_eq!(xml_escape("a<b & \"c\">"), "a&lt;b &amp; &quot;c&quot;&gt;");
    }

    #[test]
    fn test_render_all_order() {
        let config = GeneratorConfig::new(3, "unused").unwrap();
        let doc = LayoutDocument::build(&config);
        let rendered = render_all(&doc, &config, Utc::now()).unwrap();
        let kinds: Vec<_> = rendered.iter().map(|r| r.kind).collect();
        assert_eq!(kinds, ArtifactKind::ALL.to_vec());
        assert!(rendered.iter().all(|r| !r.bytes.is_empty()));
    }
}
