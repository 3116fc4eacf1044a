//! JSON metadata document
//!
//! Field order is fixed by the struct, so two runs with the same config
//! differ only in `generated_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::layout::{
    Channel, LayoutDocument, MIN_ENERGY_RECOVERY, PHASE_FIDELITY_MAX, PHASE_FIDELITY_MIN,
};

/// Crosstalk bound between adjacent WDM channels, in dB.
pub const WDM_CROSSTALK_BOUND_DB: f64 = -25.0;

/// Name and version of the tool that wrote the document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratorInfo {
    pub name: String,
    pub version: String,
}

impl Default for GeneratorInfo {
    fn default() -> Self {
        GeneratorInfo {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Contents of `metadata.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub channel_count: usize,
    pub channels: Vec<Channel>,
    pub generated_at: DateTime<Utc>,
    pub phase_fidelity_range: [f64; 2],
    pub min_energy_recovery: f64,
    #[serde(rename = "wdm_crosstalk_bound_dB")]
    pub wdm_crosstalk_bound_db: f64,
    pub wdm_enabled: bool,
    pub ring_radius_um: f64,
    pub channel_spacing_um: f64,
    pub polygon_count: usize,
    pub generator: GeneratorInfo,
    pub notes: String,
}

impl Metadata {
    /// Describe `document`, stamped with `generated_at`.
    pub fn from_document(document: &LayoutDocument, generated_at: DateTime<Utc>) -> Self {
        let params = document.params();
        Metadata {
            channel_count: document.channel_count(),
            channels: document.channels().to_vec(),
            generated_at,
            phase_fidelity_range: [PHASE_FIDELITY_MIN, PHASE_FIDELITY_MAX],
            min_energy_recovery: MIN_ENERGY_RECOVERY,
            wdm_crosstalk_bound_db: WDM_CROSSTALK_BOUND_DB,
            wdm_enabled: true,
            ring_radius_um: params.ring_radius,
            channel_spacing_um: params.channel_spacing,
            polygon_count: document.polygon_count(),
            generator: GeneratorInfo::default(),
            notes: format!(
                "{}-channel WDM interface layout; GDS skeleton is a minimal placeholder",
                document.channel_count()
            ),
        }
    }

    /// Pretty-printed JSON with a trailing newline.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        Ok(bytes)
    }

    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LayoutParams;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_required_fields() {
        let doc = LayoutDocument::from_params(8, LayoutParams::default());
        let bytes = Metadata::from_document(&doc, stamp()).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(value["channel_count"], 8);
        let channels = value["channels"].as_array().unwrap();
        assert_eq!(channels.len(), 8);
        for (i, channel) in channels.iter().enumerate() {
            assert_eq!(channel["index"], i);
            assert!(channel["x"].is_f64());
            assert!(channel["y"].is_f64());
            assert!(channel["phase_fidelity"].is_f64());
        }
        assert_eq!(value["generated_at"], "2026-10-16T12:00:00Z");
        assert_eq!(value["wdm_crosstalk_bound_dB"], -25.0);
    }

    #[test]
    fn test_round_trip() {
        let doc = LayoutDocument::from_params(3, LayoutParams::default());
        let meta = Metadata::from_document(&doc, stamp());
        let parsed = Metadata::from_json(&meta.to_json().unwrap()).unwrap();
        assert_eq!(parsed.channel_count, 3);
        assert_eq!(parsed.generated_at, meta.generated_at);
        assert_eq!(parsed.generator, meta.generator);
        for (a, b) in parsed.channels.iter().zip(&meta.channels) {
            assert_eq!(a.label, b.label);
            approx::assert_relative_eq!(a.phase_fidelity, b.phase_fidelity, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_key_order_is_stable() {
        let doc = LayoutDocument::from_params(2, LayoutParams::default());
        let text = String::from_utf8(Metadata::from_document(&doc, stamp()).to_json().unwrap())
            .unwrap();
        let count = text.find("\"channel_count\"").unwrap();
        let channels = text.find("\"channels\"").unwrap();
        let generated = text.find("\"generated_at\"").unwrap();
        assert!(count < channels && channels < generated);
    }
}
