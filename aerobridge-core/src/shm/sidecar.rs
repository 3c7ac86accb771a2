//! The sidecar descriptor file.
//!
//! `AeroflyBridge_offsets.json` is written once at init and is the source of
//! truth external consumers read before mapping the region: every variable's
//! byte span, storage class, and message id, keyed to the layout version.

use crate::registry::{registry, Access, PrimaryFlag, StorageClass, Unit};
use crate::snapshot::{self, LAYOUT_VERSION};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name of the descriptor, written next to the module.
pub const SIDECAR_NAME: &str = "AeroflyBridge_offsets.json";

/// Schema identifier of the descriptor document.
pub const OFFSETS_SCHEMA: &str = "aerofly-bridge-offsets";
/// Schema version of the descriptor document.
pub const OFFSETS_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize)]
pub struct OffsetsDocument {
    pub schema: &'static str,
    pub schema_version: u32,
    pub layout_version: u32,
    pub array_base_offset: usize,
    pub stride_bytes: usize,
    pub count: usize,
    pub variables: Vec<OffsetEntry>,
}

#[derive(Debug, Serialize)]
pub struct OffsetEntry {
    pub name: &'static str,
    pub group: &'static str,
    pub logical_index: usize,
    pub data_type: String,
    pub storage: StorageClass,
    pub byte_offset: usize,
    pub byte_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub component_order: Option<Vec<&'static str>>,
    pub unit: Unit,
    pub access: Access,
    pub flag: PrimaryFlag,
    pub is_event: bool,
    pub is_toggle: bool,
    pub is_active_flag: bool,
    pub is_value: bool,
    pub message_id: u64,
}

/// Build the descriptor document from the registry.
pub fn offsets_document() -> OffsetsDocument {
    let reg = registry();
    let variables = reg
        .export()
        .into_iter()
        .map(|d| {
            let component_order = match d.data_type {
                crate::codec::DataType::Vector2d => Some(vec!["x", "y"]),
                crate::codec::DataType::Vector3d => Some(vec!["x", "y", "z"]),
                crate::codec::DataType::Vector4d => Some(vec!["x", "y", "z", "w"]),
                _ => None,
            };
            OffsetEntry {
                name: d.name,
                group: d.group(),
                logical_index: d.logical_index,
                data_type: d.data_type.to_string(),
                storage: d.storage,
                byte_offset: d.byte_offset,
                byte_length: d.byte_length,
                component_order,
                unit: d.unit,
                access: d.access,
                flag: d.flag,
                is_event: d.flag == PrimaryFlag::Event,
                is_toggle: d.flag == PrimaryFlag::Toggle,
                is_active_flag: d.flag == PrimaryFlag::Active,
                is_value: d.flag == PrimaryFlag::Value,
                message_id: d.hash,
            }
        })
        .collect();

    OffsetsDocument {
        schema: OFFSETS_SCHEMA,
        schema_version: OFFSETS_SCHEMA_VERSION,
        layout_version: LAYOUT_VERSION,
        array_base_offset: snapshot::scalar_array_offset(),
        stride_bytes: snapshot::SCALAR_STRIDE,
        count: reg.len(),
        variables,
    }
}

/// Write the descriptor into `dir`, returning the file path.
pub fn write_sidecar(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(SIDECAR_NAME);
    let doc = offsets_document();
    let json = serde_json::to_string_pretty(&doc).context("failed to serialize offsets")?;
    std::fs::write(&path, json)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!(path = %path.display(), count = doc.count, "offsets descriptor written");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::VAR_COUNT;

    #[test]
    fn test_document_header() {
        let doc = offsets_document();
        assert_eq!(doc.schema, "aerofly-bridge-offsets");
        assert_eq!(doc.layout_version, LAYOUT_VERSION);
        assert_eq!(doc.stride_bytes, 8);
        assert_eq!(doc.count, VAR_COUNT);
        assert_eq!(doc.variables.len(), VAR_COUNT);
        assert_eq!(doc.array_base_offset, snapshot::scalar_array_offset());
    }

    #[test]
    fn test_entries_are_index_ordered() {
        let doc = offsets_document();
        for (i, entry) in doc.variables.iter().enumerate() {
            assert_eq!(entry.logical_index, i);
        }
    }

    #[test]
    fn test_sidecar_round_trips_as_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_sidecar(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), SIDECAR_NAME);

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["schema"], "aerofly-bridge-offsets");
        assert_eq!(parsed["variables"].as_array().unwrap().len(), VAR_COUNT);

        let altitude = parsed["variables"]
            .as_array()
            .unwrap()
            .iter()
            .find(|v| v["name"] == "Aircraft.Altitude")
            .unwrap();
        assert_eq!(altitude["data_type"], "double");
        assert_eq!(altitude["storage"], "scalar_array");
        assert_eq!(altitude["unit"], "meter");
    }

    #[test]
    fn test_vector_entries_carry_component_order() {
        let doc = offsets_document();
        let position = doc
            .variables
            .iter()
            .find(|v| v.name == "Aircraft.Position")
            .unwrap();
        assert_eq!(position.component_order.as_deref(), Some(&["x", "y", "z"][..]));
        assert_eq!(position.byte_length, 24);

        let altitude = doc
            .variables
            .iter()
            .find(|v| v.name == "Aircraft.Altitude")
            .unwrap();
        assert!(altitude.component_order.is_none());
    }

    #[test]
    fn test_message_only_entries_have_empty_span() {
        let doc = offsets_document();
        let swap = doc
            .variables
            .iter()
            .find(|v| v.name == "Navigation.NAV1FrequencySwap")
            .unwrap();
        assert_eq!(swap.storage, StorageClass::MessageOnly);
        assert_eq!(swap.byte_length, 0);
        assert!(swap.is_event);
    }
}
