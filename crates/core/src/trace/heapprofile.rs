use serde::Deserialize;
use thiserror::Error;

use super::CallFrame;

#[derive(Debug, Error)]
pub enum HeapProfileParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One node of a raw heap allocation call tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapProfileNode {
    pub call_frame: CallFrame,
    #[serde(default)]
    pub self_size: f64,
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub children: Vec<HeapProfileNode>,
}

/// A recorded allocation sample. Carried for wire compatibility; the model
/// is built from the tree alone.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapSample {
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub node_id: u64,
    #[serde(default)]
    pub ordinal: f64,
}

/// Raw V8-style sampling heap profile (`.heapprofile`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeapProfile {
    pub head: HeapProfileNode,
    #[serde(default)]
    pub samples: Vec<HeapSample>,
}

/// Decode a raw heap allocation profile. Only malformed JSON is fatal.
pub fn parse_heapprofile(data: &[u8]) -> Result<HeapProfile, HeapProfileParseError> {
    Ok(serde_json::from_slice(data)?)
}
