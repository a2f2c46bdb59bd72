use serde::Deserialize;
use thiserror::Error;

use super::CallFrame;

#[derive(Debug, Error)]
pub enum CpuProfileParseError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Per-line hit counts attached to a profile node.
///
/// `line` is 1-based on the wire. An explicit `end_line` (rare, emitted by
/// range-granular profilers) marks the exclusive end of the annotated range.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionTick {
    pub line: i64,
    pub ticks: u64,
    #[serde(default)]
    pub end_line: Option<i64>,
}

/// One raw call-tree node of a CPU sampling profile.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuProfileNode {
    pub id: u64,
    pub call_frame: CallFrame,
    #[serde(default)]
    pub children: Vec<u64>,
    #[serde(default)]
    pub position_ticks: Vec<PositionTick>,
}

/// Raw V8-style CPU sampling profile (`.cpuprofile`).
///
/// `samples[i]` is the node observed during interval `i`; `timeDeltas[i]`
/// is the elapsed time between samples `i-1` and `i` (the first delta is
/// warm-up before the first sample). Node ids need not be dense or sorted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuProfile {
    #[serde(default)]
    pub nodes: Vec<CpuProfileNode>,
    pub start_time: f64,
    pub end_time: f64,
    #[serde(default)]
    pub samples: Vec<u64>,
    #[serde(default)]
    pub time_deltas: Vec<f64>,
}

impl CpuProfile {
    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }
}

/// Decode a raw CPU sampling profile.
///
/// Only malformed JSON is fatal; absent `nodes`, `samples`, or `timeDeltas`
/// decode to empty sequences and later degrade to an empty model.
pub fn parse_cpuprofile(data: &[u8]) -> Result<CpuProfile, CpuProfileParseError> {
    Ok(serde_json::from_slice(data)?)
}
