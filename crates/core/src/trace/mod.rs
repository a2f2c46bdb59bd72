pub mod cpuprofile;
pub mod heapprofile;

use serde::Deserialize;
use thiserror::Error;

pub use cpuprofile::CpuProfile;
pub use heapprofile::HeapProfile;

/// A single stack entry as it appears on the wire.
///
/// Line and column numbers are 0-based; engine-internal frames carry a
/// negative line number.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    #[serde(default)]
    pub function_name: String,
    #[serde(default)]
    pub script_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_position")]
    pub line_number: i64,
    #[serde(default = "default_position")]
    pub column_number: i64,
}

fn default_position() -> i64 {
    -1
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cpu profile: {0}")]
    Cpu(#[from] cpuprofile::CpuProfileParseError),
    #[error("heap profile: {0}")]
    Heap(#[from] heapprofile::HeapProfileParseError),
    #[error("unable to detect trace format")]
    UnknownFormat,
}

/// A successfully decoded raw trace of either kind.
#[derive(Debug, Clone)]
pub enum Trace {
    Cpu(CpuProfile),
    Heap(HeapProfile),
}

/// Auto-detect the trace kind and decode it.
///
/// Detection inspects top-level keys: heap allocation trees carry `head`,
/// CPU sampling profiles carry `nodes` + `startTime` + `endTime`.
pub fn parse_auto(data: &[u8]) -> Result<Trace, ParseError> {
    let value: serde_json::Value = match serde_json::from_slice(data) {
        Ok(v) => v,
        Err(_) => return Err(ParseError::UnknownFormat),
    };

    let Some(obj) = value.as_object() else {
        return Err(ParseError::UnknownFormat);
    };

    if obj.contains_key("head") {
        return Ok(Trace::Heap(heapprofile::parse_heapprofile(data)?));
    }

    if obj.contains_key("nodes") && obj.contains_key("startTime") && obj.contains_key("endTime") {
        return Ok(Trace::Cpu(cpuprofile::parse_cpuprofile(data)?));
    }

    Err(ParseError::UnknownFormat)
}
