use serde::{Deserialize, Serialize};

/// Run metadata embedded in every indexed record under `timdex_provenance`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimdexProvenance {
    pub source: String,
    /// Run date as `YYYY-MM-DD`.
    pub run_date: String,
    pub run_id: String,
    pub run_record_offset: u64,
}
