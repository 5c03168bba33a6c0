use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::common::ids::JobId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscodeJob {
    pub job_id: JobId,
    pub source_path: PathBuf,
}
