use crate::ga::Outcome;
use crate::param::Param;
use chrono::Local;
use log::info;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;

/// Version string baked in at compile time: the crate version, plus the git
/// short sha when the build script could resolve one.
pub fn version() -> String {
    match option_env!("GAPARTITION_GIT_SHA") {
        Some(sha) => format!("{}#{}", env!("CARGO_PKG_VERSION"), sha),
        None => env!("CARGO_PKG_VERSION").to_string(),
    }
}

/// Record of one finished run: which build ran, when, with which parameters
/// and how it ended.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Report {
    pub version: String,
    pub timestamp: String,
    pub param: Param,
    pub outcome: Outcome,
}

impl Report {
    pub fn new(param: &Param, outcome: &Outcome) -> Report {
        Report {
            version: version(),
            timestamp: Local::now().format("%Y-%m-%d_%H-%M-%S").to_string(),
            param: param.clone(),
            outcome: outcome.clone(),
        }
    }

    /// Saves the report to JSON (human readable)
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn Error>> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        info!("Result saved to {}", path.as_ref().display());
        Ok(())
    }

    /// Loads a report back from JSON
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Report, Box<dyn Error>> {
        let content = std::fs::read_to_string(path)?;
        let report: Report = serde_json::from_str(&content)?;
        Ok(report)
    }
}
