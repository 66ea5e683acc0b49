use std::fs;
use std::path::PathBuf;

use crate::error::Result;
use crate::export::Exporter;
use crate::pipeline::BatchOutcome;

/// `packets.json` with the assembled packets, `report.json` with everything
/// left for manual review.
#[derive(Debug, Clone)]
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }
}

impl Exporter for JsonExporter {
    fn export(&self, outcome: &BatchOutcome) -> Result<()> {
        fs::create_dir_all(&self.out_dir)?;

        let packets = serde_json::to_string_pretty(&outcome.assembly.packets)?;
        fs::write(self.out_dir.join("packets.json"), packets)?;

        let report = serde_json::to_string_pretty(&outcome.report())?;
        fs::write(self.out_dir.join("report.json"), report)?;
        Ok(())
    }
}
