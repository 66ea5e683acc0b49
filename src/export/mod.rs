pub mod html_debug_export;
pub mod json_export;
pub mod text_export;

use std::collections::HashSet;
use std::path::Path;

use tracing::warn;

use crate::core::model::StudentPacket;
use crate::error::Result;
use crate::pipeline::BatchOutcome;

pub use html_debug_export::HtmlDebugExporter;
pub use json_export::JsonExporter;
pub use text_export::TextExporter;

pub trait Exporter {
    fn export(&self, outcome: &BatchOutcome) -> Result<()>;
}

/// Output file stems for `packets`, in order and never repeated.
///
/// A student complete in more than one input file keeps the plain
/// `{id}_{Name}` stem for the first packet; later ones get the stem of the
/// file their first page came from appended.
pub fn packet_file_stems(packets: &[StudentPacket]) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    packets
        .iter()
        .map(|packet| {
            let file_name = packet.output_file_name();
            let base = file_name.trim_end_matches(".pdf");
            let mut stem = base.to_string();
            if used.contains(&stem) {
                let source = packet
                    .pages
                    .first()
                    .map(|page| source_stem(&page.file_name))
                    .unwrap_or_default();
                stem = format!("{base}_{source}");
                let mut counter = 2;
                while used.contains(&stem) {
                    stem = format!("{base}_{source}_{counter}");
                    counter += 1;
                }
                warn!(
                    student = %packet.student_id,
                    file = %stem,
                    "student has more than one packet, renamed"
                );
            }
            used.insert(stem.clone());
            stem
        })
        .collect()
}

fn source_stem(file_name: &str) -> String {
    Path::new(file_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect()
}
