use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::RuleSet;
use crate::core::model::{
    AmbiguousBoundary, DuplicateSegment, IncompletePacket, Page, Segment, UnclassifiedPage,
};
use crate::core::{PageClassifier, StudentIdentifier};
use crate::error::{PacketError, Result};
use crate::export::html_debug_export::HtmlDebugExporter;
use crate::export::json_export::JsonExporter;
use crate::export::text_export::TextExporter;
use crate::export::Exporter;
use crate::parser::{normalize_text, ExtractedFile, PageSource};
use crate::segment::{Assembly, BoundaryResolver, LinearBoundaryResolver, PacketAssembler, Resolution};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub inputs: Vec<PathBuf>,
    pub output: PathBuf,
    /// Assemble packets across every input instead of per file.
    pub merge_files: bool,
    pub rules: Option<PathBuf>,
}

impl PipelineConfig {
    pub fn new(inputs: Vec<PathBuf>, output: PathBuf) -> Self {
        Self {
            inputs,
            output,
            merge_files: false,
            rules: None,
        }
    }

    pub fn with_merge_files(mut self, merge_files: bool) -> Self {
        self.merge_files = merge_files;
        self
    }

    pub fn with_rules(mut self, rules: Option<PathBuf>) -> Self {
        self.rules = rules;
        self
    }

    pub fn load_rules(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(path) => RuleSet::from_json_file(path),
            None => Ok(RuleSet::default()),
        }
    }
}

/// The scanning engine, built once and shared read-only across files.
#[derive(Debug)]
pub struct Pipeline {
    classifier: PageClassifier,
    identifier: StudentIdentifier,
    resolver: LinearBoundaryResolver,
    assembler: PacketAssembler,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileOutcome {
    pub file_name: String,
    pub pages: Vec<Page>,
    pub resolution: Resolution,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
    pub files: Vec<FileOutcome>,
    pub failed: Vec<FailedFile>,
    pub assembly: Assembly,
}

/// Everything a reviewer has to look at by hand.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub packets: usize,
    pub incomplete: Vec<IncompletePacket>,
    pub unclassified: Vec<UnclassifiedPage>,
    pub ambiguous: Vec<AmbiguousBoundary>,
    pub duplicates: Vec<DuplicateSegment>,
    pub failed: Vec<FailedFile>,
}

impl BatchOutcome {
    pub fn report(&self) -> BatchReport {
        BatchReport {
            packets: self.assembly.packets.len(),
            incomplete: self.assembly.incomplete.clone(),
            unclassified: self
                .files
                .iter()
                .flat_map(|file| file.resolution.unclassified.iter().cloned())
                .collect(),
            ambiguous: self
                .files
                .iter()
                .flat_map(|file| file.resolution.ambiguous.iter().cloned())
                .collect(),
            duplicates: self.assembly.duplicates.clone(),
            failed: self.failed.clone(),
        }
    }

    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.files
            .iter()
            .flat_map(|file| file.resolution.segments.iter())
    }
}

impl Pipeline {
    pub fn new(rules: &RuleSet) -> Result<Self> {
        Ok(Self {
            classifier: PageClassifier::from_rules(rules)?,
            identifier: StudentIdentifier::from_rules(rules)?,
            resolver: LinearBoundaryResolver::new(),
            assembler: PacketAssembler::new(),
        })
    }

    pub fn analyze_page(&self, index: usize, raw_text: &str) -> Page {
        let text = normalize_text(raw_text);
        let classification = self.classifier.classify(&text);
        let identity = self.identifier.identify(&text);
        Page::new(index, raw_text.to_string(), text, classification, identity)
    }

    pub fn analyze_pages(&self, file: &ExtractedFile) -> Result<Vec<Page>> {
        if file.pages.is_empty() {
            return Err(PacketError::CorruptInput {
                file: file.file_name.clone(),
                reason: "no pages".to_string(),
            });
        }
        let pages = file
            .pages
            .iter()
            .enumerate()
            .map(|(index, raw)| self.analyze_page(index, raw))
            .collect::<Vec<_>>();
        if pages.iter().all(Page::is_blank) {
            return Err(PacketError::CorruptInput {
                file: file.file_name.clone(),
                reason: "every page is blank after normalization".to_string(),
            });
        }
        Ok(pages)
    }

    pub fn process_file(&self, file: &ExtractedFile) -> Result<FileOutcome> {
        let pages = self.analyze_pages(file)?;
        let resolution = self.resolver.resolve(&file.file_name, &pages);
        info!(
            file = %file.file_name,
            pages = pages.len(),
            segments = resolution.segments.len(),
            unclassified = resolution.unclassified.len(),
            ambiguous = resolution.ambiguous.len(),
            "file segmented"
        );
        Ok(FileOutcome {
            file_name: file.file_name.clone(),
            pages,
            resolution,
        })
    }

    pub fn assemble(&self, segments: &[Segment]) -> Assembly {
        self.assembler.assemble(segments)
    }

    /// Files are scanned in parallel; results keep input order.
    pub fn process_batch(&self, files: &[ExtractedFile], merge_files: bool) -> BatchOutcome {
        let results = files
            .par_iter()
            .map(|file| (file.file_name.clone(), self.process_file(file)))
            .collect::<Vec<_>>();

        let mut outcome = BatchOutcome::default();
        for (file_name, result) in results {
            match result {
                Ok(file) => {
                    if !merge_files {
                        outcome
                            .assembly
                            .extend(self.assemble(&file.resolution.segments));
                    }
                    outcome.files.push(file);
                }
                Err(error) => {
                    warn!(file = %file_name, %error, "file skipped");
                    outcome.failed.push(FailedFile {
                        file: file_name,
                        error: error.to_string(),
                    });
                }
            }
        }

        if merge_files {
            let segments = outcome.segments().cloned().collect::<Vec<_>>();
            outcome.assembly = self.assemble(&segments);
        }
        outcome
    }
}

pub fn build_batch(config: &PipelineConfig) -> Result<BatchOutcome> {
    let rules = config.load_rules()?;
    let pipeline = Pipeline::new(&rules)?;

    let mut files = Vec::with_capacity(config.inputs.len());
    let mut failed = Vec::new();
    for input in &config.inputs {
        match PageSource::new(input.clone()).load() {
            Ok(file) => files.push(file),
            Err(error) => {
                warn!(file = %input.display(), %error, "cannot load input");
                failed.push(FailedFile {
                    file: input.display().to_string(),
                    error: error.to_string(),
                });
            }
        }
    }

    let mut outcome = pipeline.process_batch(&files, config.merge_files);
    failed.append(&mut outcome.failed);
    outcome.failed = failed;
    info!(
        files = outcome.files.len(),
        failed = outcome.failed.len(),
        packets = outcome.assembly.packets.len(),
        incomplete = outcome.assembly.incomplete.len(),
        "batch finished"
    );
    Ok(outcome)
}

pub fn export_batch(outcome: &BatchOutcome, output: &Path) -> Result<()> {
    let json_exporter = JsonExporter::new(output.to_path_buf());
    json_exporter.export(outcome)?;

    let text_exporter = TextExporter::new(output.to_path_buf());
    text_exporter.export(outcome)?;

    let html_exporter = HtmlDebugExporter::new(output.to_path_buf());
    html_exporter.export(outcome)?;

    Ok(())
}
