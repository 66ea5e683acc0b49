use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use packetizer::export::packet_file_stems;
use packetizer::pipeline::{build_batch, export_batch, Pipeline, PipelineConfig};
use packetizer::{PageSource, RuleSet};

#[derive(Parser, Debug)]
#[command(name = "packetizer")]
#[command(version, about = "Split scanned reclassification paperwork into per-student packets", long_about = None)]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment extracted files and assemble student packets
    Process {
        /// Extracted page text: .json page lists or form-feed separated .txt
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output directory
        #[arg(short, long, default_value = "packets_output")]
        output: PathBuf,

        /// Assemble packets across all inputs instead of per file
        #[arg(long)]
        merge_files: bool,

        /// JSON rule set replacing the built-in patterns
        #[arg(long)]
        rules: Option<PathBuf>,

        /// Only print errors and the final summary
        #[arg(short, long)]
        quiet: bool,
    },

    /// Show how each page of one file is classified and placed
    Inspect {
        input: PathBuf,

        #[arg(long)]
        rules: Option<PathBuf>,
    },

    /// Print the effective rule set as JSON
    Rules {
        #[arg(long)]
        rules: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let quiet = matches!(cli.command, Commands::Process { quiet: true, .. });
    init_tracing(cli.verbose, quiet);

    match cli.command {
        Commands::Process {
            inputs,
            output,
            merge_files,
            rules,
            quiet,
        } => process(inputs, output, merge_files, rules, quiet),
        Commands::Inspect { input, rules } => inspect(input, rules),
        Commands::Rules { rules } => print_rules(rules),
    }
}

fn init_tracing(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, 0) => tracing::Level::WARN,
        (_, 0) => tracing::Level::INFO,
        (_, 1) => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn load_rules(path: Option<&PathBuf>) -> Result<RuleSet> {
    match path {
        Some(path) => RuleSet::from_json_file(path)
            .with_context(|| format!("Failed to load rules: {}", path.display())),
        None => Ok(RuleSet::default()),
    }
}

fn process(
    inputs: Vec<PathBuf>,
    output: PathBuf,
    merge_files: bool,
    rules: Option<PathBuf>,
    quiet: bool,
) -> Result<()> {
    for input in &inputs {
        if !input.is_file() {
            anyhow::bail!("Input file does not exist: {}", input.display());
        }
    }

    if !quiet {
        println!("[*] Processing {} file(s)", inputs.len());
        println!("[*] Output: {}", output.display());
    }

    let config = PipelineConfig::new(inputs, output.clone())
        .with_merge_files(merge_files)
        .with_rules(rules);
    let outcome = build_batch(&config).context("Failed to process inputs")?;

    export_batch(&outcome, &config.output)
        .with_context(|| format!("Failed to export to: {}", output.display()))?;

    let report = outcome.report();
    println!(
        "\n[*] Summary: {} packet(s), {} incomplete, {} unclassified page(s), {} to review, {} file(s) failed",
        report.packets,
        report.incomplete.len(),
        report.unclassified.len(),
        report.ambiguous.len(),
        report.failed.len()
    );
    if !quiet {
        let packets = &outcome.assembly.packets;
        for (packet, stem) in packets.iter().zip(packet_file_stems(packets)) {
            println!("  [✓] {} ({} pages)", stem, packet.page_count());
        }
        for entry in &report.incomplete {
            let missing = entry
                .missing
                .iter()
                .map(|doc| doc.title())
                .collect::<Vec<_>>()
                .join(", ");
            println!("  [!] {} {}: missing {}", entry.student_id, entry.student_name, missing);
        }
        println!("\n[✓] Done! Results saved to: {}", output.display());
    }

    if !report.failed.is_empty() {
        anyhow::bail!("{} file(s) failed to process", report.failed.len());
    }
    Ok(())
}

fn inspect(input: PathBuf, rules: Option<PathBuf>) -> Result<()> {
    let rules = load_rules(rules.as_ref())?;
    let pipeline = Pipeline::new(&rules).context("Invalid rule set")?;
    let file = PageSource::new(input.clone())
        .load()
        .with_context(|| format!("Failed to read: {}", input.display()))?;
    let outcome = pipeline
        .process_file(&file)
        .with_context(|| format!("Failed to segment: {}", input.display()))?;

    println!("File: {}", outcome.file_name);
    println!("Pages: {}", outcome.pages.len());
    println!("==============");
    for page in &outcome.pages {
        let class = page
            .document_type()
            .map(|doc| doc.title())
            .unwrap_or("unclassified");
        let placement = match outcome.resolution.placement(page.index) {
            Some((segment, placed)) => format!(
                "{} -> {} {} ({:.2})",
                placed.role.label(),
                segment.student_id,
                segment.document_type.title(),
                placed.confidence
            ),
            None => "not placed".to_string(),
        };
        println!(
            "{:>4}  [{}] {:<48} id={:<7} {}",
            page.index + 1,
            page.language,
            class,
            page.student_id().unwrap_or("-"),
            placement
        );
    }

    let segments = &outcome.resolution.segments;
    let assembly = pipeline.assemble(segments);
    println!(
        "\nSegments: {}, complete students: {}, incomplete students: {}",
        segments.len(),
        assembly.packets.len(),
        assembly.incomplete.len()
    );
    Ok(())
}

fn print_rules(rules: Option<PathBuf>) -> Result<()> {
    let rules = load_rules(rules.as_ref())?;
    // Validate the patterns the same way processing would
    Pipeline::new(&rules).context("Invalid rule set")?;
    println!("{}", rules.to_json()?);
    Ok(())
}
