use crate::config::Config;
use crate::report::print_scan_errors;
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use heartgen_core::{GenerationReport, Generator, GeneratorOptions, WriteOutcome};
use heartgen_frontend_cpp::CppFrontEnd;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct GenerateArgs {
    /// Root directory to scan
    pub root: PathBuf,

    /// heart-core directory (adds the heart-core, heart-stl and heart-debug include dirs)
    #[arg(long)]
    pub heart: Option<PathBuf>,

    /// Additional include directory
    #[arg(short = 'I', long = "include")]
    pub include: Vec<PathBuf>,

    /// Output path relative to the root (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the generated file instead of writing it
    #[arg(long)]
    pub stdout: bool,

    /// Scan files one at a time
    #[arg(long)]
    pub sequential: bool,

    /// Debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Include directories of a heart checkout, given its heart-core directory
pub fn heart_include_dirs(heart_core: &Path) -> Vec<PathBuf> {
    vec![
        heart_core.join("include"),
        heart_core.join("../heart-stl/include"),
        heart_core.join("../heart-debug/include"),
    ]
}

/// Merge CLI flags over the config file
pub fn build_options(args: &GenerateArgs, config: &Config) -> GeneratorOptions {
    let root = &args.root;

    let mut include_dirs = Vec::new();
    if let Some(heart) = args.heart.clone().or_else(|| config.heart_dir(root)) {
        include_dirs.extend(heart_include_dirs(&heart));
    }
    include_dirs.extend(config.include_dirs(root));
    include_dirs.extend(args.include.iter().cloned());

    let mut options = GeneratorOptions::new(root.clone())
        .with_include_dirs(include_dirs)
        .with_parallel(!args.sequential);
    options.extensions = config.extensions.clone();

    if let Some(output) = args.output.clone().or_else(|| config.output.as_ref().map(PathBuf::from)) {
        options = options.with_output(output);
    }

    options
}

/// Returns `false` when any scan error was reported
pub fn generate(args: GenerateArgs) -> Result<bool> {
    if !args.root.is_dir() {
        return Err(anyhow!("Root directory does not exist: {:?}", args.root));
    }

    let config = Config::load(&args.root)?;
    let options = build_options(&args, &config);
    let generator = Generator::new(options, CppFrontEnd::new());

    if args.stdout {
        let report = generator.render()?;
        print!("{}", report.rendered);
        print_scan_errors(&report.errors);
        return Ok(report.succeeded());
    }

    println!("{}", "Invoking heartgen...".bright_blue().bold());
    let report = generator.run()?;

    print_scan_errors(&report.errors);
    print_outcome(&report, &args.root);

    Ok(report.succeeded())
}

fn print_outcome(report: &GenerationReport, root: &Path) {
    let output = report.output_path.strip_prefix(root).unwrap_or(&report.output_path);

    match report.outcome {
        Some(WriteOutcome::Written) => {
            println!("  {} {} written", "✓".green(), output.display());
        }
        Some(WriteOutcome::Unchanged) => {
            println!(
                "  {} {} - {}",
                "✓".green(),
                output.display(),
                "skipped (nothing changed)".dimmed()
            );
        }
        None => {}
    }

    println!();
    if report.succeeded() {
        println!(
            "{} Reflected {} types from {} files",
            "✅".green(),
            report.type_count(),
            report.files_scanned
        );
    } else {
        println!(
            "{} Reflected {} types from {} files, {} errors",
            "⚠️".yellow(),
            report.type_count(),
            report.files_scanned,
            report.errors.len()
        );
    }
}
