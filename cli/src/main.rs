//! pdf-outline CLI - heuristic PDF outline extraction

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdf_outline::batch::DocumentReport;
use pdf_outline::render::{self, JsonFormat};
use pdf_outline::{
    run_batch, BatchEvent, BatchOptions, DocumentStatus, OutlineConfig, OutlineExtractor,
    ParseOptions, PdfTextSource,
};

#[derive(Parser)]
#[command(name = "pdf-outline")]
#[command(version)]
#[command(about = "Extract titles and heading outlines from PDF files", long_about = None)]
struct Cli {
    /// Input directory of PDF files
    #[arg(value_name = "INPUT")]
    input: Option<PathBuf>,

    /// Output directory for the JSON files
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract outlines for every PDF in a directory
    Batch {
        /// Input directory
        #[arg(value_name = "DIR")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR", default_value = "output")]
        output: PathBuf,

        /// Worker threads (0 = one per core)
        #[arg(short, long, default_value = "0", env = "PDF_OUTLINE_JOBS")]
        jobs: usize,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// JSON file overriding analysis thresholds
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Fail a document on the first unreadable page
        #[arg(long)]
        strict: bool,
    },

    /// Extract the outline of a single PDF
    File {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value = "json")]
        format: OutputKind,

        /// Write compact JSON
        #[arg(long)]
        compact: bool,

        /// JSON file overriding analysis thresholds
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Show layout statistics and the score of every line
    Inspect {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// JSON file overriding analysis thresholds
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OutputKind {
    /// {"title": ..., "outline": [...]}
    Json,
    /// Indented outline
    Text,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Batch {
            input,
            output,
            jobs,
            compact,
            config,
            strict,
        }) => cmd_batch(&input, &output, jobs, compact, config.as_deref(), strict),
        Some(Commands::File {
            input,
            output,
            format,
            compact,
            config,
        }) => cmd_file(&input, output.as_deref(), format, compact, config.as_deref()),
        Some(Commands::Inspect { input, config }) => cmd_inspect(&input, config.as_deref()),
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: batch from ./input to ./output
            let input = cli.input.unwrap_or_else(|| PathBuf::from("input"));
            let output = cli.output.unwrap_or_else(|| PathBuf::from("output"));
            cmd_batch(&input, &output, 0, false, None, false)
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn load_extractor(
    config: Option<&Path>,
    strict: bool,
) -> Result<OutlineExtractor, Box<dyn std::error::Error>> {
    let config = match config {
        Some(path) => OutlineConfig::from_json_file(path)?,
        None => OutlineConfig::default(),
    };
    let options = if strict {
        ParseOptions::new().strict()
    } else {
        ParseOptions::new().lenient()
    };
    Ok(OutlineExtractor::new(config).with_options(options))
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn cmd_batch(
    input: &Path,
    output: &Path,
    jobs: usize,
    compact: bool,
    config: Option<&Path>,
    strict: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if !input.is_dir() {
        return Err(format!("input directory not found: {}", input.display()).into());
    }

    let extractor = load_extractor(config, strict)?;
    let options = BatchOptions::new(output)
        .with_jobs(jobs)
        .with_json_format(json_format(compact));
    log::debug!("Batch options: {:?}", options);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let (options_ref, extractor_ref) = (&options, &extractor);

    let summary = std::thread::scope(|scope| {
        let worker = scope.spawn(move || run_batch(input, options_ref, extractor_ref, Some(&tx)));

        for event in rx.iter() {
            match event {
                BatchEvent::Started { total } => pb.set_length(total as u64),
                BatchEvent::Finished(report) => {
                    pb.set_message(file_name(&report.input));
                    pb.inc(1);
                }
            }
        }

        worker
            .join()
            .map_err(|_| "batch worker panicked".to_string())
    })??;

    pb.finish_and_clear();

    for report in &summary.reports {
        print_report(report);
    }

    println!();
    println!(
        "{} {} written, {} skipped, {} failed in {:.2?}",
        "Done:".green().bold(),
        summary.written(),
        summary.skipped(),
        summary.failed(),
        summary.elapsed
    );
    println!("{} {}", "Output:".bold(), options.output_dir.display());

    Ok(())
}

fn print_report(report: &DocumentReport) {
    let name = file_name(&report.input);
    match &report.status {
        DocumentStatus::Written { title, headings } => println!(
            "  {} {} {} ({} headings, {:.0?})",
            "✓".green(),
            name,
            format!("\"{}\"", title).dimmed(),
            headings,
            report.elapsed
        ),
        DocumentStatus::Skipped(reason) => {
            println!("  {} {} {}", "-".yellow(), name, reason.yellow())
        }
        DocumentStatus::Failed(reason) => println!("  {} {} {}", "✗".red(), name, reason.red()),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn cmd_file(
    input: &Path,
    output: Option<&Path>,
    format: OutputKind,
    compact: bool,
    config: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = load_extractor(config, false)?;
    let source = PdfTextSource::open(input)?;
    let outline = extractor.extract(&source)?;

    let rendered = match format {
        OutputKind::Json => render::to_json(&outline, json_format(compact))?,
        OutputKind::Text => render::to_text(&outline),
    };

    if let Some(path) = output {
        fs::write(path, &rendered)?;
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", rendered.trim_end());
    }

    Ok(())
}

fn cmd_inspect(input: &Path, config: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let extractor = load_extractor(config, false)?;
    let source = PdfTextSource::open(input)?;
    let analysis = extractor.analyze(&source)?;
    let profile = &analysis.profile;

    println!("{}", "Layout Profile".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), source.backend().version());
    println!("{}: {}", "Pages".bold(), profile.page_count);
    println!("{}: {:.1}pt", "Body size".bold(), profile.body_font_size);
    println!(
        "{}: {}",
        "Left margin".bold(),
        profile
            .left_margin
            .map(|m| format!("{:.1}", m))
            .unwrap_or_else(|| "-".to_string())
    );
    println!(
        "{}: {}",
        "Degenerate".bold(),
        if profile.degenerate { "Yes" } else { "No" }
    );
    println!("{}: {}", "Form".bold(), if analysis.form { "Yes" } else { "No" });
    if !analysis.skipped_pages.is_empty() {
        println!("{}: {:?}", "Skipped pages".bold(), analysis.skipped_pages);
    }

    println!();
    println!("{}", "Size Clusters".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for cluster in &profile.size_clusters {
        println!(
            "  {:>5.1}pt  [{:.1}-{:.1}]  {} chars",
            cluster.size, cluster.min, cluster.max, cluster.weight
        );
    }

    if !profile.footer_bands.is_empty() {
        println!();
        println!("{}", "Header/Footer Bands".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        for band in &profile.footer_bands {
            println!(
                "  {:<6} {:>5.1}-{:<5.1} x{:<3} {:?}",
                band.edge.to_string(),
                band.range.0,
                band.range.1,
                band.repetitions,
                band.signature
            );
        }
    }

    println!();
    println!("{}", "Title".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    if analysis.title.is_empty() {
        println!("  {}", "(none)".dimmed());
    } else {
        println!(
            "  {} {}",
            analysis.title.text.bold(),
            format!("(score {:.2}, {} line(s))", analysis.title.score, analysis.title.lines.len())
                .dimmed()
        );
    }

    println!();
    println!("{}", "Lines".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for scored in &analysis.scored {
        let line = &analysis.lines[scored.index];
        let verdict = match scored.rejection {
            None => "heading".green().to_string(),
            Some(rejection) => rejection.to_string().dimmed().to_string(),
        };
        println!(
            "  p{:<3} {:>6.2} {:>5.1}pt {} {:<22} {}",
            line.page,
            scored.score,
            line.font_size,
            if line.bold { "B" } else { " " },
            verdict,
            line.text
        );
    }

    println!();
    println!("{}", "Outline".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    print!("{}", render::to_text(&analysis.outline));

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "pdf-outline".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Heuristic PDF outline extraction tool");
    println!();
    println!("License: MIT");
}
