//! arborium-lines CLI - add line numbers, diff markers and folds to code blocks.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use arborium_lines::{
    HighlighterFactory, HighlighterKind, Options, ProcessOptions, Processor, SyncCodeBlocks,
};
use clap::Parser;
use miette::{Context, IntoDiagnostic, Result, bail};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

/// Post-process HTML code blocks: line numbers, diff markers, content hashes
/// and fold placeholders.
///
/// INPUT may be an HTML file, a directory (every `*.html` below it is
/// processed), or `-` to read from stdin and write to stdout.
#[derive(Debug, Parser)]
#[command(name = "arborium-lines", version)]
struct Args {
    /// HTML file, directory, or `-` for stdin
    input: PathBuf,

    /// Output file or directory (defaults to modifying input in place)
    output: Option<PathBuf>,

    /// Highlighter used to render code blocks
    #[arg(long, value_enum, default_value_t = HighlighterKind::Plain)]
    highlighter: HighlighterKind,

    /// TOML file with transform options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fail on languages the highlighter doesn't support instead of
    /// rendering them as plain text
    #[arg(long)]
    strict_languages: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut options = match &args.config {
        Some(path) => Options::load(path)?,
        None => Options::default(),
    };
    if args.strict_languages {
        options.ignore_unknown_language = false;
    }

    if args.input == Path::new("-") {
        return run_stdin(&args, options);
    }
    if !args.input.exists() {
        bail!("Input path does not exist: {}", args.input.display());
    }
    if args.input.is_dir() {
        run_dir(&args, options)
    } else {
        run_file(&args, options)
    }
}

fn run_stdin(args: &Args, options: Options) -> Result<()> {
    let mut html = String::new();
    std::io::stdin()
        .read_to_string(&mut html)
        .into_diagnostic()
        .wrap_err("failed to read stdin")?;

    let mut blocks = code_blocks(args.highlighter, options)?;
    let (out, _) = blocks.transform_html(&html)?;

    match &args.output {
        Some(path) => std::fs::write(path, out)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write {}", path.display()))?,
        None => std::io::stdout()
            .write_all(out.as_bytes())
            .into_diagnostic()?,
    }
    Ok(())
}

fn run_file(args: &Args, options: Options) -> Result<()> {
    let html = std::fs::read_to_string(&args.input)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read {}", args.input.display()))?;

    let mut blocks = code_blocks(args.highlighter, options)?;
    let (out, count) = blocks.transform_html(&html)?;

    let target = args.output.as_ref().unwrap_or(&args.input);
    if count > 0 || args.output.is_some() {
        std::fs::write(target, out)
            .into_diagnostic()
            .wrap_err_with(|| format!("failed to write {}", target.display()))?;
    }

    eprintln!(
        "{} {} code blocks in {}",
        "arborium-lines".green().bold(),
        count.to_string().cyan(),
        target.display()
    );
    Ok(())
}

fn run_dir(args: &Args, options: Options) -> Result<()> {
    let processor = Processor::new(ProcessOptions {
        input_dir: args.input.clone(),
        output_dir: args.output.clone(),
        highlighter: args.highlighter,
        transform: options,
        progress: true,
    });

    eprintln!(
        "{} Processing HTML: {}",
        "arborium-lines".green().bold(),
        args.input.display()
    );
    if let Some(out) = &args.output {
        eprintln!("  Output: {}", out.display());
    } else {
        eprintln!("  {} Modifying in place", "Note:".yellow());
    }
    eprintln!();

    let start = Instant::now();
    let stats = processor.process()?;
    let elapsed = start.elapsed();

    eprintln!("{}", "Results:".bold());
    eprintln!(
        "  {} HTML files processed",
        stats.files_processed.to_string().cyan()
    );
    eprintln!(
        "  {} HTML files rewritten",
        stats.files_written.to_string().cyan()
    );
    eprintln!(
        "  {} code blocks transformed",
        stats.blocks_transformed.to_string().green()
    );
    eprintln!(
        "  {:.1}% HTML growth, {:.1} MB/s",
        stats.html_inflation_percent(),
        stats.throughput_mb_s()
    );
    eprintln!("\n  Completed in {:.2}s", elapsed.as_secs_f64());

    if !stats.failures.is_empty() {
        eprintln!();
        for failure in &stats.failures {
            eprintln!(
                "  {} {}: {}",
                "✗".red(),
                failure.path.display(),
                failure.error
            );
        }
        bail!("{} files failed and were left unchanged", stats.failures.len());
    }

    Ok(())
}

fn code_blocks(
    kind: HighlighterKind,
    options: Options,
) -> Result<SyncCodeBlocks<arborium_lines::BuiltinHighlighter>> {
    let factory = HighlighterFactory::new(kind)?;
    Ok(SyncCodeBlocks::with_options(factory.make(), options))
}
