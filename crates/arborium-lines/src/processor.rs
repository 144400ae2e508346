//! Processor that transforms every HTML file below a directory.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, HighlightError};
use crate::highlight::{HighlighterFactory, HighlighterKind};
use crate::options::Options;
use crate::transform::SyncCodeBlocks;

/// Options for the processor.
#[derive(Debug, Clone)]
pub struct ProcessOptions {
    /// Directory containing the HTML files.
    pub input_dir: PathBuf,
    /// Output directory (if None, modifies in place).
    pub output_dir: Option<PathBuf>,
    /// Highlighter used for every code block.
    pub highlighter: HighlighterKind,
    /// Transform options.
    pub transform: Options,
    /// Show a progress bar on stderr.
    pub progress: bool,
}

/// A file that could not be transformed. It was left untouched.
#[derive(Debug)]
pub struct FileFailure {
    pub path: PathBuf,
    pub error: ProcessError,
}

/// Statistics from processing.
#[derive(Debug, Default)]
pub struct ProcessorStats {
    /// Number of HTML files processed successfully.
    pub files_processed: usize,
    /// Number of HTML files rewritten.
    pub files_written: usize,
    /// Number of code blocks transformed.
    pub blocks_transformed: usize,
    /// Files that failed; none of them were written.
    pub failures: Vec<FileFailure>,
    /// Total bytes read from input HTML files.
    pub bytes_input: u64,
    /// Total bytes of transformed HTML.
    pub bytes_output: u64,
    /// Time spent processing HTML files (excludes copy time).
    pub process_duration: Duration,
}

impl ProcessorStats {
    /// HTML growth in percent ((output - input) / input * 100).
    pub fn html_inflation_percent(&self) -> f64 {
        if self.bytes_input == 0 {
            0.0
        } else {
            (self.bytes_output as f64 - self.bytes_input as f64) / self.bytes_input as f64 * 100.0
        }
    }

    /// Processing throughput in MB/s (excludes copy time).
    pub fn throughput_mb_s(&self) -> f64 {
        let secs = self.process_duration.as_secs_f64();
        if secs == 0.0 {
            0.0
        } else {
            (self.bytes_input as f64 / (1024.0 * 1024.0)) / secs
        }
    }
}

/// Processor for a directory of HTML files.
pub struct Processor {
    options: ProcessOptions,
}

impl Processor {
    /// Create a new processor with the given options.
    pub fn new(options: ProcessOptions) -> Self {
        Self { options }
    }

    /// Process the input directory.
    pub fn process(&self) -> Result<ProcessorStats, ProcessError> {
        let factory = HighlighterFactory::new(self.options.highlighter)?;

        let output_dir = match &self.options.output_dir {
            Some(out) if out != &self.options.input_dir => {
                self.copy_tree(out)?;
                out.as_path()
            }
            _ => self.options.input_dir.as_path(),
        };

        let html_files: Vec<PathBuf> = WalkDir::new(output_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "html"))
            .map(|e| e.path().to_path_buf())
            .collect();
        debug!(files = html_files.len(), dir = %output_dir.display(), "collected HTML files");

        let progress = if self.options.progress {
            let bar = ProgressBar::new(html_files.len() as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                    .map_err(|e| ProcessError::Io(std::io::Error::other(e.to_string())))?
                    .progress_chars("█▉▊▋▌▍▎▏  "),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let process_start = Instant::now();

        let files_processed = AtomicUsize::new(0);
        let files_written = AtomicUsize::new(0);
        let blocks_transformed = AtomicUsize::new(0);
        let bytes_input = AtomicUsize::new(0);
        let bytes_output = AtomicUsize::new(0);
        let failures = Mutex::new(Vec::<FileFailure>::new());

        let transform_options = &self.options.transform;

        // One highlighter per worker thread, sharing the factory's grammars.
        html_files.par_iter().for_each_init(
            || SyncCodeBlocks::with_options(factory.make(), transform_options.clone()),
            |blocks, path| {
                match process_html_file(path, blocks) {
                    Ok(file) => {
                        files_processed.fetch_add(1, Ordering::Relaxed);
                        blocks_transformed.fetch_add(file.blocks, Ordering::Relaxed);
                        bytes_input.fetch_add(file.input_size, Ordering::Relaxed);
                        bytes_output.fetch_add(file.output_size, Ordering::Relaxed);
                        if file.written {
                            files_written.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                    Err(error) => {
                        warn!(path = %path.display(), %error, "failed to process file");
                        if let Ok(mut failures) = failures.lock() {
                            failures.push(FileFailure {
                                path: path.clone(),
                                error,
                            });
                        }
                    }
                }
                progress.inc(1);
            },
        );

        let process_duration = process_start.elapsed();
        progress.finish_and_clear();

        let mut failures = failures.into_inner().unwrap_or_else(|e| e.into_inner());
        failures.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(ProcessorStats {
            files_processed: files_processed.load(Ordering::Relaxed),
            files_written: files_written.load(Ordering::Relaxed),
            blocks_transformed: blocks_transformed.load(Ordering::Relaxed),
            failures,
            bytes_input: bytes_input.load(Ordering::Relaxed) as u64,
            bytes_output: bytes_output.load(Ordering::Relaxed) as u64,
            process_duration,
        })
    }

    /// Replace `out` with a copy of the input directory.
    fn copy_tree(&self, out: &Path) -> Result<(), ProcessError> {
        if out.exists() {
            fs::remove_dir_all(out)?;
        }

        let spinner = if self.options.progress {
            let spinner = ProgressBar::new_spinner();
            spinner.set_message("Copying directory tree...");
            spinner.enable_steady_tick(Duration::from_millis(80));
            spinner
        } else {
            ProgressBar::hidden()
        };

        // clonetree uses copy-on-write clones where the filesystem has them
        clonetree::clone_tree(&self.options.input_dir, out, &clonetree::Options::new())
            .map_err(|e| ProcessError::Io(std::io::Error::other(e.to_string())))?;

        spinner.finish_with_message("Copy complete");
        Ok(())
    }
}

struct FileResult {
    blocks: usize,
    written: bool,
    input_size: usize,
    output_size: usize,
}

/// Transform one file in place. A file is only written if it had blocks.
fn process_html_file<H: crate::Highlight>(
    path: &Path,
    blocks: &mut SyncCodeBlocks<H>,
) -> Result<FileResult, ProcessError> {
    let html = fs::read_to_string(path)?;
    let input_size = html.len();

    // Skip parsing files that can't contain a code block.
    if !may_contain_code_block(&html) {
        return Ok(FileResult {
            blocks: 0,
            written: false,
            input_size,
            output_size: input_size,
        });
    }

    let (transformed, count) = blocks.transform_html(&html)?;
    let written = count > 0;
    if written {
        fs::write(path, &transformed)?;
    }

    Ok(FileResult {
        blocks: count,
        written,
        input_size,
        output_size: if written { transformed.len() } else { input_size },
    })
}

/// Tag names are case-insensitive, so `<PRE>` counts too.
fn may_contain_code_block(html: &str) -> bool {
    html.as_bytes()
        .windows(4)
        .any(|window| window.eq_ignore_ascii_case(b"<pre"))
}

/// Errors that can occur during processing.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    #[diagnostic(code(arborium_lines::io))]
    Io(#[from] std::io::Error),

    #[error("Transform error: {0}")]
    #[diagnostic(transparent)]
    Transform(#[from] Error),

    #[error("Highlighter error: {0}")]
    #[diagnostic(transparent)]
    Highlighter(#[from] HighlightError),
}
