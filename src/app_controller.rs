use anyhow::{Context, Result, anyhow};
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use log::{error, info, warn};
use std::path::{Path, PathBuf};

use crate::app_config::TranslationOptions;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::language_utils::LanguageDetector;
use crate::providers::Backend;
use crate::translation::{BatchReport, RetryPolicy, Translator, TreeTranslator};

// @module: Application controller for markup file translation

/// What a single file run ended with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// The file was translated and written (or printed)
    Translated(BatchReport),
    /// The output already existed and overwrite was off
    Skipped,
}

/// Totals over a directory run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub files_translated: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    /// Node counts summed over every translated file
    pub nodes: BatchReport,
}

/// Main application controller for translation runs
pub struct Controller<'a> {
    // @field: Run options
    options: TranslationOptions,
    backend: &'a dyn Backend,
    detector: &'a dyn LanguageDetector,
    retry: RetryPolicy,
    multi_progress: MultiProgress,
}

impl<'a> Controller<'a> {
    // @method: Create a new controller over a backend and detector
    pub fn new(options: TranslationOptions, backend: &'a dyn Backend, detector: &'a dyn LanguageDetector) -> Self {
        let multi_progress = MultiProgress::new();
        if options.quiet {
            multi_progress.set_draw_target(ProgressDrawTarget::hidden());
        }

        Self {
            options,
            backend,
            detector,
            retry: RetryPolicy::default(),
            multi_progress,
        }
    }

    /// Override the retry policy used for every node
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The options this controller runs with
    pub fn options(&self) -> &TranslationOptions {
        &self.options
    }

    /// Translate the configured input, a single file or a whole directory
    pub async fn run(&self) -> Result<()> {
        self.options.validate()?;
        let input = self.options.input_path.clone();

        if input.is_file() {
            let outcome = self.run_file(&input, self.options.output_path.as_deref()).await?;
            if let FileOutcome::Translated(report) = outcome {
                info!(
                    "Translated {} node(s), {} failed, {} skipped",
                    report.translated, report.failed, report.skipped
                );
            }
            Ok(())
        } else if input.is_dir() {
            let output_dir = self
                .options
                .output_path
                .clone()
                .ok_or_else(|| anyhow!("An output directory is required when translating a directory"))?;
            let summary = self.run_folder(&input, &output_dir).await?;
            info!(
                "Finished: {} file(s) translated, {} skipped, {} failed",
                summary.files_translated, summary.files_skipped, summary.files_failed
            );
            Ok(())
        } else {
            Err(anyhow!("Input path does not exist: {:?}", input))
        }
    }

    /// Translate one file; prints to stdout when `output_path` is `None`
    pub async fn run_file(&self, input_file: &Path, output_path: Option<&Path>) -> Result<FileOutcome> {
        if let Some(output) = output_path {
            if output.exists() && !self.options.overwrite {
                warn!(
                    "Output file '{}' already exists. Skipping translation (use -f to force overwrite).",
                    output.display()
                );
                return Ok(FileOutcome::Skipped);
            }
        }

        info!("Translating '{}'...", input_file.display());
        let content = FileManager::read_to_string(input_file)?;
        let (translated, report) = self
            .translate_content(&content)
            .await
            .with_context(|| format!("Failed to translate {:?}", input_file))?;

        match output_path {
            Some(output) => {
                FileManager::write_to_file(output, &translated)?;
                info!("Success: {:?}", output);
            }
            None => println!("{}", translated),
        }

        Ok(FileOutcome::Translated(report))
    }

    /// Translate every `.txt` file below `input_dir` into the mirrored path under `output_dir`
    ///
    /// A file that fails is logged and counted. A model that cannot be loaded
    /// stops the run, as every later file would fail the same way.
    pub async fn run_folder(&self, input_dir: &Path, output_dir: &Path) -> Result<FolderSummary> {
        let files = FileManager::find_files(input_dir, "txt")?;
        info!("Found {} file(s) in {:?}", files.len(), input_dir);
        FileManager::ensure_dir(output_dir)?;

        let files_progress = self.multi_progress.add(ProgressBar::new(files.len() as u64));
        files_progress.set_style(progress_style("files"));

        let mut summary = FolderSummary::default();
        for input_file in &files {
            let output_file: PathBuf = FileManager::mirror_path(input_dir, input_file, output_dir)?;
            files_progress.set_message(display_name(input_file));

            match self.run_file(input_file, Some(&output_file)).await {
                Ok(FileOutcome::Translated(report)) => {
                    summary.files_translated += 1;
                    summary.nodes.translated += report.translated;
                    summary.nodes.failed += report.failed;
                    summary.nodes.skipped += report.skipped;
                }
                Ok(FileOutcome::Skipped) => summary.files_skipped += 1,
                Err(e) if is_fatal(&e) => {
                    files_progress.abandon();
                    return Err(e);
                }
                Err(e) => {
                    error!("Error processing file {:?}: {:#}", input_file, e);
                    summary.files_failed += 1;
                }
            }

            files_progress.inc(1);
        }

        files_progress.finish_and_clear();
        Ok(summary)
    }

    /// Translate a whole document held in memory
    pub async fn translate_content(&self, content: &str) -> Result<(String, BatchReport), AppError> {
        let translator = Translator::new(self.backend, self.detector).with_retry_policy(self.retry);
        let nodes_progress = self.multi_progress.add(ProgressBar::new(0));
        nodes_progress.set_style(progress_style("nodes"));

        let result = TreeTranslator::new(translator, &self.options)?
            .with_progress(nodes_progress.clone())
            .translate_content(content)
            .await;

        nodes_progress.finish_and_clear();
        result
    }
}

fn is_fatal(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<AppError>(),
        Some(AppError::Translation(e)) if e.is_fatal()
    )
}

fn progress_style(unit: &str) -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}} {{eta}}",
            unit
        ))
        .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░")
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
