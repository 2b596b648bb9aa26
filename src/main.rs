#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use std::io::Write;
use std::path::PathBuf;

use tagtrans::app_config::{GlossaryScope, LogLevel, ModelConfigs, ReasoningScope, TranslationOptions};
use tagtrans::app_controller::Controller;
use tagtrans::file_utils::{self, FileManager};
use tagtrans::language_utils::WhatlangDetector;
use tagtrans::providers::{self, webui::DEFAULT_API_BASE_URL, webui::WebUi};

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate the text nodes of a markup file or directory
    Translate(TranslateArgs),

    /// Merge the markup files of one directory tree into another
    Merge(MergeArgs),

    /// Generate shell completions for tagtrans
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Input markup file or directory to translate
    #[arg(value_name = "INPUT_PATH")]
    input_path: PathBuf,

    /// Output file or directory; a single file's result goes to stdout if omitted
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Model used for translation (and for refinement in refine mode)
    #[arg(short, long)]
    model: String,

    /// Base URL of the text-generation-webui API
    #[arg(long, env = "OOBABOOGA_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    api_base_url: String,

    /// Model configuration file
    #[arg(long, default_value = "models.json")]
    models_config: PathBuf,

    /// Generate drafts with the draft model, then refine them with the main model
    #[arg(long, requires = "draft_model")]
    refine: bool,

    /// Model used to generate drafts in refine mode
    #[arg(long)]
    draft_model: Option<String>,

    /// Number of drafts to generate in refine mode
    #[arg(long, default_value_t = 6, value_parser = clap::value_parser!(u32).range(1..))]
    num_drafts: u32,

    /// Translate each line of a text node separately
    #[arg(long)]
    line_by_line: bool,

    /// File whose content is appended to prompts as a glossary
    #[arg(long, value_name = "FILE")]
    glossary: Option<PathBuf>,

    /// Refine-mode stages that receive the glossary
    #[arg(long, value_enum, default_value_t = GlossaryScope::All)]
    glossary_for: GlossaryScope,

    /// Stages that use the reasoning prompt templates
    #[arg(long, value_enum, default_value_t = ReasoningScope::None)]
    reasoning_for: ReasoningScope,

    /// Force overwrite of existing output files
    #[arg(short = 'f', long)]
    overwrite: bool,

    #[command(flatten)]
    verbosity: VerbosityArgs,
}

#[derive(Parser, Debug)]
struct MergeArgs {
    /// Directory whose files take priority
    #[arg(long)]
    input_dir: PathBuf,

    /// Directory merged into and written back
    #[arg(long)]
    output_dir: PathBuf,

    #[command(flatten)]
    verbosity: VerbosityArgs,
}

#[derive(clap::Args, Debug)]
struct VerbosityArgs {
    /// Enable debug output
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Only print errors and hide progress bars
    #[arg(short, long)]
    quiet: bool,

    /// Set logging level (takes precedence over --verbose/--quiet)
    #[arg(short, long, value_enum)]
    log_level: Option<LogLevel>,
}

impl VerbosityArgs {
    fn level_filter(&self) -> LevelFilter {
        match self.log_level {
            Some(level) => level.to_level_filter(),
            None if self.verbose => LevelFilter::Debug,
            None if self.quiet => LevelFilter::Error,
            None => LevelFilter::Info,
        }
    }
}

/// tagtrans - LLM translation of bracket/angle markup files
///
/// Translates the text of structured markup documents with models served by
/// a local text-generation-webui instance, leaving the structure untouched.
#[derive(Parser, Debug)]
#[command(name = "tagtrans")]
#[command(version)]
#[command(about = "LLM-powered translation of structured markup files")]
#[command(long_about = "tagtrans translates the text nodes of [Group]/<element> markup files using a text-generation-webui server.

EXAMPLES:
    tagtrans translate story.txt -m qwen                          # Print the translation
    tagtrans translate story.txt -m qwen -o story.en.txt          # Write it to a file
    tagtrans translate in/ -m qwen -o out/ -f                     # Translate a directory, overwriting
    tagtrans translate in/ -m qwen -o out/ --refine --draft-model small --num-drafts 4
    tagtrans merge --input-dir patches/ --output-dir game/        # Merge trees, input wins
    tagtrans completions bash > tagtrans.bash                     # Generate bash completions

CONFIGURATION:
    Model settings are read from models.json by default (see --models-config).
    Each entry may inherit from another with \"inherits\"; unknown models fall
    back to the \"_default\" entry. The API URL may also be given through the
    OOBABOOGA_API_BASE_URL environment variable.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Records are filtered by the global max level, which can change after init
        log::set_boxed_logger(Box::new(CustomLogger { level: LevelFilter::Trace }))?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for a level
    fn decoration(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => ("", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::decoration(record.level());
            let _ = writeln!(std::io::stderr(), "\x1B[{}m{} {}{}\x1B[0m", color, now, emoji, record.args());
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    CustomLogger::init(LevelFilter::Info)?;

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "tagtrans", &mut std::io::stdout());
            Ok(())
        }
        Commands::Translate(args) => {
            log::set_max_level(args.verbosity.level_filter());
            run_translate(args).await
        }
        Commands::Merge(args) => {
            log::set_max_level(args.verbosity.level_filter());
            run_merge(args)
        }
    }
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let configs = ModelConfigs::load(&args.models_config)?;
    let model_config = configs.get(&args.model)?.clone();

    let mut options = TranslationOptions::new(&args.input_path, &args.model, model_config);
    if args.refine {
        let draft_model = args.draft_model.as_deref().unwrap_or_default();
        let draft_config = configs.get(draft_model)?.clone();
        options = options.with_refine(draft_model, draft_config, args.num_drafts as usize);
    } else if args.draft_model.is_some() {
        warn!("--draft-model is ignored without --refine");
    }

    options.output_path = args.output;
    options.line_by_line = args.line_by_line;
    options.glossary_for = args.glossary_for;
    options.reasoning_for = args.reasoning_for;
    options.overwrite = args.overwrite;
    options.quiet = args.verbosity.quiet;
    if let Some(path) = &args.glossary {
        let glossary = FileManager::read_to_string(path).context("Failed to read glossary file")?;
        options.glossary_text = Some(glossary);
    }
    options.validate()?;

    let backend = WebUi::new(&args.api_base_url)?;
    providers::check_server(&backend).await?;
    info!("Connected to the translation API at {}", backend.base_url());

    let detector = WhatlangDetector;
    Controller::new(options, &backend, &detector).run().await
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let report = file_utils::merge_directories(&args.input_dir, &args.output_dir)?;
    info!(
        "Merge complete: {} merged, {} copied, {} failed",
        report.merged, report.copied, report.failed
    );
    Ok(())
}
