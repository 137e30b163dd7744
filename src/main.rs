// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{anyhow, Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use log::{error, info, Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use batchlingo::app_config::{Config, LogLevel};
use batchlingo::{AppError, Controller, TranslationRequest, TranslationResponse};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => LogLevel::Error,
            CliLogLevel::Warn => LogLevel::Warn,
            CliLogLevel::Info => LogLevel::Info,
            CliLogLevel::Debug => LogLevel::Debug,
            CliLogLevel::Trace => LogLevel::Trace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "batchlingo", version, about = "Batch translation through chat completion models")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Translate a list of texts and print the translation map as JSON
    Translate(TranslateArgs),

    /// Generate shell completions for batchlingo
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Parser, Debug)]
struct TranslateArgs {
    /// Texts to translate
    #[arg(value_name = "ITEMS")]
    items: Vec<String>,

    /// JSON request file of the form {"from": .., "to": .., "items": [..]}
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Source language code (e.g. 'ZH')
    #[arg(short = 's', long = "from")]
    source_language: Option<String>,

    /// Target language code (e.g. 'EN')
    #[arg(short = 't', long = "to")]
    target_language: Option<String>,

    /// Configuration file path
    #[arg(short, long, default_value = "conf.json")]
    config_path: PathBuf,

    /// API key for the completion endpoint
    #[arg(long, env = "LLM_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Chat completion URL
    #[arg(long, env = "LLM_API_URL")]
    api_url: Option<String>,

    /// Model name to use for translation
    #[arg(short, long, env = "LLM_MODEL_NAME")]
    model: Option<String>,

    /// Maximum number of texts per request
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Maximum number of concurrent requests
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Set logging level
    #[arg(short, long, value_enum)]
    log_level: Option<CliLogLevel>,

    /// Print call statistics after translating
    #[arg(long)]
    stats: bool,
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        // Accept everything here, the global max level does the filtering
        let logger = Box::new(CustomLogger::new(LevelFilter::Trace));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: ANSI color and label for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("\x1B[1;31m", "ERROR"),
            Level::Warn => ("\x1B[1;33m", "WARN "),
            Level::Info => ("\x1B[1;32m", "INFO "),
            Level::Debug => ("\x1B[1;36m", "DEBUG"),
            Level::Trace => ("\x1B[1;35m", "TRACE"),
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
            let (color, label) = Self::style_for_level(record.level());
            let _ = writeln!(
                std::io::stderr(),
                "{}{} {} {}\x1B[0m",
                color,
                now,
                label,
                record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = CustomLogger::init(LevelFilter::Info) {
        eprintln!("Failed to initialize logger: {}", e);
        return ExitCode::FAILURE;
    }

    let cli = CommandLineOptions::parse();

    match cli.command {
        Commands::Completions { shell } => {
            let mut cmd = CommandLineOptions::command();
            generate(shell, &mut cmd, "batchlingo", &mut std::io::stdout());
            ExitCode::SUCCESS
        }
        Commands::Translate(args) => match run_translate(args).await {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => report_failure(e),
        },
    }
}

/// Log the full error and print a short message; invalid input exits with 2
fn report_failure(e: anyhow::Error) -> ExitCode {
    error!("{:#}", e);
    match e.downcast_ref::<AppError>() {
        Some(app_error) if app_error.is_client_error() => {
            eprintln!("{}", app_error);
            ExitCode::from(2)
        }
        Some(AppError::Translation(_)) => {
            eprintln!("Translation failed, see the log for details");
            ExitCode::FAILURE
        }
        _ => {
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run_translate(args: TranslateArgs) -> Result<()> {
    let mut config = Config::from_file_or_default(&args.config_path)?;
    apply_overrides(&mut config, &args);

    let log_level = args
        .log_level
        .clone()
        .map(LogLevel::from)
        .unwrap_or_else(|| config.log_level.clone());
    log::set_max_level(log_level.to_level_filter());

    let request = build_request(&args)?;
    info!(
        "Translating {} texts from {} to {}",
        request.items.len(),
        request.source_lang,
        request.target_lang
    );

    let controller = Controller::with_config(config)?;
    let response: TranslationResponse = controller.handle(&request).await?;

    let output = serde_json::to_string_pretty(&response).context("Failed to serialize result")?;
    println!("{}", output);

    if args.stats {
        let status = controller.status();
        let report = serde_json::to_string_pretty(&status).context("Failed to serialize status")?;
        println!("{}", report);
    }

    Ok(())
}

fn apply_overrides(config: &mut Config, args: &TranslateArgs) {
    if let Some(api_key) = &args.api_key {
        config.llm.api_key = api_key.clone();
    }
    if let Some(api_url) = &args.api_url {
        config.llm.api_url = api_url.clone();
    }
    if let Some(model) = &args.model {
        config.llm.model = model.clone();
    }
    if let Some(chunk_size) = args.chunk_size {
        config.batch.chunk_size = chunk_size;
    }
    if let Some(max_concurrency) = args.max_concurrency {
        config.batch.max_concurrency = max_concurrency;
    }
}

/// Combine the request file (if any) with command line values, which take precedence
fn build_request(args: &TranslateArgs) -> Result<TranslationRequest> {
    let mut request = match &args.input {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read request file: {}", path.display()))?;
            serde_json::from_str::<TranslationRequest>(&content)
                .with_context(|| format!("Failed to parse request file: {}", path.display()))?
        }
        None => TranslationRequest {
            source_lang: String::new(),
            target_lang: String::new(),
            items: Vec::new(),
        },
    };

    if let Some(source) = &args.source_language {
        request.source_lang = source.clone();
    }
    if let Some(target) = &args.target_language {
        request.target_lang = target.clone();
    }
    request.items.extend(args.items.iter().cloned());

    if request.source_lang.is_empty() || request.target_lang.is_empty() {
        return Err(anyhow!(AppError::InvalidInput(
            "both --from and --to are required".to_string()
        )));
    }

    Ok(request)
}
