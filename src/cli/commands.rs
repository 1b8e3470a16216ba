//! CLI command definitions for dsa-coder.
//!
//! `serve` runs the HTTP service; `generate` and `debug` call the actions
//! directly from the terminal.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::actions::CodeActions;
use crate::config::AppConfig;
use crate::language::Language;
use crate::session::{NotificationKind, Workbench};
use crate::types::{ActionResponse, GenerationRequest, RegenerationRequest};
use crate::utils::code_fence::ensure_fenced;
use crate::utils::data_uri::encode_image_file;

/// AI assistant for data structures and algorithms problems.
#[derive(Parser)]
#[command(name = "dsa-coder")]
#[command(about = "Generate and debug solutions to DSA problems with an LLM")]
#[command(version)]
#[command(
    long_about = "dsa-coder turns a problem statement (text and/or an image) into a runnable solution, and fixes that solution from a reported error.\n\nExample usage:\n  dsa-coder serve --port 3000\n  dsa-coder generate -p \"Return indices of two numbers that sum to target\" --language python --interactive"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// YAML configuration file.
    #[arg(short, long, global = true, env = "DSA_CODER_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Run the HTTP service with the web form.
    Serve(ServeArgs),

    /// Generate a solution for a problem.
    #[command(alias = "gen")]
    Generate(GenerateArgs),

    /// Fix existing code from an error report.
    Debug(DebugArgs),

    /// List supported languages.
    Languages,
}

/// Model provider overrides shared by all commands that call the model.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct LlmArgs {
    /// Base URL of the OpenAI-compatible API.
    #[arg(long)]
    pub api_base: Option<String>,

    /// API key (can also be set via DSA_CODER_API_KEY or LITELLM_API_KEY env var).
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model identifier (OpenRouter format, e.g. google/gemini-2.0-flash-001).
    #[arg(short = 'm', long)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 - 2.0).
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Maximum reply tokens.
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Model request timeout in seconds.
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Do not ask the provider for JSON-constrained output.
    #[arg(long)]
    pub no_json_mode: bool,
}

impl LlmArgs {
    fn apply(&self, mut config: AppConfig) -> AppConfig {
        if let Some(ref api_base) = self.api_base {
            config = config.with_api_base(api_base.clone());
        }
        if let Some(ref api_key) = self.api_key {
            config = config.with_api_key(api_key.clone());
        }
        if let Some(ref model) = self.model {
            config = config.with_model(model.clone());
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        if let Some(max_tokens) = self.max_tokens {
            config = config.with_max_tokens(max_tokens);
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config = config.with_timeout_secs(timeout_secs);
        }
        if self.no_json_mode {
            config = config.with_json_mode(false);
        }
        config
    }
}

/// Arguments for `dsa-coder serve`.
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on.
    #[arg(short, long)]
    pub port: Option<u16>,

    #[command(flatten)]
    pub llm: LlmArgs,
}

/// Problem statement fields shared by `generate` and `debug`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ProblemArgs {
    /// Problem description.
    #[arg(short = 'p', long, conflicts_with = "problem_file")]
    pub problem: Option<String>,

    /// Read the problem description from a file.
    #[arg(long)]
    pub problem_file: Option<PathBuf>,

    /// Constraints, e.g. "2 <= nums.length <= 10^4".
    #[arg(long)]
    pub constraints: Option<String>,

    /// Example inputs and outputs.
    #[arg(long)]
    pub examples: Option<String>,

    /// Target language (python, java, cpp, javascript, typescript, go, rust, c).
    #[arg(short = 'L', long, default_value = "python")]
    pub language: String,

    /// Image of the problem statement (png, jpg, gif, webp, bmp).
    #[arg(long)]
    pub image: Option<PathBuf>,
}

impl ProblemArgs {
    fn description(&self) -> anyhow::Result<String> {
        match (&self.problem, &self.problem_file) {
            (Some(text), _) => Ok(text.clone()),
            (None, Some(path)) => read_text(path),
            (None, None) => Ok(String::new()),
        }
    }
}

/// Arguments for `dsa-coder generate`.
#[derive(Parser, Debug)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub problem: ProblemArgs,

    /// Print the raw action response as JSON.
    #[arg(long, conflicts_with = "interactive")]
    pub json: bool,

    /// After generating, keep asking for errors and fixing the code.
    #[arg(short, long)]
    pub interactive: bool,

    #[command(flatten)]
    pub llm: LlmArgs,
}

/// Arguments for `dsa-coder debug`.
#[derive(Parser, Debug)]
pub struct DebugArgs {
    /// File holding the code to fix.
    #[arg(long)]
    pub code_file: PathBuf,

    /// Description of the error you encountered.
    #[arg(short, long)]
    pub error: String,

    #[command(flatten)]
    pub problem: ProblemArgs,

    /// Print the raw action response as JSON.
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub llm: LlmArgs,
}

/// Parse CLI arguments.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse arguments and execute the command.
///
/// For control over logging initialization, use `parse_cli()` and
/// `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Serve(args) => run_serve_command(config_path, args).await,
        Commands::Generate(args) => run_generate_command(config_path, args).await,
        Commands::Debug(args) => run_debug_command(config_path, args).await,
        Commands::Languages => {
            run_languages_command();
            Ok(())
        }
    }
}

/// Loads file and environment configuration, then applies flag overrides.
fn load_config(path: Option<&Path>, llm: &LlmArgs) -> anyhow::Result<AppConfig> {
    let mut config = AppConfig::load(path).context("Failed to load configuration")?;
    config = llm.apply(config);
    config.validate()?;
    Ok(config)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn run_serve_command(config_path: Option<&Path>, args: ServeArgs) -> anyhow::Result<()> {
    let mut config = load_config(config_path, &args.llm)?;
    if let Some(host) = args.host {
        config = config.with_host(host);
    }
    if let Some(port) = args.port {
        config = config.with_port(port);
    }

    if let Err(e) = crate::metrics::init_metrics() {
        warn!(error = %e, "Failed to initialize metrics");
    }

    crate::server::serve(&config).await
}

async fn run_generate_command(
    config_path: Option<&Path>,
    args: GenerateArgs,
) -> anyhow::Result<()> {
    let config = load_config(config_path, &args.llm)?;
    let actions = CodeActions::from_config(&config)?;
    let language: Language = args
        .problem
        .language
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let mut workbench = Workbench::new().with_max_image_bytes(config.limits.max_image_bytes);
    workbench.problem.problem_description = args.problem.description()?;
    workbench.problem.constraints = args.problem.constraints.clone().unwrap_or_default();
    workbench.problem.examples = args.problem.examples.clone().unwrap_or_default();
    workbench.problem.language = language;
    if let Some(ref path) = args.problem.image {
        if let Err(e) = workbench.attach_image_file(path) {
            anyhow::bail!("{}", e);
        }
    }

    info!(model = %config.llm.model, language = language.id(), "Generating solution");

    let (ticket, request) = workbench.begin_generate()?;
    let response = actions.generate(&request).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return response.into_result().map(|_| ()).map_err(anyhow::Error::msg);
    }

    workbench.complete_generate(ticket, response);
    if !print_outcome(&mut workbench, language) {
        anyhow::bail!("Code generation failed");
    }

    if args.interactive {
        debug_loop(&actions, &mut workbench, language).await?;
    }
    Ok(())
}

/// Repeatedly asks for an error report and regenerates until an empty line.
async fn debug_loop(
    actions: &CodeActions,
    workbench: &mut Workbench,
    language: Language,
) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        eprintln!();
        eprintln!("Describe the error you encountered (empty line to finish):");
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let report = line.trim();
        if report.is_empty() {
            break;
        }

        workbench.debug.error_report = report.to_string();
        let (ticket, request) = workbench.begin_regenerate()?;
        let response = actions.regenerate(&request).await;
        workbench.complete_regenerate(ticket, response);
        print_outcome(workbench, language);
    }
    Ok(())
}

/// Prints the current result and pending notifications. Returns whether the
/// last completion succeeded.
fn print_outcome(workbench: &mut Workbench, language: Language) -> bool {
    let mut ok = false;
    for notification in workbench.drain_notifications() {
        match notification.kind {
            NotificationKind::Success => {
                ok = true;
                if let Some(code) = workbench.code() {
                    println!("{}", ensure_fenced(code, language.fence_tag()));
                }
                if let Some(explanation) = workbench.explanation() {
                    println!();
                    println!("{}", explanation);
                }
            }
            NotificationKind::Error => {
                eprintln!("{}: {}", notification.title, notification.message);
            }
        }
    }
    ok
}

async fn run_debug_command(config_path: Option<&Path>, args: DebugArgs) -> anyhow::Result<()> {
    let config = load_config(config_path, &args.llm)?;
    let actions = CodeActions::from_config(&config)?;

    let mut problem = GenerationRequest::new(args.problem.description()?)
        .with_language(args.problem.language.clone());
    problem.constraints = args.problem.constraints.clone();
    problem.example_inputs_outputs = args.problem.examples.clone();
    if let Some(ref path) = args.problem.image {
        let uri = encode_image_file(path, config.limits.max_image_bytes)
            .with_context(|| format!("Failed to attach {}", path.display()))?;
        problem = problem.with_photo_data_uri(uri);
    }

    let previous_code = read_text(&args.code_file)?;
    let request = RegenerationRequest::new(problem, previous_code, args.error.clone());

    info!(model = %config.llm.model, "Fixing code");
    let response = actions.regenerate(&request).await;
    report_response(response, args.json, &args.problem.language)
}

fn report_response(response: ActionResponse, json: bool, language: &str) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return response.into_result().map(|_| ()).map_err(anyhow::Error::msg);
    }

    let result = response.into_result().map_err(anyhow::Error::msg)?;
    let tag = language
        .parse::<Language>()
        .map(|lang| lang.fence_tag())
        .unwrap_or("");
    println!("{}", ensure_fenced(&result.code, tag));
    if let Some(explanation) = result.explanation {
        println!();
        println!("{}", explanation);
    }
    Ok(())
}

fn run_languages_command() {
    for lang in Language::all() {
        println!("{:<12} {}", lang.id(), lang.display_name());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate() {
        let cli = Cli::try_parse_from([
            "dsa-coder",
            "generate",
            "-p",
            "Two sum",
            "--language",
            "cpp",
            "--model",
            "openai/gpt-4o-mini",
            "--interactive",
        ])
        .expect("parse");

        match cli.command {
            Commands::Generate(args) => {
                assert_eq!(args.problem.problem.as_deref(), Some("Two sum"));
                assert_eq!(args.problem.language, "cpp");
                assert_eq!(args.llm.model.as_deref(), Some("openai/gpt-4o-mini"));
                assert!(args.interactive);
                assert!(!args.json);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_parse_debug_requires_error() {
        assert!(Cli::try_parse_from(["dsa-coder", "debug", "--code-file", "a.py"]).is_err());
        assert!(Cli::try_parse_from([
            "dsa-coder",
            "debug",
            "--code-file",
            "a.py",
            "--error",
            "IndexError"
        ])
        .is_ok());
    }

    #[test]
    fn test_json_conflicts_with_interactive() {
        assert!(Cli::try_parse_from(["dsa-coder", "generate", "-p", "x", "--json", "-i"]).is_err());
    }

    #[test]
    fn test_llm_args_override_config() {
        let args = LlmArgs {
            model: Some("test/model".to_string()),
            temperature: Some(0.9),
            no_json_mode: true,
            ..LlmArgs::default()
        };
        let config = args.apply(AppConfig::default());
        assert_eq!(config.llm.model, "test/model");
        assert!((config.llm.temperature - 0.9).abs() < f64::EPSILON);
        assert!(!config.llm.json_mode);
    }

    #[test]
    fn test_problem_file_is_read() {
        let file = tempfile::NamedTempFile::new().expect("tempfile");
        fs::write(file.path(), "Reverse a linked list.").expect("write");
        let args = ProblemArgs {
            problem_file: Some(file.path().to_path_buf()),
            ..ProblemArgs::default()
        };
        assert_eq!(args.description().expect("read"), "Reverse a linked list.");
    }
}
