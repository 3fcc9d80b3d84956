mod runner;
mod serve;
mod tap;

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use crudcheck_conformance::config::{ENV_BASE_URL, ENV_TOKEN_URL};
use crudcheck_conformance::{
    ConformanceResult, ResourceTarget, RunConfig, SuiteConfig, TeardownScope,
};
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "CRUDCHECK_LOG";

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Conformance checks for token-authenticated REST CRUD resources.
#[derive(Parser)]
#[command(
    name = "crudcheck",
    version,
    about = "Conformance checks for token-authenticated REST CRUD resources"
)]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the conformance suite against one or more resources
    Run(RunArgs),

    /// Start the in-memory reference API
    ServeMock {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,
        /// Collection endpoints to serve (repeatable)
        #[arg(long = "endpoint", default_value = "widgets")]
        endpoints: Vec<String>,
        /// Username accepted by the token endpoint
        #[arg(long, default_value = "usernameTest")]
        username: String,
        /// Password accepted by the token endpoint
        #[arg(long, default_value = "qwerty123")]
        password: String,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// TOML run file with suite settings and [[resources]]
    #[arg(long)]
    config: Option<PathBuf>,
    /// Base URL of the API under test (overrides file and CRUDCHECK_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,
    /// Token issuer URL (overrides file and CRUDCHECK_TOKEN_URL)
    #[arg(long)]
    token_url: Option<String>,
    /// Username for the password grant
    #[arg(long)]
    username: Option<String>,
    /// Password for the password grant
    #[arg(long)]
    password: Option<String>,
    /// Resource to check as ENDPOINT:NAME (repeatable; replaces the file's list)
    #[arg(long = "resource")]
    resources: Vec<ResourceTarget>,
    /// Which objects teardown deletes: all or created
    #[arg(long)]
    teardown: Option<TeardownScope>,
    /// Id assumed not to exist, for the 404 scenarios
    #[arg(long)]
    missing_id: Option<i64>,
}

fn main() {
    let cli = Cli::parse();

    let default_level = match (&cli.command, cli.quiet) {
        (_, true) => "error",
        (Commands::ServeMock { .. }, false) => "info",
        (Commands::Run(_), false) => "warn",
    };
    init_logging(default_level);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to create tokio runtime: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Run(args) => {
            let config = match resolve_run_config(&args, |key| std::env::var(key).ok()) {
                Ok(config) => config,
                Err(e) => {
                    report_error(&e.to_string(), cli.output);
                    process::exit(2);
                }
            };
            let result = rt.block_on(runner::run_suites(
                &config.suite,
                &config.resources,
                cli.output,
            ));
            if result.failed > 0 {
                process::exit(1);
            }
        }
        Commands::ServeMock {
            port,
            endpoints,
            username,
            password,
        } => {
            if let Err(e) = rt.block_on(serve::start_mock(port, endpoints, username, password)) {
                eprintln!("Server error: {}", e);
                process::exit(1);
            }
        }
    }
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn report_error(message: &str, output: OutputFormat) {
    match output {
        OutputFormat::Json => {
            let err_json = serde_json::json!({ "error": message });
            eprintln!("{}", err_json);
        }
        OutputFormat::Text => eprintln!("error: {}", message),
    }
}

/// Merge settings with precedence flags > run file > environment.
fn resolve_run_config<F>(args: &RunArgs, env: F) -> ConformanceResult<RunConfig>
where
    F: Fn(&str) -> Option<String>,
{
    // URL flags stand in for their variables so a file or env may omit them.
    let lookup = |key: &str| match key {
        ENV_BASE_URL => args.base_url.clone().or_else(|| env(key)),
        ENV_TOKEN_URL => args.token_url.clone().or_else(|| env(key)),
        _ => env(key),
    };
    let mut config = match args.config {
        Some(ref path) => RunConfig::from_file_over(path, lookup)?,
        None => RunConfig {
            suite: SuiteConfig::from_lookup(lookup)?,
            resources: Vec::new(),
        },
    };

    if let Some(ref base_url) = args.base_url {
        config.suite.base_url = base_url.clone();
    }
    if let Some(ref token_url) = args.token_url {
        config.suite.token_url = token_url.clone();
    }
    if let Some(ref username) = args.username {
        config.suite.username = username.clone();
    }
    if let Some(ref password) = args.password {
        config.suite.password = password.clone();
    }
    if let Some(scope) = args.teardown {
        config.suite.teardown = scope;
    }
    if let Some(missing_id) = args.missing_id {
        config.suite.missing_id = missing_id;
    }
    if !args.resources.is_empty() {
        config.resources = args.resources.clone();
    }

    config.suite.validate()?;
    config.ensure_resources()?;
    Ok(config)
}
