mod config;
mod worker;

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use callback::HttpCallbackSender;
use clap::{Args, Parser, Subcommand};
use executor::{ProcessContext, ProcessContextBuilder, ProcessExecutor, TokioProcessExecutor};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::WorkerConfig;
use crate::worker::{run_and_report, CallbackTarget};

#[derive(Parser)]
#[command(name = "reqour-worker")]
#[command(about = "Run build tooling and report the outcome to an orchestrator", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to $XDG_CONFIG_HOME/reqour/worker.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file
    Init {
        #[arg(long)]
        force: bool,
    },
    /// Run a command, stream its output and optionally send a callback
    Run {
        #[command(flatten)]
        process: ProcessArgs,

        /// URL receiving the outcome callback
        #[arg(long)]
        callback_url: Option<String>,

        /// HTTP method for the callback (defaults to the configured one)
        #[arg(long, requires = "callback_url")]
        callback_method: Option<String>,

        /// Correlation id sent in the callback (a random uuid if omitted)
        #[arg(long, requires = "callback_url")]
        task_id: Option<String>,
    },
    /// Run a command and print only what it wrote to stdout
    Capture {
        #[command(flatten)]
        process: ProcessArgs,
    },
}

#[derive(Args)]
struct ProcessArgs {
    /// Directory the command runs in
    #[arg(short, long, default_value = ".")]
    workdir: PathBuf,

    /// Extra environment variable, KEY=VALUE (repeatable)
    #[arg(short, long = "env", value_parser = parse_env_var)]
    env: Vec<(String, String)>,

    /// Executable and arguments
    #[arg(last = true, required = true)]
    command: Vec<String>,
}

impl ProcessArgs {
    fn into_builder(self, config: &WorkerConfig) -> ProcessContextBuilder {
        ProcessContext::builder()
            .command(self.command)
            .working_directory(self.workdir)
            .envs(config.process.env.clone())
            .envs(self.env)
    }
}

fn parse_env_var(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", s)),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Commands::Init { force } => {
            init_config(cli.config, force).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Run {
            process,
            callback_url,
            callback_method,
            task_id,
        } => {
            let config = WorkerConfig::load(cli.config.as_deref()).await?;
            let target = callback_url.map(|url| CallbackTarget {
                method: callback_method.unwrap_or_else(|| config.callback.method.clone()),
                url,
                id: task_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            });
            let code = run(&config, process, target.as_ref()).await?;
            Ok(exit_code(code))
        }
        Commands::Capture { process } => {
            let config = WorkerConfig::load(cli.config.as_deref()).await?;
            let builder = process
                .into_builder(&config)
                .stderr_consumer(|line| eprintln!("{}", line));
            let captured = TokioProcessExecutor::new().stdout(builder).await?;

            let mut stdout = std::io::stdout().lock();
            stdout.write_all(captured.as_bytes())?;
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run(
    config: &WorkerConfig,
    process: ProcessArgs,
    target: Option<&CallbackTarget>,
) -> Result<i32> {
    let context = process
        .into_builder(config)
        .stdout_consumer(|line| println!("{}", line))
        .stderr_consumer(|line| eprintln!("{}", line))
        .build()?;

    let sender = HttpCallbackSender::with_timeout(config.callback.timeout())?;
    run_and_report(&TokioProcessExecutor::new(), &sender, context, target).await
}

async fn init_config(explicit: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match explicit {
        Some(path) => path,
        None => WorkerConfig::default_path().context("No config directory on this platform")?,
    };

    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        return Ok(());
    }

    WorkerConfig::default().write(&path).await?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(exit_status_byte(code))
}

/// Exit codes outside 0..=255 (negative, or unknown) collapse to 1.
fn exit_status_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

fn init_tracing() {
    // Logs go to stderr; stdout carries the command's own output.
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reqour_worker=info,executor=info,callback=info".into()),
        )
        .init();
}
