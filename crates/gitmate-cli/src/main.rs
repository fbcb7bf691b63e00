use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use gitmate_application::{SessionManager, WorkspaceController};
use gitmate_core::chat::ChatModel;
use gitmate_core::config::GitMateConfig;
use gitmate_infrastructure::{ConfigService, GitMatePaths, JsonWorkspaceRepository};
use gitmate_interaction::{GeminiChatProvider, GitHubRepositoryReader};

mod repl;

#[derive(Parser)]
#[command(name = "gitmate")]
#[command(about = "GitMate - pair-program with an LLM over a GitHub repository's files", long_about = None)]
struct Cli {
    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a workspace (or resume the saved one) and chat
    Chat {
        /// GitHub repository URL; omit to resume the saved workspace
        repo_url: Option<String>,
        /// flash or pro
        #[arg(long)]
        model: Option<String>,
    },
    /// List a directory of the saved workspace's repository
    Ls {
        /// Directory inside the repository; the root when omitted
        path: Option<String>,
    },
    /// Print (or write) a script that recreates the context files
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Forget the saved workspace
    Reset,
}

fn init_tracing(verbose: bool, paths: &GitMatePaths) -> Result<Option<WorkerGuard>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("gitmate=info"));

    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    }

    let logs_dir = paths.logs_dir()?;
    std::fs::create_dir_all(&logs_dir)
        .with_context(|| format!("failed to create {}", logs_dir.display()))?;
    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(logs_dir, "gitmate.log"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

fn build_controller(config_service: &ConfigService) -> Result<(WorkspaceController, GitMateConfig)> {
    let config = config_service.load_config()?;
    let secrets = config_service.load_secrets()?;
    if secrets.gemini_api_key().is_none() {
        tracing::warn!("No Gemini API key configured");
    }

    let provider = GeminiChatProvider::new(secrets.gemini_api_key().map(str::to_string))
        .with_base_url(config.gemini.base_url.clone())
        .with_temperature(config.gemini.temperature);
    let reader = GitHubRepositoryReader::new()
        .with_api_base(config.github.api_base.clone())
        .with_user_agent(config.github.user_agent.clone());
    let repository = JsonWorkspaceRepository::new(config_service.paths().workspace_file()?);

    let controller = WorkspaceController::new(
        Arc::new(SessionManager::new(Arc::new(provider))),
        Arc::new(repository),
        Arc::new(reader),
    );
    Ok((controller, config))
}

async fn restore_or_fail(controller: &WorkspaceController) -> Result<()> {
    if !controller.restore().await? {
        bail!("No saved workspace. Start one with `gitmate chat <REPO_URL>`.");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let paths = GitMatePaths::new(None);
    let _guard = init_tracing(cli.verbose, &paths)?;

    let config_service = ConfigService::new(paths);
    let (controller, config) = build_controller(&config_service)?;

    match cli.command {
        Commands::Chat { repo_url, model } => {
            match repo_url {
                Some(url) => {
                    let model = match model {
                        Some(model) => ChatModel::from_str(&model)?,
                        None => config.default_model,
                    };
                    controller.start(&url, model).await?;
                }
                None => {
                    restore_or_fail(&controller).await?;
                    if let Some(model) = model {
                        controller.switch_model(ChatModel::from_str(&model)?).await?;
                    }
                }
            }
            if !controller.sessions().is_initialized().await {
                eprintln!(
                    "{}",
                    "No chat session: set GEMINI_API_KEY or fill in secret.json. Messages will fail until then."
                        .yellow()
                );
            }
            repl::run(&controller).await?;
        }
        Commands::Ls { path } => {
            restore_or_fail(&controller).await?;
            for node in controller
                .list_directory(path.as_deref().unwrap_or(""))
                .await?
            {
                if node.is_dir() {
                    println!("{}/", node.path);
                } else {
                    println!("{}", node.path);
                }
            }
        }
        Commands::Export { output } => {
            restore_or_fail(&controller).await?;
            let script = controller.export_script().await?;
            match output {
                Some(output) => {
                    std::fs::write(&output, script)
                        .with_context(|| format!("failed to write {}", output.display()))?;
                    println!("Wrote {}", output.display());
                }
                None => print!("{script}"),
            }
        }
        Commands::Reset => {
            controller.exit().await?;
            println!("Saved workspace removed.");
        }
    }

    Ok(())
}
