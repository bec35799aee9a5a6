mod app;

use std::path::{Path, PathBuf};

use {
    anyhow::Context,
    clap::{Parser, Subcommand},
    docchat_config::DocchatConfig,
    docchat_gateway::AppState,
    tracing::info,
    tracing_subscriber::EnvFilter,
};

#[derive(Parser)]
#[command(name = "docchat", version, about = "Upload a PDF and ask questions about it")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (TOML, YAML or JSON). Defaults to ./docchat.toml or the
    /// user config directory.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true, env = "DOCCHAT_LOG_JSON")]
    log_json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP gateway
    Serve {
        #[arg(long)]
        bind: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Directory uploaded files are stored in
        #[arg(long, value_name = "DIR")]
        upload_dir: Option<PathBuf>,

        /// Reject cross-origin requests
        #[arg(long)]
        no_cors: bool,
    },
    /// Answer one question about a local document
    Ask {
        file: PathBuf,

        question: String,

        /// Also print the passages the answer was based on
        #[arg(long)]
        sources: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let mut config = docchat_config::discover_and_load(cli.config.as_deref())
        .context("failed to load configuration")?;

    match cli.command {
        Commands::Serve {
            bind,
            port,
            upload_dir,
            no_cors,
        } => {
            apply_serve_flags(&mut config, bind, port, upload_dir, no_cors);
            config.validate()?;
            serve(config).await
        },
        Commands::Ask {
            file,
            question,
            sources,
        } => ask(&config, &file, &question, sources).await,
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn apply_serve_flags(
    config: &mut DocchatConfig,
    bind: Option<String>,
    port: Option<u16>,
    upload_dir: Option<PathBuf>,
    no_cors: bool,
) {
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    if let Some(dir) = upload_dir {
        config.server.upload_dir = dir;
    }
    if no_cors {
        config.server.cors = false;
    }
}

async fn serve(config: DocchatConfig) -> anyhow::Result<()> {
    let chat = app::build_chat(&config)?;
    let state = AppState::new(chat, config.server.upload_dir.clone())
        .with_max_sessions(config.server.max_sessions);

    docchat_gateway::serve(&config.server, state, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown requested");
    })
    .await
    .with_context(|| {
        format!(
            "gateway failed on {}:{}",
            config.server.bind, config.server.port
        )
    })
}

async fn ask(
    config: &DocchatConfig,
    file: &Path,
    question: &str,
    show_sources: bool,
) -> anyhow::Result<()> {
    let chat = app::build_chat(config)?;
    let path = file.to_string_lossy();
    let answer = chat.answer_with_sources(&path, question).await?;

    println!("{}", answer.text);
    if show_sources {
        for passage in &answer.sources {
            println!("\n[page {}, passage {}]\n{}", passage.page, passage.index, passage.text);
        }
    }
    Ok(())
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serve_flags_override_config() {
        let cli = Cli::try_parse_from([
            "docchat",
            "serve",
            "--port",
            "8080",
            "--upload-dir",
            "/tmp/docs",
            "--no-cors",
        ])
        .unwrap();
        let Commands::Serve {
            bind,
            port,
            upload_dir,
            no_cors,
        } = cli.command
        else {
            panic!("expected serve");
        };

        let mut config = DocchatConfig::default();
        apply_serve_flags(&mut config, bind, port, upload_dir, no_cors);
        assert_eq!(config.server.bind, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.upload_dir, PathBuf::from("/tmp/docs"));
        assert!(!config.server.cors);
    }

    #[test]
    fn ask_takes_file_and_question() {
        let cli = Cli::try_parse_from([
            "docchat",
            "--config",
            "docchat.yaml",
            "ask",
            "report.pdf",
            "What is the conclusion?",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("docchat.yaml")));
        match cli.command {
            Commands::Ask {
                file,
                question,
                sources,
            } => {
                assert_eq!(file, PathBuf::from("report.pdf"));
                assert_eq!(question, "What is the conclusion?");
                assert!(!sources);
            },
            Commands::Serve { .. } => panic!("expected ask"),
        }
    }
}
