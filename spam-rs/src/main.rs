//! spam-rs: train, serve and query the spam classifier

use clap::{Parser, Subcommand};
use spam_rs::api::{ApiServer, ModelHandle};
use spam_rs::config::LoggingConfig;
use spam_rs::{Config, TrainingJob};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "spam-rs")]
#[command(about = "Spam/ham text classifier", version)]
struct Cli {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, default_value = "config/config.yaml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train, save and evaluate a model
    Train,
    /// Serve predictions over HTTP
    Serve {
        /// Listen address (overrides server.listen_addr)
        #[arg(long)]
        addr: Option<String>,
    },
    /// Classify messages with the saved model
    Predict {
        /// Messages to classify
        #[arg(required = true)]
        texts: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_file(&cli.config)?;

    let _log_guard = init_logging(&config.logging)?;
    info!(
        "spam-rs v{} using {}",
        env!("CARGO_PKG_VERSION"),
        cli.config.display()
    );

    match cli.command {
        Commands::Train => {
            let outcome = TrainingJob::new(config).run()?;
            println!("{}", outcome.report);
            println!("Model saved to {}", outcome.model_path.display());
        }
        Commands::Serve { addr } => {
            // Load failure is fatal: the server never starts without a model
            let model = ModelHandle::load(&config.paths.model_save_path)?;
            let addr = addr.unwrap_or_else(|| config.server.listen_addr.clone());

            let mut server = ApiServer::new(model, addr);
            if let Some(ref dir) = config.server.static_dir {
                server = server.with_static_dir(dir);
            }
            server.run().await?;
        }
        Commands::Predict { texts } => {
            let model = ModelHandle::load(&config.paths.model_save_path)?;
            for text in &texts {
                let prediction = model.predict(text)?;
                let probabilities: Vec<String> = prediction
                    .probabilities
                    .iter()
                    .map(|(label, p)| format!("{}={:.4}", label, p))
                    .collect();
                println!(
                    "{:<5} {:.4}  [{}]  {}",
                    prediction.label,
                    prediction.confidence,
                    probabilities.join(", "),
                    text
                );
            }
        }
    }

    Ok(())
}

fn init_logging(logging: &LoggingConfig) -> anyhow::Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("spam_rs={},tower_http=info", logging.level).into());

    let (file_layer, guard) = match logging.file.as_deref() {
        Some(file) => {
            let appender = log_file_appender(Path::new(file))?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(fmt::layer().with_writer(writer).with_ansi(false)), Some(guard))
        }
        None => (None, None),
    };

    let registry = tracing_subscriber::registry().with(filter).with(file_layer);
    match logging.format.as_str() {
        "json" => registry.with(fmt::layer().json()).init(),
        "compact" => registry.with(fmt::layer().compact()).init(),
        _ => registry.with(fmt::layer()).init(),
    }
    Ok(guard)
}

fn log_file_appender(path: &Path) -> anyhow::Result<RollingFileAppender> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid log file path {}", path.display()))?;
    std::fs::create_dir_all(dir)?;

    Ok(RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .build(dir)?)
}
