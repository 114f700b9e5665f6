use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod analyze;
mod fetch;

#[derive(Debug, Parser)]
#[command(name = "portwatch_worker")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Download a transcript and remember it as the latest session.
    Fetch {
        /// Video identifier on the platform.
        #[arg(long)]
        content_id: String,
    },

    /// Score portfolio risk for the latest (or a given) transcript.
    Analyze {
        /// Analyze this transcript instead of the last fetched one.
        #[arg(long)]
        content_id: Option<String>,

        /// Number of worst findings to print.
        #[arg(long, default_value_t = 5)]
        top: usize,

        /// CSV destination. Defaults to financial_risk_output.csv in the data dir.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = portwatch_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Fetch { content_id } => fetch::run(&settings, &content_id).await,
        Command::Analyze {
            content_id,
            top,
            output,
        } => {
            let opts = analyze::AnalyzeOptions {
                content_id,
                top,
                output,
            };
            analyze::run(&settings, opts).await
        }
    };

    if let Err(err) = &result {
        sentry_anyhow::capture_anyhow(err);
        tracing::error!(error = %format!("{err:#}"), "portwatch run failed");
    }
    result
}

fn init_sentry(settings: &portwatch_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
