use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt, reload};
use youtube_broadcast::config::ConfigFile;
use youtube_broadcast::credentials::{CredentialManager, DEFAULT_TOKEN_FILE, TokenFile};
use youtube_broadcast::oauth::OAuthManager;
use youtube_broadcast::orchestrator::{BroadcastOrchestrator, Lookup, NewStream, StopOutcome};
use youtube_broadcast::youtube_api::{FrameRate, IngestionType, Resolution};
use youtube_broadcast::{AuthError, Error};

/// Manage YouTube streams and broadcasts.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, default_value = "config.json")]
    config: PathBuf,

    /// Where the OAuth credential is cached
    #[arg(long, global = true, default_value = DEFAULT_TOKEN_FILE)]
    token_file: PathBuf,

    /// Log file that every run appends to, in addition to stderr
    #[arg(long, global = true, default_value = "yt-broadcast.log")]
    log_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Open the browser to log in again and cache the new credential
    Login,
    /// Create a new ingest stream and print its id and stream key
    CreateStream {
        /// Stream name
        #[arg(long)]
        name: String,
        /// Ingestion type for the stream
        #[arg(long, value_enum)]
        stream_type: IngestionType,
        /// Stream resolution
        #[arg(long, value_enum)]
        resolution: Resolution,
        /// Stream frame rate
        #[arg(long, value_enum)]
        fps: FrameRate,
    },
    /// Create a broadcast and bind the configured stream to it
    StartBroadcast,
    /// End the broadcast created by the last start-broadcast
    StopBroadcast,
    /// Show the configured stream and the stored broadcast
    Status,
}

fn env_filter(default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .from_env_lossy()
}

/// Appends plain-text log lines to `path`.
fn log_file_layer<S>(path: &Path) -> io::Result<impl Layer<S> + use<S>>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    Ok(fmt::layer().with_writer(Arc::new(file)).with_ansi(false))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (file_layer, log_file_error) = match log_file_layer(&cli.log_file) {
        Ok(layer) => (Some(layer), None),
        Err(e) => (None, Some(e)),
    };

    // The level from the config file is only known after loading it.
    let (filter, filter_handle) = reload::Layer::new(env_filter(LevelFilter::INFO));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(std::io::stderr().is_terminal()),
        )
        .with(file_layer)
        .init();
    if let Some(e) = log_file_error {
        tracing::warn!("not logging to {}: {e}", cli.log_file.display());
    }

    match run(cli, filter_handle).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => fail(e),
    }
}

fn fail(e: Error) -> ExitCode {
    let code = e.exit_code();
    // remote failures were already logged where they happened, with their ids
    if !matches!(e, Error::Remote { .. }) {
        tracing::error!("{:#}", eyre::Report::new(e));
    }
    ExitCode::from(code)
}

async fn run(cli: Cli, filter_handle: reload::Handle<EnvFilter, Registry>) -> Result<(), Error> {
    let config_file = ConfigFile::new(&cli.config);
    let config = config_file.load().await?;

    let level = config.logger.level_filter();
    if let Err(e) = filter_handle.reload(env_filter(level)) {
        tracing::warn!("could not apply log level {level}: {e}");
    }
    tracing::debug!(?config, "configuration validated");

    let http = reqwest::Client::builder()
        .build()
        .map_err(|e| AuthError::Consent(eyre::Report::new(e)))?;
    let oauth = OAuthManager::new().map_err(AuthError::Consent)?;
    let credentials = CredentialManager::new(
        oauth,
        TokenFile::new(&cli.token_file),
        config_file.resolve(&config.youtube_settings.credentials_file),
        http,
    );
    let mut orchestrator = BroadcastOrchestrator::new(credentials, config_file, config);

    match cli.command {
        Command::Login => {
            orchestrator.login().await?;
            println!("Logged in; credential cached in {}", cli.token_file.display());
        }
        Command::CreateStream {
            name,
            stream_type,
            resolution,
            fps,
        } => {
            let stream = orchestrator
                .create_stream(NewStream {
                    name,
                    ingestion_type: stream_type,
                    resolution,
                    frame_rate: fps,
                })
                .await?;
            println!("stream_id: {}", stream.id);
            if let Some(info) = stream.cdn.and_then(|cdn| cdn.ingestion_info) {
                println!("ingestion address: {}", info.ingestion_address);
                println!("stream key: {}", info.stream_name);
            }
            println!("Put the stream_id under `stream_settings` in your config.");
        }
        Command::StartBroadcast => {
            let started = orchestrator.start_broadcast().await?;
            println!("broadcast_id: {}", started.broadcast_id);
            println!("title: {}", started.title);
            if !started.persisted {
                println!(
                    "The broadcast id could not be written to {}; stop-broadcast will not find it.",
                    cli.config.display()
                );
            }
        }
        Command::StopBroadcast => match orchestrator.stop_broadcast().await? {
            StopOutcome::Completed => println!("Broadcast ended."),
            StopOutcome::AlreadyComplete => println!("Broadcast had already ended."),
        },
        Command::Status => {
            let report = orchestrator.status().await?;
            match report.stream {
                Lookup::NotConfigured => println!("stream: not configured"),
                Lookup::NotFound { id } => println!("stream {id}: not found"),
                Lookup::Found(stream) => {
                    let (status, health) = stream
                        .status
                        .map(|s| {
                            (
                                s.stream_status.to_string(),
                                s.health_status.map(|h| h.status),
                            )
                        })
                        .unwrap_or_else(|| ("unknown".to_string(), None));
                    println!(
                        "stream {}: {status}, health {}",
                        stream.id,
                        health.as_deref().unwrap_or("unknown")
                    );
                }
            }
            match report.broadcast {
                Lookup::NotConfigured => println!("broadcast: none stored"),
                Lookup::NotFound { id } => println!("broadcast {id}: not found"),
                Lookup::Found(broadcast) => {
                    let lifecycle = broadcast
                        .status
                        .map(|s| s.life_cycle_status.to_string())
                        .unwrap_or_else(|| "unknown".to_string());
                    let title = broadcast.snippet.map(|s| s.title).unwrap_or_default();
                    println!("broadcast {} \"{title}\": {lifecycle}", broadcast.id);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use youtube_broadcast::{Precondition, RemoteOperation};
    use pretty_assertions::assert_eq;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn create_stream_parses_value_names() {
        let cli = Cli::try_parse_from([
            "yt-broadcast",
            "create-stream",
            "--name",
            "hive cam",
            "--stream-type",
            "rtmp",
            "--resolution",
            "1440p",
            "--fps",
            "30",
        ])
        .unwrap();

        let Command::CreateStream {
            name,
            stream_type,
            resolution,
            fps,
        } = cli.command
        else {
            panic!("expected create-stream");
        };
        assert_eq!(name, "hive cam");
        assert_eq!(stream_type, IngestionType::Rtmp);
        assert_eq!(resolution, Resolution::P1440);
        assert_eq!(fps, FrameRate::Fps30);
    }

    #[test]
    fn unsupported_values_are_rejected() {
        let base = ["yt-broadcast", "create-stream", "--name", "cam"];
        for extra in [
            ["--stream-type", "rtmp", "--resolution", "720p", "--fps", "25"],
            ["--stream-type", "dash", "--resolution", "720p", "--fps", "30"],
            ["--stream-type", "hls", "--resolution", "variable", "--fps", "60"],
        ] {
            let args = base.iter().chain(&extra).copied();
            assert!(Cli::try_parse_from(args).is_err(), "{extra:?}");
        }
    }

    #[test]
    fn global_paths_have_defaults() {
        let cli = Cli::try_parse_from(["yt-broadcast", "status"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("config.json"));
        assert_eq!(cli.token_file, PathBuf::from(DEFAULT_TOKEN_FILE));
        assert_eq!(cli.log_file, PathBuf::from("yt-broadcast.log"));
        assert!(matches!(cli.command, Command::Status));

        let cli = Cli::try_parse_from([
            "yt-broadcast",
            "stop-broadcast",
            "--config",
            "/etc/bees.json",
        ])
        .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/bees.json"));
    }

    #[test]
    fn log_file_receives_plain_lines_and_keeps_earlier_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yt-broadcast.log");
        std::fs::write(&path, "earlier run\n").unwrap();

        let subscriber = tracing_subscriber::registry().with(log_file_layer(&path).unwrap());
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(broadcast_id = "b-1", "broadcast ended");
        });

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("earlier run\n"), "{written}");
        assert!(written.contains("broadcast ended"), "{written}");
        assert!(written.contains("b-1"), "{written}");
        assert!(!written.contains('\x1b'), "{written}");
    }

    #[test]
    fn failures_are_logged_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("yt-broadcast.log");

        let subscriber = tracing_subscriber::registry().with(log_file_layer(&path).unwrap());
        tracing::subscriber::with_default(subscriber, || {
            fail(Error::Remote {
                operation: RemoteOperation::TransitionBroadcast,
                detail: eyre::eyre!("status 403 Forbidden"),
            });
            fail(Error::Precondition(Precondition::MissingBroadcastId));
        });

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("403"), "{written}");
        assert!(written.contains("no `broadcast_id` is stored"), "{written}");
    }
}
