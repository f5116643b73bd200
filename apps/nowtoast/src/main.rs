use anyhow::{Context, Result};
use clap::Parser;
use nowtoast_core::{Config, LinuxBackend, Toast, ToastClock, TrackChangeDetector};
use nowtoast_media_session::{create_fetcher, MediaListener};
use std::io::BufRead;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// How often the consumer looks at the latest snapshot
const TICK: Duration = Duration::from_millis(100);

#[derive(Parser, Debug)]
#[command(name = "nowtoast", version, about = "Shows a notification whenever a new track starts playing")]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the poll interval in milliseconds
    #[arg(long)]
    interval_ms: Option<u64>,

    /// Linux backend: auto, playerctl or dbus
    #[arg(long)]
    backend: Option<LinuxBackend>,

    /// Poll once, print the snapshot and exit
    #[arg(long)]
    once: bool,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(args.verbose).into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => config_path()?,
    };
    tracing::debug!("Config path: {}", config_path.display());

    let mut config = Config::load_or_default(&config_path)?;
    if let Some(ms) = args.interval_ms {
        config.listener.poll_interval_ms = ms;
    }
    if let Some(backend) = args.backend {
        config.listener.linux_backend = backend;
    }

    if args.once {
        return print_once(&config, args.json);
    }
    run(config, args.json).await
}

fn print_once(config: &Config, json: bool) -> Result<()> {
    let fetcher = create_fetcher(&config.listener).context("No media backend for this system")?;
    let snapshot = fetcher
        .fetch_current_track()
        .with_context(|| format!("Failed to query {}", fetcher.name()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else if snapshot.is_playing() {
        println!("{}", snapshot.display_name());
    } else {
        println!("No music playing");
    }
    Ok(())
}

async fn run(config: Config, json: bool) -> Result<()> {
    let listener = MediaListener::for_current_platform(&config.listener).context("No media backend for this system")?;
    listener.start()?;
    tracing::info!("Watching for track changes, press Enter to show the current track, Ctrl-C to quit");

    let reader = listener.reader();
    let mut detector = TrackChangeDetector::new(config.toast.clone());
    let mut clock = ToastClock::new(&config.toast);
    let mut ticker = tokio::time::interval(TICK);
    let mut stdin = Some(spawn_line_reader(std::io::BufReader::new(std::io::stdin())));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let now = Instant::now();
                let snapshot = reader.current_snapshot();
                if let Some(toast) = detector.observe(snapshot.as_deref(), clock.is_visible(now)) {
                    show(&toast, json)?;
                    clock.show(now);
                }
            }
            line = next_line(&mut stdin) => {
                match line {
                    Some(_) => {
                        let snapshot = reader.current_snapshot();
                        let toast = detector.on_demand(snapshot.as_deref());
                        show(&toast, json)?;
                        clock.show(Instant::now());
                    }
                    None => {
                        tracing::debug!("stdin closed, on-demand toasts disabled");
                        stdin = None;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
        }
    }

    // A poll stuck in a helper program must not hold up exit
    listener.stop();
    Ok(())
}

/// Per-poll failures are logged at debug and stay hidden unless asked for
fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Forward input lines from a plain thread. A read blocked there is
/// abandoned at exit instead of being waited for.
fn spawn_line_reader<R: BufRead + Send + 'static>(input: R) -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = std::thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in input.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        tracing::warn!("On-demand toasts unavailable: {}", e);
    }
    rx
}

async fn next_line(stdin: &mut Option<mpsc::UnboundedReceiver<String>>) -> Option<String> {
    match stdin {
        Some(lines) => lines.recv().await,
        None => std::future::pending().await,
    }
}

fn show(toast: &Toast, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(toast)?);
    } else {
        println!("{}: {} - {}", toast.heading, toast.title, toast.artist);
    }
    Ok(())
}

/// Config file location (platform-specific)
fn config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Failed to get config directory"))?
        .join("nowtoast");

    Ok(config_dir.join("config.toml"))
}
