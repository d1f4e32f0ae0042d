use std::io::{self, Write};
use std::sync::Arc;
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use doggo_core::{cancel_pair, validate, ChatClient, Config, StreamOutcome};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

const DEFAULT_LOG_FILTER: &str = "doggo_tui=info,doggo_core=info";

#[derive(Parser)]
#[command(name = "doggo", version)]
#[command(about = "Translate between English and Doggolingo with a streaming chat endpoint")]
struct Cli {
    /// Chat endpoint URL (overrides config and DOGGO_CHAT_URL)
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Response framing: sse or raw-json (overrides config and DOGGO_FRAMING)
    #[arg(long, global = true)]
    framing: Option<String>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat (default)
    Chat,
    /// Send one message and stream the reply to stdout
    Send {
        /// Message to translate
        message: String,
        /// eng_to_doggo or doggo_to_eng (defaults to the configured direction)
        #[arg(short, long)]
        direction: Option<String>,
    },
    /// Show the resolved configuration
    Config,
}

/// Log to a daily file; the TUI owns the terminal
fn setup_logging() -> Result<WorkerGuard> {
    let log_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow!("Could not determine data directory"))?
        .join("doggo-chat")
        .join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = tracing_appender::rolling::daily(&log_dir, "doggo.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().with_ansi(false).with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = setup_logging()?;

    let mut config = Config::load()
        .unwrap_or_else(|e| {
            tracing::warn!("could not read config, using defaults: {}", e);
            Config::new()
        })
        .apply_env()?;
    config.apply_overrides(cli.endpoint, cli.framing)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => run_tui(config).await,
        Commands::Send { message, direction } => send_once(&config, &message, direction.as_deref()).await,
        Commands::Config => show_config(&config),
    }
}

async fn run_tui(config: Config) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();
    let mut app = App::new(config, events.sender());

    tracing::info!(
        "starting chat against {} ({})",
        app.client().endpoint(),
        app.client().framing().as_str()
    );

    let result = run_loop(&mut terminal, &mut app, &mut events).await;

    app.shutdown();
    tui::restore()?;
    result
}

async fn run_loop(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

async fn send_once(config: &Config, message: &str, direction: Option<&str>) -> Result<()> {
    let direction = direction.unwrap_or(config.direction().as_str());
    let request = validate(message, direction)?;

    let client = ChatClient::new(config.endpoint(), config.framing())
        .with_idle_timeout(config.idle_timeout());

    let (cancel, token) = cancel_pair();
    let cancel = Arc::new(cancel);
    let ctrl_c = Arc::clone(&cancel);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    // A closed pipe (e.g. `| head`) stops the request instead of draining it
    let mut output = FragmentWriter::new(io::stdout());
    let outcome = client
        .stream_reply(&request, token, |fragment| {
            if !output.write(&fragment) {
                cancel.cancel();
            }
        })
        .await;
    output.finish()?;

    match outcome {
        StreamOutcome::Completed(summary) => {
            if summary.malformed > 0 {
                eprintln!("({} malformed frames skipped)", summary.malformed);
            }
            Ok(())
        }
        StreamOutcome::Failed(e) => Err(anyhow!("Something went wrong: {}", e)),
        StreamOutcome::Cancelled => {
            eprintln!("Request cancelled.");
            Ok(())
        }
    }
}

/// Writes fragments as they arrive and keeps the first write error
struct FragmentWriter<W> {
    out: W,
    error: Option<io::Error>,
}

impl<W: Write> FragmentWriter<W> {
    fn new(out: W) -> Self {
        Self { out, error: None }
    }

    /// Returns false once the output has failed
    fn write(&mut self, fragment: &str) -> bool {
        if self.error.is_some() {
            return false;
        }
        match write!(self.out, "{}", fragment).and_then(|_| self.out.flush()) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("stopping output: {}", e);
                self.error = Some(e);
                false
            }
        }
    }

    /// End the reply with a newline, or report the earlier failure
    fn finish(mut self) -> io::Result<()> {
        if let Some(e) = self.error.take() {
            return Err(e);
        }
        writeln!(self.out)?;
        self.out.flush()
    }
}

fn show_config(config: &Config) -> Result<()> {
    println!("config file:   {}", Config::get_config_path()?.display());
    println!("endpoint:      {}", config.endpoint());
    println!("framing:       {}", config.framing().as_str());
    println!("direction:     {}", config.direction().as_str());
    match config.idle_timeout() {
        Some(timeout) => println!("idle timeout:  {}s", timeout.as_secs()),
        None => println!("idle timeout:  disabled"),
    }
    Ok(())
}
