//! mindful CLI: terminal client for the Mindful Chatbox backend

use clap::{Parser, Subcommand, ValueEnum};
use mindful_engine::{
    ChatBackend, ClientConfig, ConversationController, ConversationId, FeedbackModal,
    HttpChatClient, LocalStore, Message, NotificationKind, Sender, ThemeMode, TurnOutcome,
};
use std::error::Error;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

/// Chat with the Mindful mental-health assistant from the terminal
#[derive(Parser)]
#[command(name = "mindful")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Backend root URL (overrides config and MINDFUL_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding config, preferences and logs
    #[arg(long, global = true, default_value = STATE_DIR)]
    state_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the chat TUI (default when no command specified)
    Tui,

    /// Send one message and print the reply
    Send {
        /// The message text
        message: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print recent conversation history, oldest first
    History {
        /// Number of exchanges to fetch (default: config `history_limit`)
        #[arg(long)]
        limit: Option<usize>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rate a bot reply
    Feedback {
        /// Conversation id shown next to the reply
        conversation_id: ConversationId,

        /// Was the reply helpful
        #[arg(value_enum)]
        rating: Rating,

        /// Optional comment
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Print or change the stored theme
    Theme {
        /// New theme; prints the current one when omitted
        #[arg(value_enum)]
        mode: Option<ThemeArg>,
    },

    /// Print configuration and check the backend
    Doctor {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a default config file
    Init,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Rating {
    Helpful,
    NotHelpful,
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    Toggle,
}

const STATE_DIR: &str = ".mindful";
const CONFIG_FILE: &str = "config.json";
const LOG_FILE: &str = "mindful.log";
const DEFAULT_LOG_FILTER: &str = "warn,mindful=info";

type CliResult = Result<(), Box<dyn Error>>;

fn main() {
    let cli = Cli::parse();
    let state_dir = cli.state_dir.as_path();

    let result = match cli.command {
        None | Some(Commands::Tui) => cmd_tui(state_dir, cli.api_url),
        Some(Commands::Send { message, json }) => {
            init_logging(None);
            cmd_send(state_dir, cli.api_url, &message, json)
        }
        Some(Commands::History { limit, json }) => {
            init_logging(None);
            cmd_history(state_dir, cli.api_url, limit, json)
        }
        Some(Commands::Feedback {
            conversation_id,
            rating,
            comment,
        }) => {
            init_logging(None);
            let helpful = rating == Rating::Helpful;
            cmd_feedback(state_dir, cli.api_url, conversation_id, helpful, &comment)
        }
        Some(Commands::Theme { mode }) => {
            init_logging(None);
            cmd_theme(state_dir, cli.api_url, mode)
        }
        Some(Commands::Doctor { json }) => {
            init_logging(None);
            cmd_doctor(state_dir, cli.api_url, json)
        }
        Some(Commands::Init) => {
            init_logging(None);
            cmd_init(state_dir)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

/// Install the tracing subscriber. `RUST_LOG` wins over the default filter.
/// With a log file, output goes there instead of stderr.
fn init_logging(log_file: Option<&Path>) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let file = log_file.and_then(|path| {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        OpenOptions::new().create(true).append(true).open(path).ok()
    });

    match file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

/// Config file, then `MINDFUL_API_URL`, then `--api-url`.
fn load_config(state_dir: &Path, api_url: Option<String>) -> Result<ClientConfig, Box<dyn Error>> {
    let config = ClientConfig::load_or_default(&state_dir.join(CONFIG_FILE))?
        .with_env_overrides()
        .with_api_url_override(api_url);
    debug!(api = %config.base_url(), "Configuration loaded");
    Ok(config)
}

/// HTTP client with the saved session restored.
fn connect(config: &ClientConfig, store: &LocalStore) -> Result<Arc<HttpChatClient>, Box<dyn Error>> {
    let client = HttpChatClient::new(config)?;
    client.load_session(store, &config.session_key);
    Ok(Arc::new(client))
}

fn save_session(client: &HttpChatClient, store: &mut LocalStore, config: &ClientConfig) {
    if let Err(e) = client.save_session(store, &config.session_key) {
        warn!(error = %e, "Failed to save session");
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, Box<dyn Error>> {
    Ok(tokio::runtime::Runtime::new()?)
}

fn cmd_tui(state_dir: &Path, api_url: Option<String>) -> CliResult {
    init_logging(Some(&state_dir.join(LOG_FILE)));
    let config = load_config(state_dir, api_url)?;
    let rt = runtime()?;
    rt.block_on(mindful_tui::run_tui(config, state_dir))
}

fn cmd_send(state_dir: &Path, api_url: Option<String>, message: &str, json: bool) -> CliResult {
    let config = load_config(state_dir, api_url)?;
    let mut store = LocalStore::open(state_dir)?;
    let client = connect(&config, &store)?;
    let rt = runtime()?;

    let mut controller = ConversationController::new(Arc::clone(&client), &config);
    let outcome = rt.block_on(controller.send(message));
    save_session(&client, &mut store, &config);

    let reply = match outcome {
        TurnOutcome::Replied(reply) => reply,
        TurnOutcome::Failed(e) => return Err(e.into()),
        TurnOutcome::Ignored => return Err("message is empty".into()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
        return Ok(());
    }

    if reply.is_crisis {
        println!("⚠ {}", reply.response);
    } else {
        println!("{}", reply.response);
    }
    let intent = reply.intent.as_deref().unwrap_or("-");
    println!("\n[conversation {} · intent {intent}]", reply.conversation_id);
    Ok(())
}

fn cmd_history(
    state_dir: &Path,
    api_url: Option<String>,
    limit: Option<usize>,
    json: bool,
) -> CliResult {
    let config = load_config(state_dir, api_url)?;
    let store = LocalStore::open(state_dir)?;
    let client = connect(&config, &store)?;
    let rt = runtime()?;

    let limit = limit.unwrap_or(config.history_limit);
    let mut entries = rt.block_on(client.get_history(limit));
    entries.reverse();

    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
        return Ok(());
    }

    if entries.is_empty() {
        println!("No history");
        return Ok(());
    }

    for message in entries.iter().flat_map(Message::from_history) {
        let time = message.timestamp.format("%Y-%m-%d %H:%M");
        match (&message.sender, &message.conversation_id) {
            (Sender::User, _) => println!("[{time}] Bạn: {}", message.text),
            (Sender::Bot, Some(id)) => {
                let marker = if message.is_crisis { "⚠ " } else { "" };
                println!("[{time}] {marker}Mindful (#{id}): {}", message.text);
                println!();
            }
            (Sender::Bot, None) => println!("[{time}] Mindful: {}", message.text),
        }
    }
    Ok(())
}

fn cmd_feedback(
    state_dir: &Path,
    api_url: Option<String>,
    conversation_id: ConversationId,
    helpful: bool,
    comment: &str,
) -> CliResult {
    let config = load_config(state_dir, api_url)?;
    let store = LocalStore::open(state_dir)?;
    let client = connect(&config, &store)?;
    let rt = runtime()?;

    let mut modal = FeedbackModal::new();
    modal.open_for(conversation_id);
    modal.comment = comment.to_string();

    let Some(notification) = rt.block_on(modal.submit(&*client, helpful)) else {
        return Err("no conversation to rate".into());
    };

    match notification.kind {
        NotificationKind::Success => {
            println!("{}", notification.text);
            Ok(())
        }
        NotificationKind::Error => Err(notification.text.into()),
    }
}

fn cmd_theme(state_dir: &Path, api_url: Option<String>, mode: Option<ThemeArg>) -> CliResult {
    let config = load_config(state_dir, api_url)?;
    let mut store = LocalStore::open(state_dir)?;

    let theme = match mode {
        None => ThemeMode::load(&store, &config.theme_key),
        Some(ThemeArg::Toggle) => ThemeMode::toggle(&mut store, &config.theme_key)?,
        Some(ThemeArg::Light) => {
            ThemeMode::Light.save(&mut store, &config.theme_key)?;
            ThemeMode::Light
        }
        Some(ThemeArg::Dark) => {
            ThemeMode::Dark.save(&mut store, &config.theme_key)?;
            ThemeMode::Dark
        }
    };

    println!("{theme}");
    Ok(())
}

fn cmd_doctor(state_dir: &Path, api_url: Option<String>, json: bool) -> CliResult {
    let config = load_config(state_dir, api_url)?;
    let store = LocalStore::open(state_dir)?;
    let client = connect(&config, &store)?;
    let rt = runtime()?;

    let health = rt.block_on(client.health());
    let has_session = client.session_cookie().is_some();
    let theme = ThemeMode::load(&store, &config.theme_key);

    if json {
        let output = serde_json::json!({
            "config": config,
            "state_dir": state_dir,
            "theme": theme.as_str(),
            "session": has_session,
            "health": match &health {
                Ok(status) => serde_json::to_value(status)?,
                Err(e) => serde_json::json!({ "error": e.to_string() }),
            },
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!("Mindful Doctor\n");
    println!("  Backend:   {}", config.base_url());
    println!("  State dir: {}", state_dir.display());
    println!("  Theme:     {theme}");
    println!(
        "  Session:   {}",
        if has_session { "saved" } else { "none" }
    );
    println!("  Timeout:   {}s", config.request_timeout().as_secs());
    println!();

    match health {
        Ok(status) => {
            let service = status.service.as_deref().unwrap_or("unknown service");
            println!("Backend {}: {service}", status.status);
            Ok(())
        }
        Err(e) => Err(format!("backend unreachable: {e}").into()),
    }
}

fn cmd_init(state_dir: &Path) -> CliResult {
    let config_path = state_dir.join(CONFIG_FILE);
    if config_path.exists() {
        println!("Config already exists at {}", config_path.display());
        return Ok(());
    }

    ClientConfig::default().save(&config_path)?;
    println!("Created {}", config_path.display());
    println!("\nEdit api_base_url there or set MINDFUL_API_URL to point at your backend");
    Ok(())
}
