//! CLI command definitions, routing, and tracing setup.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use huddle_core::{Knowledge, Message, Responder};
use huddle_search::{DisabledSearch, SearchProvider, SerpApiProvider};
use huddle_shared::{
    AppConfig, ChatRequest, HistoryTurn, OffDomainPolicy, init_config, load_config,
    load_config_from, resolve_api_key,
};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// First line the bot says in an interactive chat.
const CHAT_OPENING: &str = "Hola";

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// Huddle: answers questions about the NFL.
#[derive(Parser)]
#[command(
    name = "huddle",
    version,
    about = "A single-topic NFL responder: safety screening, quick rules and web search.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.huddle/huddle.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Knowledge file replacing the bundled rules and vocabularies.
    #[arg(long, global = true)]
    pub knowledge: Option<PathBuf>,

    /// Off-domain policy: refuse or soften.
    #[arg(long, global = true, value_parser = parse_policy)]
    pub policy: Option<OffDomainPolicy>,

    /// Never call the web search provider.
    #[arg(long, global = true)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Answer a single message.
    Ask {
        /// The message to answer.
        message: String,

        /// Print the reply and its outcome as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Chat interactively; one reply per line read from stdin.
    Chat,

    /// Serve the chat endpoint over HTTP.
    Serve {
        /// Interface to bind (defaults to config).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (defaults to $PORT, then config).
        #[arg(long)]
        port: Option<u16>,
    },

    /// List the loaded quick rules in priority order.
    Rules,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

fn parse_policy(value: &str) -> std::result::Result<OffDomainPolicy, String> {
    value.parse().map_err(|e: huddle_shared::HuddleError| e.to_string())
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "huddle=warn",
        1 => "huddle=info",
        2 => "huddle=debug",
        _ => "huddle=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so replies on stdout stay clean.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    match &cli.command {
        Command::Ask { message, json } => cmd_ask(&cli, &config, message, *json).await,
        Command::Chat => cmd_chat(&cli, &config).await,
        Command::Serve { host, port } => {
            cmd_serve(&cli, &config, host.as_deref(), *port).await
        }
        Command::Rules => cmd_rules(&cli, &config),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Assemble a responder from config plus CLI overrides.
fn build_responder(cli: &Cli, config: &AppConfig) -> Result<Responder> {
    let knowledge = load_knowledge(cli, config)?;
    let policy = cli.policy.unwrap_or(config.responder.off_domain_policy);

    let search: Arc<dyn SearchProvider> = if cli.offline {
        info!("offline mode, web search disabled");
        Arc::new(DisabledSearch)
    } else {
        let api_key = resolve_api_key(&config.search);
        if api_key.is_none() {
            warn!(
                env = %config.search.api_key_env,
                "search API key not set, answers will come from quick rules only"
            );
        }
        Arc::new(SerpApiProvider::new(&config.search, api_key)?)
    };

    info!(
        %policy,
        provider = search.name(),
        rules = knowledge.rules.len(),
        "responder ready"
    );

    Ok(Responder::new(Arc::new(knowledge), search).with_policy(policy))
}

fn load_knowledge(cli: &Cli, config: &AppConfig) -> Result<Knowledge> {
    let path = cli
        .knowledge
        .as_deref()
        .or(config.responder.knowledge_path.as_deref());
    Ok(Knowledge::load(path)?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_ask(cli: &Cli, config: &AppConfig, message: &str, json: bool) -> Result<()> {
    let responder = build_responder(cli, config)?;

    let spinner = Spinner::new("Pensando...");
    let reply = responder.respond(&Message::new(message)).await;
    spinner.finish();

    if json {
        println!("{}", serde_json::to_string_pretty(&reply)?);
    } else {
        println!("{}", reply.text);
    }

    Ok(())
}

async fn cmd_chat(cli: &Cli, config: &AppConfig) -> Result<()> {
    let responder = build_responder(cli, config)?;
    let mut history: Vec<HistoryTurn> = Vec::new();

    println!("{CHAT_OPENING}");
    history.push(turn("bot", CHAT_OPENING));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let request = ChatRequest {
            message: Some(serde_json::Value::String(line.clone())),
            history: history.clone(),
        };
        history.push(turn("user", &line));

        let reply = responder.respond_to(&request).await;
        println!("{}", reply.text);
        history.push(turn("bot", &reply.text));
    }

    println!();
    Ok(())
}

fn turn(role: &str, content: &str) -> HistoryTurn {
    HistoryTurn {
        role: role.to_string(),
        content: content.to_string(),
    }
}

async fn cmd_serve(
    cli: &Cli,
    config: &AppConfig,
    host: Option<&str>,
    port: Option<u16>,
) -> Result<()> {
    let responder = Arc::new(build_responder(cli, config)?);

    let host = host.unwrap_or(&config.server.host);
    let port = port.unwrap_or_else(|| config.server.effective_port());
    if port == 0 {
        return Err(eyre!("port must be non-zero"));
    }

    let addr = format!("{host}:{port}");
    println!("Huddle listening on http://{addr}/api/chat");
    crate::server::serve(&addr, responder).await
}

fn cmd_rules(cli: &Cli, config: &AppConfig) -> Result<()> {
    let knowledge = load_knowledge(cli, config)?;

    println!("{} quick rules (first match wins):", knowledge.rules.len());
    for (i, rule) in knowledge.rules.iter().enumerate() {
        let preview: String = rule.answer().chars().take(60).collect();
        println!(
            "  {:>2}. {:<22} {} patterns  {preview}…",
            i + 1,
            rule.id(),
            rule.pattern_count()
        );
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Spinner
// ---------------------------------------------------------------------------

/// Stderr spinner shown while a reply is being prepared.
struct Spinner {
    bar: ProgressBar,
}

impl Spinner {
    fn new(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            bar.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }

    fn finish(self) {
        self.bar.finish_and_clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_ask_with_overrides() {
        let cli = Cli::try_parse_from([
            "huddle", "--policy", "soften", "--offline", "ask", "¿qué es un safety?", "--json",
        ])
        .expect("parse");
        assert_eq!(cli.policy, Some(OffDomainPolicy::Soften));
        assert!(cli.offline);
        match cli.command {
            Command::Ask { message, json } => {
                assert_eq!(message, "¿qué es un safety?");
                assert!(json);
            }
            _ => panic!("expected ask"),
        }
    }

    #[test]
    fn cli_rejects_unknown_policy() {
        let result = Cli::try_parse_from(["huddle", "--policy", "maybe", "rules"]);
        assert!(result.is_err());
    }

    #[test]
    fn cli_parses_serve_port() {
        let cli = Cli::try_parse_from(["huddle", "serve", "--port", "8081"]).expect("parse");
        match cli.command {
            Command::Serve { host, port } => {
                assert!(host.is_none());
                assert_eq!(port, Some(8081));
            }
            _ => panic!("expected serve"),
        }
    }

    #[test]
    fn offline_responder_uses_config_policy() {
        let cli = Cli::try_parse_from(["huddle", "--offline", "rules"]).unwrap();
        let mut config = AppConfig::default();
        config.responder.off_domain_policy = OffDomainPolicy::Soften;

        let responder = build_responder(&cli, &config).expect("responder");
        assert_eq!(responder.policy(), OffDomainPolicy::Soften);
        assert_eq!(responder.knowledge().rules.len(), 10);
    }

    #[test]
    fn flag_policy_overrides_config() {
        let cli = Cli::try_parse_from(["huddle", "--offline", "--policy", "refuse", "chat"]).unwrap();
        let mut config = AppConfig::default();
        config.responder.off_domain_policy = OffDomainPolicy::Soften;

        let responder = build_responder(&cli, &config).expect("responder");
        assert_eq!(responder.policy(), OffDomainPolicy::Refuse);
    }

    #[test]
    fn knowledge_flag_overrides_bundled() {
        let cli = Cli::try_parse_from([
            "huddle",
            "--knowledge",
            "../../fixtures/knowledge/minimal.toml",
            "rules",
        ])
        .unwrap();
        let knowledge = load_knowledge(&cli, &AppConfig::default()).expect("knowledge");
        assert_eq!(knowledge.rules.len(), 2);
    }
}
