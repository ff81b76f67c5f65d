//! Application configuration for Huddle.
//!
//! User config lives at `~/.huddle/huddle.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HuddleError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "huddle.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".huddle";

/// Env var that overrides `[server] port`.
const PORT_ENV: &str = "PORT";

// ---------------------------------------------------------------------------
// Config structs (matching huddle.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Decision-chain settings.
    #[serde(default)]
    pub responder: ResponderConfig,

    /// Web search provider settings.
    #[serde(default)]
    pub search: SearchConfig,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

/// What happens to messages that fall outside the supported topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OffDomainPolicy {
    /// Refuse immediately; neither rules nor search run.
    #[default]
    Refuse,
    /// Keep going through rules and search; only the fallback tone changes.
    Soften,
}

impl OffDomainPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Refuse => "refuse",
            Self::Soften => "soften",
        }
    }
}

impl FromStr for OffDomainPolicy {
    type Err = HuddleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "refuse" => Ok(Self::Refuse),
            "soften" => Ok(Self::Soften),
            other => Err(HuddleError::config(format!(
                "unknown off-domain policy '{other}': expected 'refuse' or 'soften'"
            ))),
        }
    }
}

impl std::fmt::Display for OffDomainPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `[responder]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponderConfig {
    /// Off-domain handling policy.
    #[serde(default)]
    pub off_domain_policy: OffDomainPolicy,

    /// Knowledge file replacing the bundled rules and vocabularies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_path: Option<PathBuf>,
}

/// `[search]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Provider endpoint returning JSON.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Locale hint sent as `hl`.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// Qualifier prepended to every query to bias results toward the topic.
    #[serde(default = "default_query_prefix")]
    pub query_prefix: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            endpoint: default_endpoint(),
            locale: default_locale(),
            query_prefix: default_query_prefix(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_api_key_env() -> String {
    "SERPAPI_KEY".into()
}
fn default_endpoint() -> String {
    "https://serpapi.com/search.json".into()
}
fn default_locale() -> String {
    "es".into()
}
fn default_query_prefix() -> String {
    "NFL".into()
}
fn default_timeout_secs() -> u64 {
    10
}

/// `[server]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind; the `PORT` env var takes precedence.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}
fn default_port() -> u16 {
    3000
}

impl ServerConfig {
    /// Port after applying the `PORT` env override.
    pub fn effective_port(&self) -> u16 {
        self.port_with_override(std::env::var(PORT_ENV).ok().as_deref())
    }

    fn port_with_override(&self, value: Option<&str>) -> u16 {
        match value.map(str::trim).filter(|v| !v.is_empty()) {
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) => port,
                Err(_) => {
                    tracing::warn!(value = raw, "ignoring unparsable {PORT_ENV}");
                    self.port
                }
            },
            None => self.port,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.huddle/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| HuddleError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.huddle/huddle.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| HuddleError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| HuddleError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| HuddleError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| HuddleError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| HuddleError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read the search API key from the configured env var.
///
/// A missing or empty key is a supported degraded mode, so this returns
/// `None` instead of an error.
pub fn resolve_api_key(search: &SearchConfig) -> Option<String> {
    match std::env::var(&search.api_key_env) {
        Ok(val) if !val.trim().is_empty() => Some(val),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("off_domain_policy = \"refuse\""));
        assert!(toml_str.contains("SERPAPI_KEY"));
        assert!(!toml_str.contains("knowledge_path"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.responder.off_domain_policy, OffDomainPolicy::Refuse);
        assert_eq!(parsed.search.locale, "es");
        assert_eq!(parsed.search.query_prefix, "NFL");
        assert_eq!(parsed.server.port, 3000);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let toml_str = r#"
[responder]
off_domain_policy = "soften"
knowledge_path = "/etc/huddle/knowledge.toml"

[search]
timeout_secs = 3
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        assert_eq!(config.responder.off_domain_policy, OffDomainPolicy::Soften);
        assert_eq!(
            config.responder.knowledge_path,
            Some(PathBuf::from("/etc/huddle/knowledge.toml"))
        );
        assert_eq!(config.search.timeout_secs, 3);
        assert_eq!(config.search.endpoint, "https://serpapi.com/search.json");
        assert_eq!(config.server.host, "127.0.0.1");
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let toml_str = "[responder]\noff_domain_policy = \"maybe\"\n";
        assert!(toml::from_str::<AppConfig>(toml_str).is_err());

        let err = "maybe".parse::<OffDomainPolicy>().unwrap_err();
        assert!(err.to_string().contains("expected 'refuse' or 'soften'"));
    }

    #[test]
    fn policy_parses_case_insensitively() {
        assert_eq!(" Soften ".parse::<OffDomainPolicy>().unwrap(), OffDomainPolicy::Soften);
        assert_eq!("REFUSE".parse::<OffDomainPolicy>().unwrap(), OffDomainPolicy::Refuse);
    }

    #[test]
    fn port_override_handling() {
        let server = ServerConfig::default();
        assert_eq!(server.port_with_override(None), 3000);
        assert_eq!(server.port_with_override(Some("8080")), 8080);
        assert_eq!(server.port_with_override(Some("  ")), 3000);
        assert_eq!(server.port_with_override(Some("not-a-port")), 3000);
    }

    #[test]
    fn missing_api_key_is_none() {
        let search = SearchConfig {
            // Use a unique env var name to avoid interfering with other tests
            api_key_env: "HUDDLE_TEST_NONEXISTENT_KEY_12345".into(),
            ..SearchConfig::default()
        };
        assert!(resolve_api_key(&search).is_none());
    }

    #[test]
    fn load_config_from_missing_file_is_io_error() {
        let err = load_config_from(Path::new("/nonexistent/huddle.toml")).unwrap_err();
        assert!(matches!(err, HuddleError::Io { .. }));
    }
}
