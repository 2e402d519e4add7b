use serde::Deserialize;

/// Main configuration structure for Chatrelay
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Upstream completion API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Assistant persona and instruction configuration
    #[serde(default)]
    pub assistant: AssistantConfig,
    /// Embeddable widget configuration
    #[serde(default)]
    pub widget: WidgetConfig,
}

impl Config {
    /// Apply overrides from the process environment
    ///
    /// `OPENAI_MODEL` replaces the upstream model and `PORT` replaces the
    /// port of the listen address.
    pub fn apply_env(&mut self) {
        self.apply_env_with(|key| std::env::var(key).ok());
    }

    /// Apply environment overrides using the given variable lookup
    pub fn apply_env_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("OPENAI_MODEL").filter(|m| !m.trim().is_empty()) {
            self.upstream.model = model;
        }

        if let Some(port) = lookup("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => self.server.listen_addr = with_port(&self.server.listen_addr, port),
                Err(_) => tracing::warn!("Ignoring invalid PORT value: {port}"),
            }
        }
    }

    /// Read the upstream API key from the configured environment variable
    ///
    /// An empty value counts as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.resolve_api_key_with(|key| std::env::var(key).ok())
    }

    /// Read the upstream API key using the given variable lookup
    pub fn resolve_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        lookup(&self.upstream.api_key_env).filter(|key| !key.is_empty())
    }
}

/// Replace the port of a `host:port` address, keeping the host part
fn with_port(listen_addr: &str, port: u16) -> String {
    let host = match listen_addr.rsplit_once(':') {
        Some((host, _)) if !host.is_empty() => host,
        _ => "0.0.0.0",
    };
    format!("{host}:{port}")
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:3000")
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
        }
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0:3000".to_string()
}

/// Upstream completion API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Completion endpoint URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Environment variable name for the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Model identifier sent with every request
    #[serde(default = "default_model")]
    pub model: String,
    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds (unset = wait indefinitely)
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            api_key_env: default_api_key_env(),
            model: default_model(),
            temperature: default_temperature(),
            timeout_secs: None,
        }
    }
}

fn default_api_url() -> String {
    "https://api.openai.com/v1/responses".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

/// Assistant persona configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    /// Display name, used in the instructions and the widget header
    #[serde(default = "default_assistant_name")]
    pub name: String,
    /// Languages the assistant should answer in when the user writes in them.
    /// Empty disables the language section of the instructions.
    #[serde(default)]
    pub languages: Vec<String>,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            name: default_assistant_name(),
            languages: Vec::new(),
        }
    }
}

fn default_assistant_name() -> String {
    "Site Assistant".to_string()
}

/// Embeddable widget configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WidgetConfig {
    /// Chat endpoint used when the script cannot resolve its own URL
    #[serde(default = "default_fallback_endpoint")]
    pub fallback_endpoint: String,
    /// Browser `localStorage` key holding the continuation token
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            fallback_endpoint: default_fallback_endpoint(),
            storage_key: default_storage_key(),
        }
    }
}

fn default_fallback_endpoint() -> String {
    "/chat".to_string()
}

fn default_storage_key() -> String {
    "kf_prev_id".to_string()
}
