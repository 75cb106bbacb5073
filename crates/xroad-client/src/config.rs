//! Client configuration.
//!
//! Loaded from TOML or JSON, then layered with `XROAD_*` environment
//! variables, then validated.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use xroad_cache::CacheBackend;
use xroad_core::{MemberIdentity, ObjectType, DEFAULT_PROTOCOL_VERSION};
use xroad_telemetry::LogConfig;

use crate::error::{ClientError, ClientResult};

/// Client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Security Server settings.
    pub security_server: SecurityServerSettings,
    /// Identity and protocol settings.
    pub client: ClientSettings,
    /// Service-description cache settings.
    pub cache: CacheSettings,
    /// Logging settings.
    pub logging: LogConfig,
}

impl ClientConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Load configuration from a file.
    pub fn from_file(path: impl Into<PathBuf>) -> ClientResult<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ClientError::configuration(format!("failed to read config file: {e}")))?;

        let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
        match extension {
            "toml" => toml::from_str(&content)
                .map_err(|e| ClientError::configuration(format!("invalid TOML: {e}"))),
            "json" => serde_json::from_str(&content)
                .map_err(|e| ClientError::configuration(format!("invalid JSON: {e}"))),
            _ => Err(ClientError::configuration(format!(
                "unsupported config format: {extension}"
            ))),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Variables are prefixed with `XROAD_`; unparseable values are ignored.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary variable source.
    #[must_use]
    pub fn with_overrides_from(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var("XROAD_SECURITY_SERVER_URL") {
            self.security_server.url = url;
        }

        if let Some(timeout) = var("XROAD_TIMEOUT").and_then(|t| duration_serde::parse(&t).ok()) {
            self.security_server.timeout = timeout;
        }

        if let Some(client) = var("XROAD_CLIENT") {
            self.client.client = client;
        }

        if let Some(service) = var("XROAD_SERVICE") {
            self.client.service = service;
        }

        if let Some(protocol) = var("XROAD_PROTOCOL").and_then(|p| p.parse().ok()) {
            self.client.protocol = protocol;
        }

        if let Some(user_id) = var("XROAD_USER_ID") {
            self.client.user_id = Some(user_id);
        }

        if let Some(backend) = var("XROAD_CACHE_BACKEND").and_then(|b| b.parse().ok()) {
            self.cache.backend = backend;
        }

        if let Some(url) = var("XROAD_CACHE_URL") {
            self.cache.url = Some(url);
        }

        if let Some(path) = var("XROAD_CACHE_PATH") {
            self.cache.path = Some(PathBuf::from(path));
        }

        if let Some(ttl) = var("XROAD_CACHE_TTL").and_then(|t| duration_serde::parse(&t).ok()) {
            self.cache.ttl = ttl;
        }

        if let Some(level) = var("XROAD_LOG_LEVEL") {
            self.logging.level = level;
        }

        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ClientResult<()> {
        let url = &self.security_server.url;
        if url.is_empty() {
            return Err(ClientError::validation_with_field(
                "security server url is required",
                "security_server.url",
            ));
        }

        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ClientError::validation_with_field(
                "security server url must start with http:// or https://",
                "security_server.url",
            ));
        }

        if self.client.client.trim().is_empty() {
            return Err(ClientError::validation_with_field("client - required", "client"));
        }

        if self.client.service.trim().is_empty() {
            return Err(ClientError::validation_with_field("service - required", "service"));
        }

        self.cache_backend().map(|_| ())
    }

    /// The parsed client identity.
    pub fn client_identity(&self) -> ClientResult<MemberIdentity> {
        Ok(MemberIdentity::parse(ObjectType::Subsystem, &self.client.client)?)
    }

    /// The parsed service identity.
    pub fn service_identity(&self) -> ClientResult<MemberIdentity> {
        Ok(MemberIdentity::parse(ObjectType::Service, &self.client.service)?)
    }

    /// The cache backend to build.
    pub fn cache_backend(&self) -> ClientResult<CacheBackend> {
        match self.cache.backend {
            CacheKind::None => Ok(CacheBackend::None),
            CacheKind::Memory => Ok(CacheBackend::Memory),
            CacheKind::Redis => self
                .cache
                .url
                .clone()
                .filter(|url| !url.is_empty())
                .map(|url| CacheBackend::Redis { url })
                .ok_or_else(|| ClientError::configuration("redis cache requires cache.url")),
            CacheKind::Sqlite => self
                .cache
                .path
                .clone()
                .map(|path| CacheBackend::Sqlite { path })
                .ok_or_else(|| ClientError::configuration("sqlite cache requires cache.path")),
        }
    }
}

/// Security Server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityServerSettings {
    /// Base URL of the Security Server.
    pub url: String,
    /// Timeout for every HTTP request.
    #[serde(with = "duration_serde")]
    pub timeout: Duration,
}

impl Default for SecurityServerSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Message protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    /// SOAP over the service description.
    #[default]
    Soap,
    /// X-Road REST.
    Rest,
}

impl std::str::FromStr for Protocol {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "soap" => Ok(Self::Soap),
            "rest" => Ok(Self::Rest),
            other => Err(ClientError::validation_with_field(
                format!("unknown protocol: {other}"),
                "protocol",
            )),
        }
    }
}

/// Identity and protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    /// `soap` or `rest`.
    pub protocol: Protocol,
    /// Client subsystem path, e.g. `EE/GOV/1234/SUB`.
    pub client: String,
    /// Service path, e.g. `EE/GOV/5678/SUB/getData/v1`.
    pub service: String,
    /// End user id. Defaults to the client subsystem code.
    pub user_id: Option<String>,
    /// X-Road protocol version.
    pub protocol_version: String,
    /// HTTP method for REST calls.
    pub http_method: String,
    /// Patch the fetched service description before use.
    pub patch_wsdl: bool,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            protocol: Protocol::Soap,
            client: String::new(),
            service: String::new(),
            user_id: None,
            protocol_version: DEFAULT_PROTOCOL_VERSION.to_string(),
            http_method: "GET".to_string(),
            patch_wsdl: false,
        }
    }
}

/// Cache backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// No caching.
    #[default]
    None,
    /// Process-local map.
    Memory,
    /// Redis.
    Redis,
    /// SQLite file.
    Sqlite,
}

impl std::str::FromStr for CacheKind {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "memory" => Ok(Self::Memory),
            "redis" => Ok(Self::Redis),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(ClientError::configuration(format!("unknown cache backend: {other}"))),
        }
    }
}

/// Service-description cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Backend.
    pub backend: CacheKind,
    /// Redis URL.
    pub url: Option<String>,
    /// SQLite database path.
    pub path: Option<PathBuf>,
    /// Entry lifetime.
    #[serde(with = "duration_serde")]
    pub ttl: Duration,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: CacheKind::None,
            url: None,
            path: None,
            ttl: Duration::from_secs(3600),
        }
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Set the Security Server URL.
    #[must_use]
    pub fn security_server_url(mut self, url: impl Into<String>) -> Self {
        self.config.security_server.url = url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.security_server.timeout = timeout;
        self
    }

    /// Set the protocol.
    #[must_use]
    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.config.client.protocol = protocol;
        self
    }

    /// Set the client path.
    #[must_use]
    pub fn client(mut self, path: impl Into<String>) -> Self {
        self.config.client.client = path.into();
        self
    }

    /// Set the service path.
    #[must_use]
    pub fn service(mut self, path: impl Into<String>) -> Self {
        self.config.client.service = path.into();
        self
    }

    /// Set the end user id.
    #[must_use]
    pub fn user_id(mut self, user_id: impl Into<String>) -> Self {
        self.config.client.user_id = Some(user_id.into());
        self
    }

    /// Set the REST HTTP method.
    #[must_use]
    pub fn http_method(mut self, method: impl Into<String>) -> Self {
        self.config.client.http_method = method.into();
        self
    }

    /// Patch fetched service descriptions.
    #[must_use]
    pub fn patch_wsdl(mut self, patch: bool) -> Self {
        self.config.client.patch_wsdl = patch;
        self
    }

    /// Use an in-memory cache.
    #[must_use]
    pub fn memory_cache(mut self, ttl: Duration) -> Self {
        self.config.cache.backend = CacheKind::Memory;
        self.config.cache.ttl = ttl;
        self
    }

    /// Use a Redis cache.
    #[must_use]
    pub fn redis_cache(mut self, url: impl Into<String>, ttl: Duration) -> Self {
        self.config.cache.backend = CacheKind::Redis;
        self.config.cache.url = Some(url.into());
        self.config.cache.ttl = ttl;
        self
    }

    /// Use a SQLite cache.
    #[must_use]
    pub fn sqlite_cache(mut self, path: impl Into<PathBuf>, ttl: Duration) -> Self {
        self.config.cache.backend = CacheKind::Sqlite;
        self.config.cache.path = Some(path.into());
        self.config.cache.ttl = ttl;
        self
    }

    /// Set the logging configuration.
    #[must_use]
    pub fn logging(mut self, logging: LogConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> ClientResult<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Durations written as `500ms`, `30s`, `5m`, `1h` or bare seconds.
mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = if duration.subsec_millis() == 0 {
            format!("{}s", duration.as_secs())
        } else {
            format!("{}ms", duration.as_millis())
        };
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse(&s).map_err(serde::de::Error::custom)
    }

    pub fn parse(s: &str) -> Result<Duration, String> {
        let s = s.trim();
        let (number, unit) = match s.find(|c: char| !c.is_ascii_digit()) {
            Some(idx) => s.split_at(idx),
            None => (s, "s"),
        };
        let n: u64 = number
            .parse()
            .map_err(|_| format!("invalid duration: {s}"))?;

        match unit.trim() {
            "ms" => Ok(Duration::from_millis(n)),
            "s" => Ok(Duration::from_secs(n)),
            "m" => Ok(Duration::from_secs(n * 60)),
            "h" => Ok(Duration::from_secs(n * 3600)),
            other => Err(format!("invalid duration unit: {other}")),
        }
    }
}
