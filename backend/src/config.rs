use serde::Deserialize;
use std::fs;
use std::path::Path;

const DEFAULT_JWT_SECRET: &str = "dev-secret-key-change-in-production";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub upstream: UpstreamConfig,
    pub logging: LoggingConfig,
    pub i18n: I18nConfig,
    pub auth: AuthConfig,
    pub gate: GateConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Base URL of the application the edge forwards to.
    pub url: String,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

/// How locales appear in public URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UrlMappingStrategy {
    /// URLs never show the locale; the edge rewrites internally.
    #[default]
    Rewrite,
    /// Only the default locale is hidden from URLs.
    RewriteDefault,
    /// Unprefixed URLs are redirected to their locale-prefixed form.
    Redirect,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct I18nConfig {
    pub locales: Vec<String>,
    pub default_locale: String,
    pub url_mapping_strategy: UrlMappingStrategy,
    pub locale_cookie: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_cookie: String,
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub session_ttl_secs: u64,
    /// Tokens expiring within this window are re-issued.
    #[serde(deserialize_with = "deserialize_duration_secs")]
    pub refresh_window_secs: u64,
    pub cookie_secure: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub login_path: String,
    pub mfa_verify_path: String,
    /// Public paths matched exactly against the canonical path.
    pub public_paths: Vec<String>,
    /// Public segment runs matched anywhere in the canonical path; a trailing
    /// `/` requires a following segment.
    pub public_segments: Vec<String>,
    pub team_paths: Vec<String>,
    pub invite_prefix: String,
    /// Path prefixes that never reach the gatekeeper.
    pub excluded_prefixes: Vec<String>,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from the given path, or the first of conf/config.toml, config.toml
    /// 2. Override with environment variables (prefixed with APP_)
    /// 3. Validate the final configuration
    pub fn load(path: Option<&str>) -> Result<Self, anyhow::Error> {
        let mut config = match path.map(str::to_string).or_else(Self::find_config_file) {
            Some(config_path) => Self::from_toml(&config_path)?,
            None => {
                tracing::warn!("Configuration file not found, using defaults");
                Config::default()
            },
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Apply overrides from a variable lookup
    ///
    /// Supported variables:
    /// - APP_SERVER_HOST / APP_SERVER_PORT
    /// - APP_UPSTREAM_URL, APP_UPSTREAM_TIMEOUT (accepts "30s", "1m")
    /// - APP_LOG_LEVEL
    /// - APP_LOCALES (comma separated), APP_DEFAULT_LOCALE
    /// - APP_JWT_SECRET, APP_SESSION_TTL, APP_REFRESH_WINDOW, APP_COOKIE_SECURE
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("APP_SERVER_HOST") {
            self.server.host = host;
            tracing::info!("Override server.host from env: {}", self.server.host);
        }

        if let Some(port) = lookup("APP_SERVER_PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
            tracing::info!("Override server.port from env: {}", self.server.port);
        }

        if let Some(url) = lookup("APP_UPSTREAM_URL") {
            self.upstream.url = url;
            tracing::info!("Override upstream.url from env: {}", self.upstream.url);
        }

        override_duration(&lookup, "APP_UPSTREAM_TIMEOUT", &mut self.upstream.timeout_secs);

        if let Some(level) = lookup("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }

        if let Some(locales) = lookup("APP_LOCALES") {
            self.i18n.locales = locales
                .split(',')
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty())
                .collect();
            tracing::info!("Override i18n.locales from env: {:?}", self.i18n.locales);
        }

        if let Some(locale) = lookup("APP_DEFAULT_LOCALE") {
            self.i18n.default_locale = locale;
            tracing::info!("Override i18n.default_locale from env: {}", self.i18n.default_locale);
        }

        if let Some(secret) = lookup("APP_JWT_SECRET") {
            self.auth.jwt_secret = secret;
            tracing::info!("Override auth.jwt_secret from env");
        }

        override_duration(&lookup, "APP_SESSION_TTL", &mut self.auth.session_ttl_secs);
        override_duration(&lookup, "APP_REFRESH_WINDOW", &mut self.auth.refresh_window_secs);

        if let Some(secure) = lookup("APP_COOKIE_SECURE")
            && let Ok(val) = secure.parse()
        {
            self.auth.cookie_secure = val;
            tracing::info!("Override auth.cookie_secure from env: {}", self.auth.cookie_secure);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), anyhow::Error> {

        if self.server.port == 0 {
            anyhow::bail!("Server port cannot be 0");
        }

        if reqwest::Url::parse(&self.upstream.url).is_err() {
            anyhow::bail!("upstream.url is not a valid URL: '{}'", self.upstream.url);
        }

        if self.upstream.timeout_secs == 0 {
            anyhow::bail!("upstream.timeout_secs must be > 0");
        }

        if self.i18n.locales.is_empty() {
            anyhow::bail!("i18n.locales cannot be empty");
        }

        if !self.i18n.locales.contains(&self.i18n.default_locale) {
            anyhow::bail!(
                "i18n.default_locale '{}' is not one of {:?}",
                self.i18n.default_locale,
                self.i18n.locales
            );
        }

        if self.auth.access_token_cookie.is_empty() || self.i18n.locale_cookie.is_empty() {
            anyhow::bail!("cookie names cannot be empty");
        }

        if self.auth.session_ttl_secs == 0 {
            anyhow::bail!("auth.session_ttl_secs must be > 0");
        }

        if self.auth.refresh_window_secs >= self.auth.session_ttl_secs {
            anyhow::bail!("auth.refresh_window_secs must be shorter than auth.session_ttl_secs");
        }

        for path in [&self.gate.login_path, &self.gate.mfa_verify_path] {
            if !path.starts_with('/') {
                anyhow::bail!("gate path '{}' must start with '/'", path);
            }
        }

        Ok(())
    }

    /// Settings that are valid but unsafe outside development.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        if self.auth.jwt_secret == DEFAULT_JWT_SECRET {
            warnings.push(
                "Using default JWT secret! Set APP_JWT_SECRET or update config.toml".to_string(),
            );
        }
        if !self.auth.cookie_secure {
            warnings.push("Session cookies are sent without the Secure attribute".to_string());
        }
        warnings
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

fn override_duration<F>(lookup: &F, key: &str, target: &mut u64)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(raw) = lookup(key) {
        match parse_duration_to_secs(&raw) {
            Ok(val) => {
                *target = val;
                tracing::info!("Override {} from env: {}s", key, val);
            },
            Err(e) => tracing::warn!("Invalid {} '{}': {} (keep {})", key, raw, e, target),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".to_string(), port: 8080 }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self { url: "http://127.0.0.1:3001".to_string(), timeout_secs: 30 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,dashboard_edge=debug".to_string(), file: None }
    }
}

impl Default for I18nConfig {
    fn default() -> Self {
        Self {
            locales: vec!["en".to_string()],
            default_locale: "en".to_string(),
            url_mapping_strategy: UrlMappingStrategy::Rewrite,
            locale_cookie: "locale".to_string(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            access_token_cookie: "edge-access-token".to_string(),
            session_ttl_secs: 60 * 60,
            refresh_window_secs: 5 * 60,
            cookie_secure: false,
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        Self {
            login_path: "/login".to_string(),
            mfa_verify_path: "/mfa/verify".to_string(),
            public_paths: strings(&["/login"]),
            public_segments: strings(&["i/", "verify", "all-done", "desktop/search"]),
            team_paths: strings(&["/teams/create", "/teams"]),
            invite_prefix: "/teams/invite/".to_string(),
            excluded_prefixes: strings(&[
                "/_next/static",
                "/_next/image",
                "/favicon.ico",
                "/api",
                "/health",
            ]),
        }
    }
}

// =========================
// Helpers for parsing values
// =========================

pub(crate) fn parse_duration_to_secs(input: &str) -> Result<u64, String> {
    // Accept plain numbers (treated as seconds)
    if let Ok(val) = input.parse::<u64>() {
        return Ok(val);
    }

    let s = input.trim().to_lowercase();
    let (num_str, unit) = s.split_at(s.chars().take_while(|c| c.is_ascii_digit()).count());
    if num_str.is_empty() || unit.is_empty() {
        return Err("missing number or unit".into());
    }
    let n: u64 = num_str.parse().map_err(|_| "invalid number".to_string())?;
    let multiplier: u64 = match unit {
        "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hour" | "hours" => 60 * 60,
        "d" | "day" | "days" => 60 * 60 * 24,
        _ => return Err(format!("unsupported unit: {}", unit)),
    };
    n.checked_mul(multiplier).ok_or_else(|| format!("duration too large: {}", input))
}

// Accepts numeric seconds or human-friendly strings
fn deserialize_duration_secs<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    struct Visitor;
    impl<'de> serde::de::Visitor<'de> for Visitor {
        type Value = u64;
        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            write!(f, "a number of seconds or a string like '30s', '5m', '1h'")
        }
        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E> {
            Ok(v)
        }
        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            if v >= 0 { Ok(v as u64) } else { Err(E::custom("negative not allowed")) }
        }
        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: serde::de::Error,
        {
            parse_duration_to_secs(v).map_err(E::custom)
        }
    }
    deserializer.deserialize_any(Visitor)
}
