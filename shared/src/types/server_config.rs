use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Credential lifetime in minutes.
    ///
    /// Defaults to one year.  Tokens are self-contained and there is no
    /// revocation list, so whatever lifetime is configured here is how
    /// long a stolen token stays usable.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,

    /// Path of the PEM-encoded PKCS#1 RSA private key the token signer is
    /// derived from.  Created on first start if missing; replacing or
    /// corrupting the file invalidates every previously issued credential.
    #[serde(default = "default_key_path")]
    pub key_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default = "default_database_config")]
    pub database: DatabaseConfig,
    #[serde(default = "default_auth_config")]
    pub auth: AuthConfig,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_bind() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    1323
}

fn default_db_path() -> String {
    "accounts.db".to_string()
}

fn default_token_ttl() -> u64 {
    // One year, in minutes.
    60 * 24 * 365
}

fn default_key_path() -> String {
    "id_rsa".to_string()
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind: default_bind(),
        port: default_port(),
    }
}

fn default_database_config() -> DatabaseConfig {
    DatabaseConfig {
        path: default_db_path(),
    }
}

fn default_auth_config() -> AuthConfig {
    AuthConfig {
        token_ttl_minutes: default_token_ttl(),
        key_path: default_key_path(),
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: default_server_config(),
            database: default_database_config(),
            auth: default_auth_config(),
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"127.0.0.1:1323"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl AuthConfig {
    /// Credential lifetime in seconds, as handed to the token issuer.
    pub fn token_ttl_secs(&self) -> i64 {
        (self.token_ttl_minutes * 60) as i64
    }
}
