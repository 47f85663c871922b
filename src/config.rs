//! Application configuration loaded from environment variables.

use anyhow::{bail, Context};

/// Authors offered in the post and reply forms when `BLOG_AUTHORS` is unset.
pub const DEFAULT_AUTHORS: [&str; 2] = ["ConfigMage", "DarkForestMushroom"];

/// Shortest secret `actix_web::cookie::Key::derive_from` accepts.
const MIN_SESSION_KEY_LEN: usize = 32;

#[derive(Clone)]
pub struct Config {
    /// Server bind address (e.g., "127.0.0.1:8080").
    pub bind_addr: String,
    pub database_url: String,
    /// Shared password for every writer.
    pub site_password: String,
    /// Secret used to sign the session cookie. Generated per process when absent.
    pub session_key: Option<Vec<u8>>,
    pub cookie_secure: bool,
    /// Allow-list of names a post or reply may be published under.
    pub authors: Vec<String>,
    pub s3: S3Config,
}

/// Object storage settings.
#[derive(Clone, Debug, Default)]
pub struct S3Config {
    pub bucket: String,
    /// Base URL objects are publicly served from.
    pub public_url: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services.
    pub endpoint: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_owned(),
            database_url: String::new(),
            site_password: String::new(),
            session_key: None,
            cookie_secure: false,
            authors: DEFAULT_AUTHORS.iter().map(|a| (*a).to_owned()).collect(),
            s3: S3Config::default(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `SITE_PASSWORD`, `DATABASE_URL`, `S3_BUCKET`, `S3_PUBLIC_URL`
    ///
    /// Optional:
    /// - `BIND_ADDR` (default: "127.0.0.1:8080")
    /// - `SESSION_KEY`: at least 32 bytes; random per process otherwise
    /// - `COOKIE_SECURE` (default: false)
    /// - `BLOG_AUTHORS`: comma-separated author names
    /// - `S3_REGION` (default: "us-east-1"), `S3_ENDPOINT`
    pub fn from_env() -> anyhow::Result<Self> {
        let session_key = match optional("SESSION_KEY") {
            Some(key) if key.len() < MIN_SESSION_KEY_LEN => {
                bail!("SESSION_KEY must be at least {} bytes", MIN_SESSION_KEY_LEN)
            }
            key => key.map(String::into_bytes),
        };

        let authors = match optional("BLOG_AUTHORS") {
            Some(raw) => parse_authors(&raw),
            None => Config::default().authors,
        };
        if authors.is_empty() {
            bail!("BLOG_AUTHORS must name at least one author");
        }

        Ok(Self {
            bind_addr: optional("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:8080".to_owned()),
            database_url: required("DATABASE_URL")?,
            site_password: required("SITE_PASSWORD")?,
            session_key,
            cookie_secure: optional("COOKIE_SECURE")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
            authors,
            s3: S3Config {
                bucket: required("S3_BUCKET")?,
                public_url: required("S3_PUBLIC_URL")?
                    .trim_end_matches('/')
                    .to_owned(),
                region: optional("S3_REGION").unwrap_or_else(|| "us-east-1".to_owned()),
                endpoint: optional("S3_ENDPOINT"),
            },
        })
    }

    pub fn is_author(&self, name: &str) -> bool {
        self.authors.iter().any(|a| a == name)
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    optional(name).with_context(|| format!("{} must be set", name))
}

/// Unset and blank variables are treated the same.
fn optional(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

/// Splits a comma-separated list, dropping blanks and repeats.
pub fn parse_authors(raw: &str) -> Vec<String> {
    let mut authors: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !authors.iter().any(|a| a == name) {
            authors.push(name.to_owned());
        }
    }
    authors
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
