use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Service configuration loaded from environment variables.
/// Every variable has a default, so a bare environment starts a local server.
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Where exported `cv-{id}.pdf` files are written.
    pub output_dir: PathBuf,
    /// Root that `/uploads/...` photo references resolve against.
    pub asset_root: PathBuf,
    /// Directory bare photo file names are looked up in.
    pub upload_dir: PathBuf,
    pub allow_remote_photos: bool,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            host: env_or("HOST", "127.0.0.1"),
            port: env_or("PORT", "3001")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            output_dir: PathBuf::from(env_or("OUTPUT_DIR", "uploads")),
            asset_root: PathBuf::from(env_or("ASSET_ROOT", ".")),
            upload_dir: PathBuf::from(env_or("UPLOAD_DIR", "uploads")),
            allow_remote_photos: parse_flag(&env_or("ALLOW_REMOTE_PHOTOS", "false"))
                .context("ALLOW_REMOTE_PHOTOS must be true or false")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("'{}:{}' is not a valid listen address", self.host, self.port))
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognised flag value '{other}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("TRUE").unwrap());
        assert!(parse_flag(" 1 ").unwrap());
        assert!(!parse_flag("off").unwrap());
        assert!(!parse_flag("").unwrap());
        assert!(parse_flag("maybe").is_err());
    }

    #[test]
    fn test_addr() {
        let config = Config {
            host: "0.0.0.0".into(),
            port: 3001,
            output_dir: "uploads".into(),
            asset_root: ".".into(),
            upload_dir: "uploads".into(),
            allow_remote_photos: false,
            rust_log: "info".into(),
        };
        assert_eq!(config.addr().unwrap().port(), 3001);

        let bad = Config { host: "not a host".into(), ..config };
        assert!(bad.addr().is_err());
    }
}
