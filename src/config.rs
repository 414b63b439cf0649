//! CLI arguments and server configuration defaults.

use clap::Parser;

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_STORAGE_DIR: &str = "uploads";
pub const DEFAULT_CATEGORY: &str = "general";
pub const UPLOAD_PATH: &str = "/upload";
pub const MEDIA_PATH: &str = "/media";
pub const UPLOAD_FIELD: &str = "file";
pub const AUTH_REALM_CHALLENGE: &str = r#"Basic realm="Restricted""#;
pub const SHUTDOWN_GRACE_SECS: u64 = 10;

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "media-drop", version, about = "Media upload server")]
pub struct Args {
    #[arg(
        short = 's',
        long,
        env = "UPLOADS_DIR",
        default_value = DEFAULT_STORAGE_DIR,
        help = "Storage root for uploaded files"
    )]
    pub storage_dir: String,
    #[arg(long, env = "BASIC_AUTH_USER", help = "Basic auth username for uploads")]
    pub auth_user: Option<String>,
    #[arg(long, env = "BASIC_AUTH_PASS", help = "Basic auth password for uploads")]
    pub auth_pass: Option<String>,
    #[arg(
        short = 'b',
        long,
        env = "BIND_ADDR",
        default_value = "0.0.0.0",
        help = "Bind address"
    )]
    pub bind: String,
    #[arg(
        short = 'p',
        long,
        env = "PORT",
        default_value_t = DEFAULT_PORT,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        long,
        env = "APP_URL",
        help = "Public base URL used in upload responses (defaults to http://localhost:<port>)"
    )]
    pub app_url: Option<String>,
    #[arg(long, env = "CORS_ORIGINS", help = "Comma separated CORS origins")]
    pub cors_origins: Option<String>,
}

impl Args {
    /// Base address that prefixes every returned media URL, without a trailing slash.
    pub fn public_base_url(&self) -> String {
        let base = match self.app_url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => url.to_string(),
            _ => format!("http://localhost:{}", self.port),
        };
        base.trim_end_matches('/').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::Args;
    use clap::Parser;

    #[test]
    fn base_url_defaults_to_localhost_port() {
        let args = Args::try_parse_from(["media-drop", "--port", "8080", "--app-url", ""])
            .expect("parse");
        assert_eq!(args.public_base_url(), "http://localhost:8080");
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let args = Args::try_parse_from(["media-drop", "--app-url", "https://cdn.example.com/"])
            .expect("parse");
        assert_eq!(args.public_base_url(), "https://cdn.example.com");
    }
}
