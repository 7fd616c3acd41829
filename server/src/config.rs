//! Server configuration from command-line flags or the process environment

use crate::origin::OriginPolicy;
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Shared grid synchronization server")]
pub struct Config {
    /// Address to bind to
    #[arg(short = 'H', long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port to listen on (0 picks an ephemeral port)
    #[arg(short, long, env = "PORT", default_value = "8080")]
    pub port: u16,

    /// Seconds between moves per player; 0 allows one move per player, ever
    #[arg(short, long, env = "COOLDOWN_SECONDS", default_value = "0")]
    pub cooldown_seconds: u64,

    /// Comma-separated list of origins allowed to open a session
    #[arg(long, env = "ALLOWED_ORIGINS", value_delimiter = ',')]
    pub allowed_origins: Vec<String>,

    /// Accept sessions from any origin
    #[arg(long, env = "ALLOW_ALL_ORIGINS")]
    pub allow_all_origins: bool,
}

impl Config {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn origin_policy(&self) -> OriginPolicy {
        OriginPolicy::new(self.allowed_origins.iter(), self.allow_all_origins)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cooldown_seconds: 0,
            allowed_origins: Vec::new(),
            allow_all_origins: false,
        }
    }
}
