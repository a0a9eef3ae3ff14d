use std::net::SocketAddr;
use std::time::Duration;

use clap::Args;

pub const DEFAULT_GEO_API: &str = "https://ipapi.co";
pub const DEFAULT_EMAIL_API: &str = "https://api.resend.com/emails";
pub const DEFAULT_FROM: &str = "Portfolio Tracker <onboarding@resend.dev>";

/// Server settings. Secrets only ever come from the environment or flags.
#[derive(Args, Debug, Clone)]
pub struct TrackerConfig {
    /// Address to listen on
    #[arg(long, env = "TRACKER_BIND", default_value = "127.0.0.1:3000")]
    pub bind: SocketAddr,

    /// ipapi.co-compatible geolocation base URL
    #[arg(long, env = "GEO_API_BASE", default_value = DEFAULT_GEO_API)]
    pub geo_api_base: String,

    /// Resend-compatible send endpoint
    #[arg(long, env = "EMAIL_API_URL", default_value = DEFAULT_EMAIL_API)]
    pub email_api_url: String,

    #[arg(long, env = "RESEND_API_KEY", hide_env_values = true)]
    pub resend_api_key: Option<String>,

    /// Recipient of visit notifications
    #[arg(long, env = "NOTIFICATION_EMAIL")]
    pub notification_email: Option<String>,

    #[arg(long, env = "NOTIFICATION_FROM", default_value = DEFAULT_FROM)]
    pub notification_from: String,

    /// Outbound request timeout, seconds
    #[arg(long, env = "TRACKER_TIMEOUT_SECS", default_value_t = 10)]
    pub timeout_secs: u64,
}

impl TrackerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}
