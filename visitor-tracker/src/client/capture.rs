//! What a visitor's environment reveals about them, gathered from the terminal and process env.

use chrono::{DateTime, Local, SecondsFormat, Utc};

use crate::record::VisitorRecord;

pub const DIRECT: &str = "Direct";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    pub user_agent: String,
    /// `WxH`
    pub screen_resolution: String,
    pub language: String,
    pub timezone: String,
    pub referrer: String,
    pub page_url: String,
}

impl Environment {
    pub fn detect(page_url: &str, referrer: Option<&str>) -> Self {
        let screen_resolution = match crossterm::terminal::size() {
            Ok((w, h)) => format!("{w}x{h}"),
            Err(_) => "0x0".to_string(),
        };
        let locale = ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .find_map(|k| std::env::var(k).ok().filter(|v| !v.is_empty()));
        let timezone = std::env::var("TZ")
            .ok()
            .map(|tz| tz.trim_start_matches(':').to_string())
            .filter(|tz| !tz.is_empty())
            .unwrap_or_else(|| format!("UTC{}", Local::now().format("%:z")));

        Environment {
            user_agent: format!(
                "track-visitor/{} ({}; {})",
                env!("CARGO_PKG_VERSION"),
                std::env::consts::OS,
                std::env::consts::ARCH
            ),
            screen_resolution,
            language: language_tag(locale.as_deref()),
            timezone,
            referrer: referrer_or_direct(referrer),
            page_url: page_url.to_string(),
        }
    }

    pub fn record(&self, name: Option<&str>, now: DateTime<Utc>) -> VisitorRecord {
        VisitorRecord {
            name: name.map(str::to_string),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            user_agent: self.user_agent.clone(),
            screen_resolution: self.screen_resolution.clone(),
            language: self.language.clone(),
            timezone: self.timezone.clone(),
            referrer: self.referrer.clone(),
            page_url: self.page_url.clone(),
            ip_address: None,
            location: None,
        }
    }
}

/// `en_IN.UTF-8` becomes `en-IN`; `C`, `POSIX` and unset fall back to `en-US`.
pub fn language_tag(locale: Option<&str>) -> String {
    let base = locale
        .unwrap_or("")
        .split(['.', '@'])
        .next()
        .unwrap_or("")
        .trim();
    match base {
        "" | "C" | "POSIX" => "en-US".to_string(),
        b => b.replace('_', "-"),
    }
}

pub fn referrer_or_direct(referrer: Option<&str>) -> String {
    referrer
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(DIRECT)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn locales_become_language_tags() {
        assert_eq!(language_tag(Some("en_IN.UTF-8")), "en-IN");
        assert_eq!(language_tag(Some("de_DE@euro")), "de-DE");
        assert_eq!(language_tag(Some("fr")), "fr");
        assert_eq!(language_tag(Some("C")), "en-US");
        assert_eq!(language_tag(None), "en-US");
    }

    #[test]
    fn empty_referrer_is_direct() {
        assert_eq!(referrer_or_direct(None), "Direct");
        assert_eq!(referrer_or_direct(Some("  ")), "Direct");
        assert_eq!(referrer_or_direct(Some("https://github.com/")), "https://github.com/");
    }

    #[test]
    fn record_carries_the_environment_and_an_iso_timestamp() {
        let env = Environment {
            user_agent: "ua".into(),
            screen_resolution: "120x40".into(),
            language: "en-IN".into(),
            timezone: "Asia/Kolkata".into(),
            referrer: DIRECT.into(),
            page_url: "https://example.dev/".into(),
        };
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 5).unwrap();
        let r = env.record(Some("Asha"), now);
        assert_eq!(r.timestamp, "2026-10-19T09:30:05.000Z");
        assert_eq!(r.display_name(), Some("Asha"));
        assert_eq!(r.screen_resolution, "120x40");
        assert_eq!(r.referrer, "Direct");
        assert_eq!(r.ip_address, None);
    }
}
