//! Transactional email over a Resend-compatible HTTP API.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("email service answered HTTP {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    Sent,
    /// No credentials or no recipient configured.
    Skipped,
}

#[derive(Debug, Serialize)]
struct Email<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Clone)]
pub struct Mailer {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
    to: Option<String>,
}

impl Mailer {
    pub fn new(
        client: reqwest::Client,
        url: impl Into<String>,
        api_key: Option<String>,
        from: impl Into<String>,
        to: Option<String>,
    ) -> Self {
        let nonblank = |v: Option<String>| v.filter(|s| !s.trim().is_empty());
        Mailer {
            client,
            url: url.into(),
            api_key: nonblank(api_key),
            from: from.into(),
            to: nonblank(to),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.to.is_some()
    }

    pub async fn send(&self, subject: &str, html: &str) -> Result<Dispatch, MailError> {
        let (Some(key), Some(to)) = (&self.api_key, &self.to) else {
            return Ok(Dispatch::Skipped);
        };
        let email = Email {
            from: &self.from,
            to: [to.as_str()],
            subject,
            html,
        };
        let resp = self
            .client
            .post(&self.url)
            .bearer_auth(key)
            .json(&email)
            .send()
            .await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status, body });
        }
        Ok(Dispatch::Sent)
    }
}
