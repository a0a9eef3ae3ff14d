use serde::{Deserialize, Serialize};

/// One site visit, as posted to `/api/track-visitor`. Never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// ISO-8601.
    pub timestamp: String,
    pub user_agent: String,
    /// `WxH`
    pub screen_resolution: String,
    pub language: String,
    pub timezone: String,
    pub referrer: String,
    pub page_url: String,
    /// Filled in by the visitor's own lookup; the server resolves its own.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl VisitorRecord {
    /// The name to show, if the visitor gave a non-blank one.
    pub fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}
