//! The notification email sent for each visit.

use chrono::{DateTime, Utc};

use crate::record::VisitorRecord;

pub fn parse_timestamp(ts: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(ts.trim())
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// `Monday, October 19, 2026 at 9:30:00 AM UTC`; unparsable input is kept as is.
pub fn long_time(ts: &str) -> String {
    match parse_timestamp(ts) {
        Some(d) => d.format("%A, %B %-d, %Y at %-I:%M:%S %p UTC").to_string(),
        None => ts.to_string(),
    }
}

/// `10/19/2026, 9:30:00 AM`
pub fn short_time(ts: &str) -> String {
    match parse_timestamp(ts) {
        Some(d) => d.format("%-m/%-d/%Y, %-I:%M:%S %p").to_string(),
        None => ts.to_string(),
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn subject(record: &VisitorRecord, location: &str) -> String {
    let who = match record.display_name() {
        Some(n) => format!("{n} visited"),
        None => "New Visitor".to_string(),
    };
    format!("🎯 {who} from {location} - {}", short_time(&record.timestamp))
}

fn row(label: &str, value: &str) -> String {
    format!(
        r#"      <div class="info-row">
        <span class="label">{label}</span>
        <span class="value">{}</span>
      </div>
"#,
        escape_html(value)
    )
}

pub fn render_html(record: &VisitorRecord, location: &str, ip: &str) -> String {
    let name = record.display_name();
    let heading = name
        .map(|n| format!(r#"      <h3 style="margin-top: 10px; font-size: 18px;">👤 {}</h3>
"#, escape_html(n)))
        .unwrap_or_default();

    let mut rows = String::new();
    if let Some(n) = name {
        rows.push_str(&row("👤 Name:", n));
    }
    rows.push_str(&row("⏰ Time:", &long_time(&record.timestamp)));
    rows.push_str(&row("📍 Location:", location));
    rows.push_str(&row("🌐 IP Address:", ip));
    rows.push_str(&row("🖥️ Screen:", &record.screen_resolution));
    rows.push_str(&row("🌍 Language:", &record.language));
    rows.push_str(&row("⏱️ Timezone:", &record.timezone));
    rows.push_str(&row("🔗 Referrer:", &record.referrer));
    rows.push_str(&row("📱 Device:", &record.user_agent));
    rows.push_str(&row("🔗 Page URL:", &record.page_url));

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
  <style>
    body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
    .container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
    .header {{ background: linear-gradient(135deg, #FF9933, #138808); color: white; padding: 20px; border-radius: 8px 8px 0 0; }}
    .content {{ background: #f9f9f9; padding: 20px; border-radius: 0 0 8px 8px; }}
    .info-row {{ padding: 10px 0; border-bottom: 1px solid #ddd; }}
    .label {{ font-weight: bold; color: #FF9933; }}
    .value {{ color: #333; }}
  </style>
</head>
<body>
  <div class="container">
    <div class="header">
      <h2>🎉 New Visitor on Your Portfolio!</h2>
{heading}    </div>
    <div class="content">
{rows}    </div>
  </div>
</body>
</html>
"#
    )
}
