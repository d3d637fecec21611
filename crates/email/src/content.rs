//! Shared email content
//!
//! Content generators for notification emails, used by both the SES and mock
//! email services.

/// Subject line for a notification of the given category.
pub fn notification_subject(category: &str) -> String {
    format!("[{}] Notification", category)
}

/// Minimal HTML rendering of a plain-text notification body.
///
/// Each line becomes its own line in the output; markup in the body is escaped.
pub fn notification_html(body: &str) -> String {
    let lines = body
        .lines()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join("<br>\n");

    format!(
        r#"<html>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
<div style="max-width: 600px; margin: 0 auto; padding: 20px;">
<p>{lines}</p>
<hr style="border: none; border-top: 1px solid #eee; margin: 30px 0;">
<p style="color: #999; font-size: 12px;">Sent by your Deji business assistant.</p>
</div>
</body>
</html>"#
    )
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
