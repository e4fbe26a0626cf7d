// src/services/formatter.rs

//! Message rendering for Telegram's HTML parse mode.

use crate::models::Announcement;
use crate::utils::escape_html;

/// Maximum number of preview lines included in a message.
pub const MAX_PREVIEW_LINES: usize = 4;

const HEADER_STARTUP: &str = "📢 <b>Latest Announcement (on Bot Start)</b> 📢\n\n";
const HEADER_NEW: &str = "📢 <b>New University Announcement!</b> 📢\n\n";
const TRUNCATION_MARKER: &str = "…\n";
const NO_PREVIEW: &str = "<i>(Full content on the website)</i>";

/// Which kind of message is being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderMode {
    /// Latest item announced when the bot starts without history
    Startup,
    /// An item not seen before
    NewItem,
}

/// Renders announcements into message bodies.
#[derive(Debug, Clone)]
pub struct MessageFormatter {
    source_url: String,
}

impl MessageFormatter {
    pub fn new(source_url: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
        }
    }

    /// Render an announcement with its tags.
    ///
    /// The truncation marker is only emitted in [`RenderMode::NewItem`].
    pub fn render(&self, announcement: &Announcement, tags: &[String], mode: RenderMode) -> String {
        let mut message = String::from(match mode {
            RenderMode::Startup => HEADER_STARTUP,
            RenderMode::NewItem => HEADER_NEW,
        });

        if !tags.is_empty() {
            let tags: Vec<String> = tags.iter().map(|t| escape_html(t)).collect();
            message.push_str(&tags.join(" "));
            message.push_str("\n\n");
        }

        message.push_str(&format!(
            "📌 <b>Title:</b> {}\n",
            escape_html(announcement.title())
        ));
        message.push_str(&format!(
            "🗓️ <b>Date:</b> {}\n\n📝 <b>Details:</b>\n",
            escape_html(announcement.date())
        ));

        let preview = announcement.content_preview();
        let lines = preview_lines(preview, announcement.title());
        for line in &lines {
            message.push_str(&escape_html(line));
            message.push('\n');
        }

        if mode == RenderMode::NewItem && preview.len() > lines.len() && !lines.is_empty() {
            message.push_str(TRUNCATION_MARKER);
        }
        if lines.is_empty() {
            message.push_str(NO_PREVIEW);
        }

        message.push_str(&format!(
            "\n\n<a href=\"{}\">Visit the Announcements Page</a>",
            escape_html(&self.source_url)
        ));
        message
    }

    /// Notice broadcast when the monitor starts.
    pub fn startup_notice(&self) -> String {
        format!(
            "📢 <b>Bot v{} is starting up...</b>",
            env!("CARGO_PKG_VERSION")
        )
    }

    /// Diagnostic sent to the owner chat when the monitor dies.
    pub fn crash_report(&self, error: &str) -> String {
        format!(
            "🚨 <b>BOT CRASHED!</b> 🚨\n\nFatal error in the main task:\n<code>{}</code>",
            escape_html(error)
        )
    }
}

/// Preview lines worth showing: trimmed, non-empty, not repeating the title.
fn preview_lines<'a>(preview: &'a [String], title: &str) -> Vec<&'a str> {
    let title = title.to_lowercase();
    preview
        .iter()
        .map(|line| line.trim())
        .filter(|line| !line.is_empty() && line.to_lowercase() != title)
        .take(MAX_PREVIEW_LINES)
        .collect()
}
