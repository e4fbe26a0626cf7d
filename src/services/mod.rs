//! Service layer for the relay.
//!
//! This module contains the business logic for:
//! - Announcement scraping (`AnnouncementScraper`)
//! - Topic tagging (`Classifier`)
//! - Message rendering (`MessageFormatter`)
//! - Delivery (`Broadcaster`, `TelegramNotifier`)

mod announcements;
mod classifier;
mod formatter;
mod notifier;
mod telegram;

pub use announcements::{AnnouncementScraper, AnnouncementSource, parse_announcements};
pub use classifier::Classifier;
pub use formatter::{MAX_PREVIEW_LINES, MessageFormatter, RenderMode};
pub use notifier::{Broadcaster, DeliveryReport, Notifier};
pub use telegram::TelegramNotifier;
