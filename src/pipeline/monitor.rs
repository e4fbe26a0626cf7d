// src/pipeline/monitor.rs

//! Polling loop: scrape, diff against the seen-set, deliver, persist.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::Result;
use crate::models::{Announcement, Config, SeenSet};
use crate::services::{
    AnnouncementScraper, AnnouncementSource, Broadcaster, Classifier, MessageFormatter,
    RenderMode, TelegramNotifier,
};
use crate::storage::{LocalStorage, SeenStorage};

use super::diff::delivery_order;

/// Lifecycle of the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// Startup notice not sent and seen-set not loaded yet
    Starting,
    /// No history: announce only the newest item, then mark the page seen
    FirstRun,
    /// Announce every item not seen before
    SteadyState,
}

/// Summary of one polling cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub started_at: DateTime<Local>,
    /// Announcements returned by the scrape
    pub scraped: usize,
    /// Announcements broadcast this cycle
    pub delivered: usize,
    /// Individual chat sends that failed
    pub failed_sends: usize,
    /// Whether the seen-set was written successfully
    pub persisted: bool,
}

impl CycleReport {
    fn new() -> Self {
        Self {
            started_at: Local::now(),
            scraped: 0,
            delivered: 0,
            failed_sends: 0,
            persisted: false,
        }
    }
}

/// Orchestrates scraping, delivery and seen-set persistence.
pub struct Monitor {
    source: Arc<dyn AnnouncementSource>,
    storage: Arc<dyn SeenStorage>,
    broadcaster: Broadcaster,
    classifier: Classifier,
    formatter: MessageFormatter,
    interval: Duration,
    state: MonitorState,
    seen: SeenSet,
}

impl Monitor {
    /// Assemble a monitor from its collaborators.
    pub fn new(
        config: &Config,
        source: Arc<dyn AnnouncementSource>,
        storage: Arc<dyn SeenStorage>,
        broadcaster: Broadcaster,
    ) -> Self {
        Self {
            source,
            storage,
            broadcaster,
            classifier: Classifier::new(config.tags.clone()),
            formatter: MessageFormatter::new(&config.source.url),
            interval: Duration::from_secs(config.monitor.interval_secs),
            state: MonitorState::Starting,
            seen: SeenSet::new(),
        }
    }

    /// Build the production monitor: page scraper, state file, Telegram.
    pub fn from_config(config: &Config) -> Result<Self> {
        let source = Arc::new(AnnouncementScraper::new(config)?);
        let storage = Arc::new(LocalStorage::new(&config.monitor.state_file));
        let broadcaster = Broadcaster::new(
            Arc::new(TelegramNotifier::new(config)?),
            config.telegram.chat_ids.clone(),
            Duration::from_millis(config.monitor.send_delay_ms),
        );
        Ok(Self::new(config, source, storage, broadcaster))
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// Send the startup notice and load history.
    ///
    /// A failed notice is logged only.
    pub async fn start(&mut self) {
        let report = self
            .broadcaster
            .broadcast(&self.formatter.startup_notice())
            .await;
        if !report.any_sent() {
            log::warn!("Startup notice was not delivered to any chat");
        }

        self.seen = self.storage.load().await;
        self.state = if self.seen.is_empty() {
            MonitorState::FirstRun
        } else {
            MonitorState::SteadyState
        };
        log::info!(
            "Loaded {} previously seen id(s). First run: {}",
            self.seen.len(),
            self.state == MonitorState::FirstRun
        );
    }

    /// Run one scrape/deliver/persist pass.
    pub async fn run_cycle(&mut self) -> CycleReport {
        if self.state == MonitorState::Starting {
            self.start().await;
        }

        let mut report = CycleReport::new();
        log::info!(
            "Checking for new announcements ({})",
            report.started_at.format("%Y-%m-%d %H:%M:%S")
        );

        let scraped = match self.source.fetch().await {
            Ok(announcements) => announcements,
            Err(e) => {
                log::warn!("Scrape failed: {}", e);
                Vec::new()
            }
        };
        report.scraped = scraped.len();

        if scraped.is_empty() {
            log::info!("No announcements retrieved this cycle");
            return report;
        }

        match self.state {
            MonitorState::FirstRun => self.announce_latest(&scraped, &mut report).await,
            _ => self.announce_new(&scraped, &mut report).await,
        }
        report
    }

    /// Run forever, sleeping the configured interval between cycles.
    pub async fn run(mut self) {
        loop {
            let report = self.run_cycle().await;
            log::info!(
                "Cycle done: {} scraped, {} delivered, {} failed send(s); {} seen",
                report.scraped,
                report.delivered,
                report.failed_sends,
                self.seen.len()
            );
            log::info!(
                "Waiting for {} seconds before the next check...",
                self.interval.as_secs()
            );
            tokio::time::sleep(self.interval).await;
        }
    }

    async fn announce_latest(&mut self, scraped: &[Announcement], report: &mut CycleReport) {
        log::info!("First run: announcing only the latest item");
        if let Some(latest) = scraped.first() {
            self.deliver(latest, RenderMode::Startup, report).await;
        }

        self.seen.extend(scraped.iter().map(|a| a.id().to_string()));
        report.persisted = self.persist().await;
        self.state = MonitorState::SteadyState;
    }

    async fn announce_new(&mut self, scraped: &[Announcement], report: &mut CycleReport) {
        let batch = delivery_order(scraped, &self.seen);
        if batch.is_empty() {
            log::info!("No new announcements since last check");
            return;
        }

        log::info!("Found {} new announcement(s)", batch.len());
        for announcement in batch {
            self.deliver(announcement, RenderMode::NewItem, report).await;
            self.seen.insert(announcement.id());
        }
        report.persisted = self.persist().await;
    }

    async fn deliver(
        &self,
        announcement: &Announcement,
        mode: RenderMode,
        report: &mut CycleReport,
    ) {
        let tags = self.classifier.classify(announcement.title());
        let message = self.formatter.render(announcement, &tags, mode);
        let delivery = self.broadcaster.broadcast(&message).await;

        log::info!(
            "Announced '{}' ({} sent, {} failed)",
            announcement.title(),
            delivery.sent,
            delivery.failed
        );
        report.delivered += 1;
        report.failed_sends += delivery.failed;
    }

    async fn persist(&self) -> bool {
        match self.storage.save(&self.seen).await {
            Ok(()) => true,
            Err(e) => {
                log::error!(
                    "Failed to persist {} seen id(s): {}. Items may be re-sent after a restart.",
                    self.seen.len(),
                    e
                );
                false
            }
        }
    }
}
