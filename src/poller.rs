use chrono::{DateTime, SecondsFormat, Utc};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::error::RelayError;
use crate::filter::filter_recent;
use crate::flatten::build_record_table;
use crate::foundry::FoundryClient;
use crate::slack::{build_insight_message, field_or, SlackClient, PRIMARY_KEY_FIELD};
use crate::types::{Config, MessagePayload};

/// Counts from one completed poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub fetched: usize,
    pub recent: usize,
    pub posted: usize,
    pub skipped: usize,
}

/// Orchestrates fetch, flatten, filter and post, once per interval.
pub struct Poller {
    config: Config,
    foundry: FoundryClient,
    slack: SlackClient,
}

impl Poller {
    pub fn new(config: Config, foundry: FoundryClient, slack: SlackClient) -> Self {
        Self {
            config,
            foundry,
            slack,
        }
    }

    /// Run poll cycles forever, sleeping the full interval after a clean
    /// cycle and the shortened retry delay after a failed one. A failed
    /// cycle also posts a best-effort diagnostic to the channel.
    pub async fn run(&mut self) {
        let poll_interval =
            Duration::from_secs(self.config.poll_interval_hours.max(0) as u64 * 3600);
        let retry_delay = Duration::from_secs(self.config.retry_delay_secs);

        loop {
            info!("starting poll cycle");
            match self.run_cycle_at(Utc::now()).await {
                Ok(report) => {
                    info!(
                        "cycle complete: fetched {}, recent {}, posted {}, skipped {}",
                        report.fetched, report.recent, report.posted, report.skipped
                    );
                    tokio::time::sleep(poll_interval).await;
                }
                Err(err) => {
                    error!("poll cycle failed: {}", err);
                    let notice = MessagePayload::plain(format!(
                        "Error fetching and posting insights: {}",
                        err
                    ));
                    if let Err(post_err) = self.slack.post_message(&notice).await {
                        error!("could not post failure notice: {}", post_err);
                    }
                    tokio::time::sleep(retry_delay).await;
                }
            }
        }
    }

    /// One fetch → flatten → filter → post pass, with the current instant
    /// supplied by the caller.
    pub async fn run_cycle_at(&mut self, now: DateTime<Utc>) -> Result<CycleReport, RelayError> {
        let records = self
            .foundry
            .fetch_all(
                &self.config.ontology_rid,
                &self.config.object_type,
                self.config.page_size,
            )
            .await?;
        let fetched = records.len();

        if records.is_empty() {
            self.slack
                .post_message(&MessagePayload::plain(self.no_insights_text()))
                .await?;
            return Ok(CycleReport {
                fetched,
                ..CycleReport::default()
            });
        }

        let table = build_record_table(&records);
        let cutoff = (now - chrono::Duration::hours(self.config.lookback_hours))
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let recent = filter_recent(&table, &self.config.timestamp_column, &cutoff)?;
        info!(
            "{} of {} records at or after {}",
            recent.len(),
            table.len(),
            cutoff
        );

        if recent.is_empty() {
            self.slack
                .post_message(&MessagePayload::plain(self.no_insights_text()))
                .await?;
            return Ok(CycleReport {
                fetched,
                ..CycleReport::default()
            });
        }

        let summary = format!(
            "*Daily Thread Insights Update*\nFound {} new insights in the last {} hours.",
            recent.len(),
            self.config.lookback_hours
        );
        self.slack
            .post_message(&MessagePayload::plain(summary))
            .await?;

        let mut posted = 0;
        let mut skipped = 0;
        for row in &recent.rows {
            let message = build_insight_message(row);
            if self.slack.post_message(&message).await? {
                posted += 1;
            } else {
                warn!(
                    "failed to post insight {}",
                    field_or(row, PRIMARY_KEY_FIELD, "unknown")
                );
                skipped += 1;
            }
        }

        Ok(CycleReport {
            fetched,
            recent: recent.len(),
            posted,
            skipped,
        })
    }

    fn no_insights_text(&self) -> String {
        format!(
            "No new thread insights found in the last {} hours.",
            self.config.lookback_hours
        )
    }
}
