//! Run driver: one connection, one date token, every channel in order.

use tracing::{error, info, warn};

use crate::config::HarvestConfig;
use crate::core::{ChannelSummary, OutputLayout, RunContext, RunReport, write_json};
use crate::error::Result;
use crate::platform::TelegramSource;

use super::boundary::ChannelBoundary;
use super::media::MediaDownloader;
use super::messages::harvest_messages;
use super::resolver::resolve_channel;

/// Harvests the configured channels through a [`TelegramSource`].
///
/// # Example
///
/// ```rust,no_run
/// use tgharvest::config::HarvestConfig;
/// use tgharvest::harvest::Orchestrator;
/// use tgharvest::platform::ExportSource;
///
/// # async fn run() -> tgharvest::Result<()> {
/// let config = HarvestConfig::new(["Chemed123", "tikvahpharma"]).with_message_limit(50);
/// let mut orchestrator = Orchestrator::new(ExportSource::new("exports"), config)?;
///
/// let report = orchestrator.run().await?;
/// println!("{} of {} channels completed", report.completed(), report.outcomes.len());
/// # Ok(())
/// # }
/// ```
pub struct Orchestrator<S> {
    source: S,
    config: HarvestConfig,
    layout: OutputLayout,
    boundary: ChannelBoundary,
}

impl<S: TelegramSource> Orchestrator<S> {
    /// Validates `config` and binds it to `source`.
    pub fn new(source: S, config: HarvestConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            layout: OutputLayout::new(&config.data_root),
            boundary: ChannelBoundary::new(config.rate_limit_policy),
            source,
            config,
        })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn config(&self) -> &HarvestConfig {
        &self.config
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Runs with today's local date as the run token.
    pub async fn run(&mut self) -> Result<RunReport> {
        self.run_for(RunContext::today()).await
    }

    /// Runs every configured channel under the given date token.
    ///
    /// Only a failed `connect` is returned as an error. Channel failures end
    /// up in the report, and the connection is closed once after the last
    /// channel whatever happened.
    pub async fn run_for(&mut self, run: RunContext) -> Result<RunReport> {
        info!(
            source = self.source.name(),
            channels = self.config.channels.len(),
            date = %run.token(),
            "Starting harvest"
        );

        self.source.connect(self.config.credentials.as_ref()).await?;

        let report = self.harvest_all(&run).await;

        if let Err(e) = self.source.disconnect().await {
            warn!(error = %e, "Failed to close platform connection");
        }

        info!(
            date = %report.date,
            completed = report.completed(),
            abandoned = report.abandoned(),
            records = report.total_records(),
            images = report.total_images(),
            "Harvest completed"
        );
        Ok(report)
    }

    async fn harvest_all(&self, run: &RunContext) -> RunReport {
        let mut report = RunReport::new(run.token());

        for identifier in &self.config.channels {
            let outcome = self
                .boundary
                .run(identifier, || self.harvest_channel(run, identifier))
                .await;
            report.push(outcome);
        }

        report
    }

    async fn harvest_channel(&self, run: &RunContext, identifier: &str) -> Result<ChannelSummary> {
        let resolved = resolve_channel(&self.source, identifier).await?;
        let key = resolved.channel.key();
        info!(channel = identifier, key, "Scraping channel");

        let dirs = self.layout.channel_dirs(run, &resolved.channel);
        dirs.create().await?;

        let downloader = MediaDownloader::new(&self.source, &dirs, key);
        let batch = harvest_messages(
            &self.source,
            &resolved.entity,
            self.config.message_limit,
            &downloader,
        )
        .await?;

        let messages_file = dirs.messages_file();
        if let Err(e) = write_json(&batch.records, &messages_file).await {
            error!(channel = identifier, path = %messages_file.display(), error = %e, "Failed to write messages");
            return Err(e);
        }

        info!(
            channel = identifier,
            records = batch.records.len(),
            with_media = batch.with_media,
            images = batch.images,
            failed_images = batch.failed_images,
            path = %messages_file.display(),
            "Saved {} messages", batch.records.len()
        );

        Ok(ChannelSummary {
            identifier: identifier.to_string(),
            key: key.to_string(),
            records: batch.records.len(),
            with_media: batch.with_media,
            images: batch.images,
            failed_images: batch.failed_images,
            messages_file,
        })
    }
}
