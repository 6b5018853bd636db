use std::sync::Arc;
use std::time::Duration;

use crate::configuration::Settings;
use crate::domain::announcement::Buckets;
use crate::services::courier::Courier;
use crate::services::fetcher::ReqwestFetcher;
use crate::services::idx_scraper::IdxScraper;
use crate::services::navigator::Navigator;
use crate::services::oracle::{GeminiClient, Oracle, OracleConfig};
use crate::services::pacer::{Pacer, TokioPacer};
use crate::services::triage::{TriageConfig, TriagePipeline};

/// One full scan: scrape the disclosure listing for the date, triage every
/// announcement, and email the categorized report. A failure before the
/// batch completes aborts the run without sending a partial report.
pub async fn run_scan(settings: Settings, date: String) -> anyhow::Result<()> {
    log::info!("Starting IDX disclosure scan for {}", date);

    let navigator = Navigator::connect(&settings.scraper.webdriver_url).await?;
    let scraper = IdxScraper::new(navigator, settings.scraper.clone());

    let scraped = scraper.collect_for_date(&date).await;
    scraper.quit().await;

    let announcements = scraped?;
    log::info!("Total announcements scraped: {}", announcements.len());

    let pacer: Arc<dyn Pacer> = Arc::new(TokioPacer);
    let generator = Arc::new(GeminiClient::new(
        settings.api_keys.gemini.clone(),
        settings.oracle.model.clone(),
    ));
    let oracle = Oracle::new(
        generator,
        pacer.clone(),
        OracleConfig {
            prompt_template: settings.oracle.prompt_template.clone(),
            max_attempts: settings.oracle.max_attempts,
            backoff_base_ms: settings.oracle.backoff_base_ms,
            text_only_limit: settings.oracle.text_only_limit,
            multimodal_text_limit: settings.oracle.multimodal_text_limit,
        },
    );
    let pipeline = TriagePipeline::new(
        TriageConfig {
            noise_patterns: settings.triage.noise_patterns.clone(),
            scanned_text_threshold: settings.triage.scanned_text_threshold,
            download_pause: Duration::from_millis(settings.triage.download_pause_ms),
            announcement_pause: Duration::from_millis(settings.triage.announcement_pause_ms),
        },
        Arc::new(ReqwestFetcher::new()),
        oracle,
        pacer,
    );

    let categorized = pipeline.triage(announcements).await;
    let buckets = Buckets::partition(categorized);

    log_summary(&buckets);

    let courier = Courier::new(&settings.api_keys, &settings.email);
    courier.send_report(&buckets, &date).await;

    log::info!("Scan complete");
    Ok(())
}

fn log_summary(buckets: &Buckets) {
    log::info!(
        "Found {} interesting announcements:",
        buckets.interesting.len()
    );
    for ann in &buckets.interesting {
        log::info!(
            "- {} | {}",
            ann.announcement.title,
            ann.verdict.reasoning
        );
    }

    log::info!(
        "Found {} announcements judged uninteresting:",
        buckets.uninteresting.len()
    );
    for ann in &buckets.uninteresting {
        log::info!(
            "- {} | {}",
            ann.announcement.title,
            ann.verdict.reasoning
        );
    }

    log::info!(
        "Found {} announcements skipped by title:",
        buckets.skipped.len()
    );
    for ann in &buckets.skipped {
        log::info!("- {}", ann.announcement.title);
    }

    log::info!(
        "Found {} announcements that failed analysis:",
        buckets.failed.len()
    );
    for ann in &buckets.failed {
        log::info!("- {}", ann.announcement.title);
    }
}
