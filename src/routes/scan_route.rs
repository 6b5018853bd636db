use actix_web::{get, web, HttpResponse};
use chrono::Local;
use serde::Deserialize;

use crate::configuration::Settings;
use crate::services::run_scan;

#[derive(Deserialize)]
struct ScanQuery {
    date: Option<String>,
}

/// Trigger one scan run. The response is returned immediately; the scrape,
/// triage, and report run in a background task so the caller (typically a
/// cron ping) never waits out the batch.
#[get("/scan")]
async fn trigger_scan(
    settings: web::Data<Settings>,
    query: web::Query<ScanQuery>,
) -> HttpResponse {
    let date = query
        .date
        .clone()
        .unwrap_or_else(|| Local::now().format("%Y-%m-%d").to_string());

    log::info!("Scan endpoint triggered for date {}", date);

    let settings = settings.get_ref().clone();
    tokio::spawn(async move {
        if let Err(e) = run_scan(settings, date).await {
            log::error!("An unexpected error occurred during the scan: {:?}", e);
        }
    });

    HttpResponse::Accepted().body("Scan triggered successfully.")
}
