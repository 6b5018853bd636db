use std::sync::Arc;
use std::time::Duration;

use crate::domain::announcement::{CategorizedAnnouncement, Outcome, RawAnnouncement, Verdict};
use crate::domain::pdf::PdfContent;
use crate::services::fetcher::DocumentFetcher;
use crate::services::noise::is_noise;
use crate::services::oracle::Oracle;
use crate::services::pacer::Pacer;
use crate::services::pdf_text::extract_text;

pub const NOISE_REASONING: &str = "Filtered out by title noise pattern.";
pub const NO_PDF_REASONING: &str = "Tidak ada PDF untuk dianalisis.";
pub const DOWNLOAD_FAILED_REASONING: &str = "Gagal mengunduh PDF.";
pub const ANALYSIS_FAILED_REASONING: &str = "Analysis failed.";

#[derive(Debug, Clone, PartialEq)]
pub struct PdfCandidate {
    pub url: String,
    pub label: String,
}

pub fn is_pdf_url(url: &str) -> bool {
    let url = url.to_lowercase();
    url.ends_with(".pdf") || url.contains(".pdf")
}

/// Ordered PDF candidates for one announcement: the title link first when it
/// points at a PDF, then every attachment whose label or URL does.
pub fn collect_pdf_candidates(announcement: &RawAnnouncement) -> Vec<PdfCandidate> {
    let mut candidates = vec![];

    if let Some(title_url) = &announcement.title_url {
        if is_pdf_url(title_url) {
            candidates.push(PdfCandidate {
                url: title_url.clone(),
                label: "Title PDF".to_string(),
            });
        }
    }

    let pdf_attachments = announcement
        .attachments
        .iter()
        .filter(|att| att.text.to_lowercase().contains(".pdf") || is_pdf_url(&att.url));

    for (index, att) in pdf_attachments.enumerate() {
        candidates.push(PdfCandidate {
            url: att.url.clone(),
            label: format!("Attachment PDF {}", index + 1),
        });
    }

    candidates
}

#[derive(Clone)]
pub struct TriageConfig {
    pub noise_patterns: Vec<String>,
    pub scanned_text_threshold: usize,
    pub download_pause: Duration,
    pub announcement_pause: Duration,
}

/// The triage pipeline: walks one scraped batch strictly sequentially and
/// produces exactly one categorized announcement per input, in input order.
/// Per-announcement failures degrade into the uninteresting or failed
/// buckets; nothing inside the loop aborts the batch.
pub struct TriagePipeline {
    config: TriageConfig,
    fetcher: Arc<dyn DocumentFetcher>,
    oracle: Oracle,
    pacer: Arc<dyn Pacer>,
    extractor: fn(&[u8], usize) -> PdfContent,
}

impl TriagePipeline {
    pub fn new(
        config: TriageConfig,
        fetcher: Arc<dyn DocumentFetcher>,
        oracle: Oracle,
        pacer: Arc<dyn Pacer>,
    ) -> Self {
        TriagePipeline {
            config,
            fetcher,
            oracle,
            pacer,
            extractor: extract_text,
        }
    }

    #[cfg(test)]
    fn with_extractor(mut self, extractor: fn(&[u8], usize) -> PdfContent) -> Self {
        self.extractor = extractor;
        self
    }

    pub async fn triage(
        &self,
        announcements: Vec<RawAnnouncement>,
    ) -> Vec<CategorizedAnnouncement> {
        let total = announcements.len();
        let mut categorized = Vec::with_capacity(total);

        for (index, announcement) in announcements.into_iter().enumerate() {
            let (verdict, outcome) = self.process(&announcement).await;

            categorized.push(CategorizedAnnouncement {
                announcement,
                verdict,
                outcome,
            });

            if index + 1 < total {
                self.pacer.wait(self.config.announcement_pause).await;
            }
        }

        categorized
    }

    async fn process(&self, announcement: &RawAnnouncement) -> (Verdict, Outcome) {
        if is_noise(&announcement.title, &self.config.noise_patterns) {
            log::info!("Skipping noisy title: {}", announcement.title);
            return (
                Verdict {
                    is_interesting: false,
                    reasoning: NOISE_REASONING.to_string(),
                },
                Outcome::Skipped,
            );
        }

        log::info!(
            "Analyzing [{}] \"{}\"",
            announcement.time,
            announcement.title
        );

        let candidates = collect_pdf_candidates(announcement);
        if candidates.is_empty() {
            log::info!("No PDFs found in title or attachments.");
            return (
                Verdict {
                    is_interesting: false,
                    reasoning: NO_PDF_REASONING.to_string(),
                },
                Outcome::Uninteresting,
            );
        }

        let buffers = self.download_all(&candidates).await;
        if buffers.is_empty() {
            log::error!("Failed to download any PDFs for \"{}\"", announcement.title);
            return (
                Verdict {
                    is_interesting: false,
                    reasoning: DOWNLOAD_FAILED_REASONING.to_string(),
                },
                Outcome::Uninteresting,
            );
        }

        let (combined_text, scanned_buffers) = self.partition_content(&buffers);

        log::info!(
            "Analyzing combined content ({} chars of text + {} scanned PDFs)",
            combined_text.len(),
            scanned_buffers.len()
        );

        match self
            .oracle
            .classify(&combined_text, &scanned_buffers, &announcement.title)
            .await
        {
            Ok(verdict) => {
                let outcome = match verdict.is_interesting {
                    true => Outcome::Interesting,
                    false => Outcome::Uninteresting,
                };
                (verdict, outcome)
            }
            Err(e) => {
                log::error!(
                    "Failed to analyze announcement \"{}\": {:?}",
                    announcement.title,
                    e
                );
                (
                    Verdict {
                        is_interesting: false,
                        reasoning: ANALYSIS_FAILED_REASONING.to_string(),
                    },
                    Outcome::Failed,
                )
            }
        }
    }

    /// A candidate that fails to download is dropped; the announcement keeps
    /// whatever the remaining candidates yield.
    async fn download_all(&self, candidates: &[PdfCandidate]) -> Vec<Vec<u8>> {
        let mut buffers = vec![];

        for (index, candidate) in candidates.iter().enumerate() {
            log::info!("Downloading {}: {}", candidate.label, candidate.url);

            match self.fetcher.fetch_pdf(&candidate.url).await {
                Ok(bytes) => buffers.push(bytes),
                Err(e) => log::error!("Failed to download {}: {:?}", candidate.label, e),
            }

            if index + 1 < candidates.len() {
                self.pacer.wait(self.config.download_pause).await;
            }
        }

        buffers
    }

    fn partition_content(&self, buffers: &[Vec<u8>]) -> (String, Vec<Vec<u8>>) {
        let mut combined_texts = vec![];
        let mut scanned_buffers = vec![];

        for (index, buffer) in buffers.iter().enumerate() {
            match (self.extractor)(buffer, self.config.scanned_text_threshold) {
                PdfContent::Text(text) => {
                    log::info!("PDF {} has {} characters of text", index + 1, text.len());
                    combined_texts.push(format!("--- PDF {} ---\n{}", index + 1, text));
                }
                PdfContent::Scanned => {
                    log::info!("PDF {} is a scanned image", index + 1);
                    scanned_buffers.push(buffer.clone());
                }
                PdfContent::Unreadable => {
                    log::warn!("PDF {} yielded no readable content", index + 1);
                }
            }
        }

        (combined_texts.join("\n\n"), scanned_buffers)
    }
}
