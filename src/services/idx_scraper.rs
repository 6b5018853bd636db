use std::time::Duration;

use rand::Rng;
use scraper::{Html, Selector};
use thirtyfour::{error::WebDriverResult, By, Key, WebElement};
use url::Url;

use crate::configuration::ScraperSettings;
use crate::domain::announcement::{Attachment, RawAnnouncement};
use crate::services::navigator::Navigator;

const DATE_INPUT_SELECTOR: &str = r#"input[name="date"]"#;
const NEXT_PAGE_SELECTOR: &str = r#"button[aria-label="Go to next page"]:not([disabled])"#;

/// Page source for the IDX disclosure listing: fills the date filter, walks
/// the pagination, and parses announcement cards out of each page's source.
pub struct IdxScraper {
    navigator: Navigator,
    settings: ScraperSettings,
}

impl IdxScraper {
    pub fn new(navigator: Navigator, settings: ScraperSettings) -> Self {
        IdxScraper {
            navigator,
            settings,
        }
    }

    pub async fn collect_for_date(&self, date: &str) -> WebDriverResult<Vec<RawAnnouncement>> {
        let driver = &self.navigator.driver;

        driver.goto(&self.settings.target_url).await?;
        self.settle().await;

        self.fill_date_filter(date).await?;
        self.settle().await;

        let mut announcements = vec![];

        loop {
            let page_source = driver.source().await?;
            let page_announcements =
                parse_announcement_cards(&page_source, &self.settings.target_url);

            log::info!(
                "Scraped {} announcements from current page",
                page_announcements.len()
            );
            announcements.extend(page_announcements);

            match self.next_page_button().await {
                Some(button) => {
                    button.click().await?;
                    self.settle().await;
                }
                None => break,
            }
        }

        Ok(announcements)
    }

    pub async fn quit(self) {
        if let Err(e) = self.navigator.driver.quit().await {
            log::error!("Failed to close the browser session: {:?}", e);
        }
    }

    async fn fill_date_filter(&self, date: &str) -> WebDriverResult<()> {
        let date_input = self
            .navigator
            .driver
            .find(By::Css(DATE_INPUT_SELECTOR))
            .await?;
        date_input.click().await?;

        log::info!("Scraping announcements for date: {}", date);

        date_input.send_keys(format!("{} ~ {}", date, date)).await?;
        date_input.send_keys(Key::Enter + "").await?;

        Ok(())
    }

    async fn next_page_button(&self) -> Option<WebElement> {
        self.navigator
            .driver
            .find(By::Css(NEXT_PAGE_SELECTOR))
            .await
            .ok()
    }

    /// Let the page finish loading, with a little jitter so page turns do
    /// not tick at a perfectly regular interval.
    async fn settle(&self) {
        let jitter = rand::thread_rng().gen_range(0..500);
        tokio::time::sleep(Duration::from_millis(self.settings.page_settle_ms + jitter)).await;
    }
}

/// Parse the announcement cards out of one listing page. Relative links are
/// resolved against the listing URL.
pub fn parse_announcement_cards(html: &str, base_url: &str) -> Vec<RawAnnouncement> {
    let document = Html::parse_document(html);
    let card_selector = Selector::parse("div.attach-card").unwrap();
    let time_selector = Selector::parse("time").unwrap();
    let title_selector = Selector::parse("h6").unwrap();
    let title_link_selector = Selector::parse("h6 a").unwrap();
    let attachment_selector = Selector::parse("ul li a").unwrap();

    let base = Url::parse(base_url).ok();

    document
        .select(&card_selector)
        .map(|card| {
            let time = card
                .select(&time_selector)
                .next()
                .map(|tag| tag.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            let title = card
                .select(&title_selector)
                .next()
                .map(|tag| tag.text().collect::<String>().trim().to_string())
                .unwrap_or_default();

            let title_url = card
                .select(&title_link_selector)
                .next()
                .and_then(|tag| tag.value().attr("href"))
                .map(|href| resolve_url(&base, href));

            let attachments = card
                .select(&attachment_selector)
                .filter_map(|link| {
                    link.value().attr("href").map(|href| Attachment {
                        text: link.text().collect::<String>().trim().to_string(),
                        url: resolve_url(&base, href),
                    })
                })
                .collect();

            RawAnnouncement {
                time,
                title,
                title_url,
                attachments,
            }
        })
        .collect()
}

fn resolve_url(base: &Option<Url>, href: &str) -> String {
    match base {
        Some(base) => base
            .join(href)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_string()),
        None => href.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LISTING_FIXTURE: &str = r#"
        <html><body>
        <div class="attach-card">
            <time>09:30</time>
            <h6><a href="/announcement/123.pdf">Akuisisi PT Sasaran oleh PT Pembeli</a></h6>
            <ul>
                <li><a href="https://idx.co.id/files/lampiran.pdf">Lampiran.pdf</a></li>
                <li><a href="/files/pers.html">Siaran Pers</a></li>
            </ul>
        </div>
        <div class="attach-card">
            <time>10:15</time>
            <h6>Laporan Bulanan Registrasi Pemegang Efek</h6>
            <ul></ul>
        </div>
        </body></html>
    "#;

    #[test]
    fn cards_are_parsed_with_resolved_links() {
        let announcements =
            parse_announcement_cards(LISTING_FIXTURE, "https://idx.co.id/keterbukaan-informasi/");

        assert_eq!(announcements.len(), 2);

        let first = &announcements[0];
        assert_eq!(first.time, "09:30");
        assert_eq!(first.title, "Akuisisi PT Sasaran oleh PT Pembeli");
        assert_eq!(
            first.title_url.as_deref(),
            Some("https://idx.co.id/announcement/123.pdf")
        );
        assert_eq!(
            first.attachments,
            vec![
                Attachment {
                    text: "Lampiran.pdf".to_string(),
                    url: "https://idx.co.id/files/lampiran.pdf".to_string(),
                },
                Attachment {
                    text: "Siaran Pers".to_string(),
                    url: "https://idx.co.id/files/pers.html".to_string(),
                },
            ]
        );
    }

    #[test]
    fn cards_without_links_still_parse() {
        let announcements =
            parse_announcement_cards(LISTING_FIXTURE, "https://idx.co.id/keterbukaan-informasi/");

        let second = &announcements[1];
        assert_eq!(second.title, "Laporan Bulanan Registrasi Pemegang Efek");
        assert_eq!(second.title_url, None);
        assert!(second.attachments.is_empty());
    }

    #[test]
    fn pages_without_cards_yield_nothing() {
        let announcements =
            parse_announcement_cards("<html><body></body></html>", "https://idx.co.id/");
        assert!(announcements.is_empty());
    }
}
