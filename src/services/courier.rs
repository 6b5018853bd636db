use askama::Template;
use serde::Serialize;

use crate::configuration::{ApiKeySettings, EmailSettings};
use crate::domain::announcement::{Buckets, CategorizedAnnouncement};

const MAILJET_SEND_URL: &str = "https://api.mailjet.com/v3.1/send";

#[derive(Serialize)]
struct MailjetPayload {
    #[serde(rename = "Messages")]
    messages: Vec<MailjetMessage>,
}

#[derive(Serialize)]
struct MailjetMessage {
    #[serde(rename = "From")]
    from: MailjetParty,
    #[serde(rename = "To")]
    to: Vec<MailjetParty>,
    #[serde(rename = "Subject")]
    subject: String,
    #[serde(rename = "HTMLPart")]
    html_part: String,
}

#[derive(Serialize)]
struct MailjetParty {
    #[serde(rename = "Email")]
    email: String,
    #[serde(rename = "Name", skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

pub struct ReportRow {
    pub title: String,
    pub reasoning: Option<String>,
    pub link: Option<String>,
}

#[derive(Template)]
#[template(path = "report.html")]
pub struct ReportTemplate {
    pub date: String,
    pub interesting: Vec<ReportRow>,
    pub uninteresting: Vec<ReportRow>,
    pub skipped: Vec<ReportRow>,
    pub failed: Vec<ReportRow>,
}

impl ReportTemplate {
    pub fn from_buckets(buckets: &Buckets, date: &str) -> Self {
        ReportTemplate {
            date: date.to_string(),
            interesting: rows(&buckets.interesting, true),
            uninteresting: rows(&buckets.uninteresting, true),
            skipped: rows(&buckets.skipped, false),
            failed: rows(&buckets.failed, false),
        }
    }
}

/// Skipped and failed announcements are listed by title only; the reasoning
/// is shown for the buckets the classifier actually judged.
fn rows(announcements: &[CategorizedAnnouncement], include_reasoning: bool) -> Vec<ReportRow> {
    announcements
        .iter()
        .map(|ann| ReportRow {
            title: ann.announcement.title.clone(),
            reasoning: match include_reasoning {
                true => Some(ann.verdict.reasoning.clone()),
                false => None,
            },
            link: ann.announcement.report_link().map(|url| url.to_string()),
        })
        .collect()
}

/// Delivers the categorized report via the Mailjet send API. Delivery
/// problems are logged and swallowed so a finished scan is never lost to a
/// mail failure.
pub struct Courier {
    client: reqwest::Client,
    api_key: String,
    api_secret: String,
    sender: String,
    sender_name: String,
    receiver: String,
    url: String,
}

impl Courier {
    pub fn new(api_keys: &ApiKeySettings, email: &EmailSettings) -> Self {
        Courier {
            client: reqwest::Client::new(),
            api_key: api_keys.mailjet_key.clone(),
            api_secret: api_keys.mailjet_secret.clone(),
            sender: email.sender.clone(),
            sender_name: email.sender_name.clone(),
            receiver: email.receiver.clone(),
            url: MAILJET_SEND_URL.to_string(),
        }
    }

    pub async fn send_report(&self, buckets: &Buckets, date: &str) {
        if self.api_key.is_empty()
            || self.api_secret.is_empty()
            || self.sender.is_empty()
            || self.receiver.is_empty()
        {
            log::error!("Email credentials are not fully set. Skipping email report.");
            return;
        }

        let html_part = match ReportTemplate::from_buckets(buckets, date).render() {
            Ok(html) => html,
            Err(e) => {
                log::error!("Failed to render the report template: {:?}", e);
                return;
            }
        };

        let payload = MailjetPayload {
            messages: vec![MailjetMessage {
                from: MailjetParty {
                    email: self.sender.clone(),
                    name: Some(self.sender_name.clone()),
                },
                to: vec![MailjetParty {
                    email: self.receiver.clone(),
                    name: None,
                }],
                subject: format!(
                    "IDX Disclosure Report: {} interesting announcements found!",
                    buckets.interesting.len()
                ),
                html_part,
            }],
        };

        match self
            .client
            .post(&self.url)
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .json(&payload)
            .send()
            .await
        {
            Ok(response) => match response.status().is_success() {
                true => log::info!("Email report sent successfully via Mailjet"),
                false => log::error!(
                    "Mailjet rejected the report with status {}",
                    response.status()
                ),
            },
            Err(e) => log::error!("Failed to send email report via Mailjet: {:?}", e),
        }
    }
}
