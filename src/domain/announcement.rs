#[derive(Debug, Clone, PartialEq)]
pub struct Attachment {
    pub text: String,
    pub url: String,
}

/// One disclosure record as scraped from the exchange. Immutable after
/// scraping; `time` is kept as the display string the page shows.
#[derive(Debug, Clone, PartialEq)]
pub struct RawAnnouncement {
    pub time: String,
    pub title: String,
    pub title_url: Option<String>,
    pub attachments: Vec<Attachment>,
}

impl RawAnnouncement {
    /// Link shown in the report: the first attachment whose label mentions a
    /// PDF, falling back to the title link.
    pub fn report_link(&self) -> Option<&str> {
        self.attachments
            .iter()
            .find(|att| att.text.to_lowercase().contains(".pdf"))
            .map(|att| att.url.as_str())
            .or(self.title_url.as_deref())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub is_interesting: bool,
    pub reasoning: String,
}

/// Which of the four report buckets an announcement landed in. Decided at the
/// point the verdict is produced; never re-derived from the reasoning text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Interesting,
    Uninteresting,
    Skipped,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorizedAnnouncement {
    pub announcement: RawAnnouncement,
    pub verdict: Verdict,
    pub outcome: Outcome,
}

/// The four-way partition of one triaged batch. Every categorized
/// announcement lands in exactly one bucket.
#[derive(Debug, Default)]
pub struct Buckets {
    pub interesting: Vec<CategorizedAnnouncement>,
    pub uninteresting: Vec<CategorizedAnnouncement>,
    pub skipped: Vec<CategorizedAnnouncement>,
    pub failed: Vec<CategorizedAnnouncement>,
}

impl Buckets {
    pub fn partition(announcements: Vec<CategorizedAnnouncement>) -> Self {
        let mut buckets = Buckets::default();

        for ann in announcements {
            match ann.outcome {
                Outcome::Interesting => buckets.interesting.push(ann),
                Outcome::Uninteresting => buckets.uninteresting.push(ann),
                Outcome::Skipped => buckets.skipped.push(ann),
                Outcome::Failed => buckets.failed.push(ann),
            }
        }

        buckets
    }

    pub fn total(&self) -> usize {
        self.interesting.len() + self.uninteresting.len() + self.skipped.len() + self.failed.len()
    }
}
