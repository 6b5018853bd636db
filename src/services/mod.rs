pub mod courier;
pub mod fetcher;
pub mod idx_scraper;
pub mod navigator;
pub mod noise;
pub mod oracle;
pub mod pacer;
pub mod pdf_text;
pub mod scan;
pub mod triage;

pub use courier::*;
pub use fetcher::*;
pub use idx_scraper::*;
pub use navigator::*;
pub use noise::*;
pub use oracle::*;
pub use pacer::*;
pub use pdf_text::*;
pub use scan::*;
pub use triage::*;
