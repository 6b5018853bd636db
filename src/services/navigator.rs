use fake_user_agent::get_chrome_rua;
use thirtyfour::{error::WebDriverResult, ChromiumLikeCapabilities, DesiredCapabilities, WebDriver};

/// Headless Chrome session for the exchange website. The user agent is
/// randomized per session so repeated runs do not present an identical
/// fingerprint.
pub struct Navigator {
    pub driver: WebDriver,
}

impl Navigator {
    pub async fn connect(webdriver_url: &str) -> WebDriverResult<Self> {
        let mut caps = DesiredCapabilities::chrome();
        caps.set_headless()?;
        caps.add_arg("--no-sandbox")?;
        caps.add_arg("--disable-dev-shm-usage")?;
        caps.add_arg("--disable-gpu")?;

        let user_agent = get_chrome_rua();
        caps.add_arg(&format!("--user-agent={}", user_agent))?;

        let driver = WebDriver::new(webdriver_url, caps).await?;
        driver.maximize_window().await?;

        Ok(Navigator { driver })
    }
}
