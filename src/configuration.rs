use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub api_keys: ApiKeySettings,
    pub email: EmailSettings,
    pub scraper: ScraperSettings,
    pub oracle: OracleSettings,
    pub triage: TriageSettings,
}

#[derive(Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

#[derive(Deserialize, Clone)]
pub struct ApiKeySettings {
    pub gemini: String,
    pub mailjet_key: String,
    pub mailjet_secret: String,
}

#[derive(Deserialize, Clone)]
pub struct EmailSettings {
    pub sender: String,
    pub sender_name: String,
    pub receiver: String,
}

#[derive(Deserialize, Clone)]
pub struct ScraperSettings {
    pub webdriver_url: String,
    pub target_url: String,
    pub page_settle_ms: u64,
}

#[derive(Deserialize, Clone)]
pub struct OracleSettings {
    pub model: String,
    pub prompt_template: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub text_only_limit: usize,
    pub multimodal_text_limit: usize,
}

#[derive(Deserialize, Clone)]
pub struct TriageSettings {
    pub noise_patterns: Vec<String>,
    pub scanned_text_threshold: usize,
    pub download_pause_ms: u64,
    pub announcement_pause_ms: u64,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(
            config::File::from(configuration_directory.join("local.yaml")).required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
