//! Process configuration
//!
//! Assembled once at startup from the command line and environment.
//! Nothing reads the environment after construction; collaborators get the
//! values they need passed in.

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MODEL: &str = "gpt-4.1";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_OPENAI_API_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub github_token: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub github_api_url: String,
    pub openai_api_url: String,
    pub webhook_secret: Option<String>,
}

impl Config {
    pub fn new(github_token: impl Into<String>, openai_api_key: impl Into<String>) -> Self {
        Self {
            port: DEFAULT_PORT,
            github_token: github_token.into(),
            openai_api_key: openai_api_key.into(),
            openai_model: DEFAULT_MODEL.to_string(),
            github_api_url: DEFAULT_GITHUB_API_URL.to_string(),
            openai_api_url: DEFAULT_OPENAI_API_URL.to_string(),
            webhook_secret: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.openai_model = model.into();
        self
    }

    pub fn with_github_api_url(mut self, url: impl Into<String>) -> Self {
        self.github_api_url = url.into();
        self
    }

    pub fn with_openai_api_url(mut self, url: impl Into<String>) -> Self {
        self.openai_api_url = url.into();
        self
    }

    pub fn with_webhook_secret(mut self, secret: Option<String>) -> Self {
        self.webhook_secret = secret;
        self
    }
}
