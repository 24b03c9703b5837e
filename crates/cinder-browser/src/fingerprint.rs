use rand::Rng;

/// Identity the automation surface presents to the platform.
#[derive(Debug, Clone)]
pub struct FingerprintConfig {
    pub user_agent: String,
    pub viewport_width: u32,
    pub viewport_height: u32,
    /// Platform selectors assume an English UI
    pub accept_language: String,
}

impl FingerprintConfig {
    /// Pick a common desktop user agent at random.
    pub fn randomized() -> Self {
        let mut rng = rand::thread_rng();

        let user_agents = [
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
        ];

        let ua_idx = rng.gen_range(0..user_agents.len());

        Self {
            user_agent: user_agents[ua_idx].to_string(),
            viewport_width: 1280,
            viewport_height: 900,
            accept_language: "en-US".to_string(),
        }
    }

    #[must_use]
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Chromium command-line switches for this fingerprint.
    pub fn launch_args(&self) -> Vec<String> {
        vec![
            format!("--user-agent={}", self.user_agent),
            format!("--lang={}", self.accept_language),
            "--disable-blink-features=AutomationControlled".to_string(),
        ]
    }
}
