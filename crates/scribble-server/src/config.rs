use std::time::Duration;

use serde::Deserialize;

/// Top-level server configuration, loaded from `scribble.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub web_root: String,
    /// `plain` or `json`.
    pub log_format: String,
    pub limits: LimitsConfig,
    pub timings: TimingsConfig,
    pub gallery: GalleryConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            web_root: "public".to_string(),
            log_format: "plain".to_string(),
            limits: LimitsConfig::default(),
            timings: TimingsConfig::default(),
            gallery: GalleryConfig::default(),
        }
    }
}

/// Infrastructure limits (connection caps, buffer sizes, rate limits).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_ws_connections: usize,
    /// Maximum concurrent WebSocket connections per IP address.
    pub max_ws_per_ip: usize,
    pub ws_rate_limit_per_sec: f64,
    pub player_message_buffer: usize,
    /// Upper bound on a submitted artifact data URL, in bytes.
    pub max_image_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_ws_connections: 200,
            max_ws_per_ip: 10,
            ws_rate_limit_per_sec: 60.0,
            player_message_buffer: 256,
            max_image_bytes: 400 * 1024,
        }
    }
}

/// Turn and round pacing. All durations are in milliseconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingsConfig {
    pub choice_timeout_ms: u64,
    pub countdown_ticks: u8,
    pub countdown_tick_ms: u64,
    pub reveal_pause_ms: u64,
    pub screenshot_timeout_ms: u64,
    pub game_start_delay_ms: u64,
    pub round_start_delay_ms: u64,
    pub all_guessed_grace_ms: u64,
}

impl Default for TimingsConfig {
    fn default() -> Self {
        Self {
            choice_timeout_ms: 15_000,
            countdown_ticks: 3,
            countdown_tick_ms: 1_000,
            reveal_pause_ms: 4_000,
            screenshot_timeout_ms: 5_000,
            game_start_delay_ms: 500,
            round_start_delay_ms: 1_000,
            all_guessed_grace_ms: 1_000,
        }
    }
}

impl TimingsConfig {
    pub fn choice_timeout(&self) -> Duration {
        Duration::from_millis(self.choice_timeout_ms)
    }

    pub fn countdown_tick(&self) -> Duration {
        Duration::from_millis(self.countdown_tick_ms)
    }

    pub fn reveal_pause(&self) -> Duration {
        Duration::from_millis(self.reveal_pause_ms)
    }

    pub fn screenshot_timeout(&self) -> Duration {
        Duration::from_millis(self.screenshot_timeout_ms)
    }

    pub fn game_start_delay(&self) -> Duration {
        Duration::from_millis(self.game_start_delay_ms)
    }

    pub fn round_start_delay(&self) -> Duration {
        Duration::from_millis(self.round_start_delay_ms)
    }

    pub fn all_guessed_grace(&self) -> Duration {
        Duration::from_millis(self.all_guessed_grace_ms)
    }
}

/// Persisted-drawing store location. In-memory when `path` is unset.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GalleryConfig {
    pub path: Option<String>,
}

impl ServerConfig {
    /// Collect every configuration problem that makes the server unusable.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            problems.push(format!(
                "listen_addr {:?} is not a valid socket address",
                self.listen_addr
            ));
        }
        if !matches!(self.log_format.as_str(), "plain" | "json") {
            problems.push(format!("log_format {:?} must be plain or json", self.log_format));
        }

        let limits = &self.limits;
        for (name, value) in [
            ("limits.max_ws_connections", limits.max_ws_connections),
            ("limits.max_ws_per_ip", limits.max_ws_per_ip),
            ("limits.player_message_buffer", limits.player_message_buffer),
            ("limits.max_image_bytes", limits.max_image_bytes),
        ] {
            if value == 0 {
                problems.push(format!("{name} must be > 0"));
            }
        }
        if !(limits.ws_rate_limit_per_sec > 0.0) {
            problems.push("limits.ws_rate_limit_per_sec must be > 0".to_string());
        }

        let t = &self.timings;
        for (name, value) in [
            ("timings.choice_timeout_ms", t.choice_timeout_ms),
            ("timings.countdown_tick_ms", t.countdown_tick_ms),
            ("timings.reveal_pause_ms", t.reveal_pause_ms),
            ("timings.screenshot_timeout_ms", t.screenshot_timeout_ms),
            ("timings.game_start_delay_ms", t.game_start_delay_ms),
            ("timings.round_start_delay_ms", t.round_start_delay_ms),
            ("timings.all_guessed_grace_ms", t.all_guessed_grace_ms),
        ] {
            if value == 0 {
                problems.push(format!("{name} must be > 0"));
            }
        }
        if t.countdown_ticks == 0 {
            problems.push("timings.countdown_ticks must be > 0".to_string());
        }
        problems
    }

    /// Validate configuration, exiting the process on unusable values.
    pub fn validate(&self) {
        let problems = self.problems();
        if problems.is_empty() {
            return;
        }
        for problem in &problems {
            tracing::error!("{problem}");
        }
        std::process::exit(1);
    }

    /// Load config from `scribble.toml` if it exists, then apply env var overrides.
    pub fn load() -> Self {
        let mut config = match std::fs::read_to_string("scribble.toml") {
            Ok(content) => match toml::from_str::<ServerConfig>(&content) {
                Ok(cfg) => {
                    tracing::info!("Loaded configuration from scribble.toml");
                    cfg
                },
                Err(e) => {
                    tracing::warn!("Failed to parse scribble.toml: {e}, using defaults");
                    ServerConfig::default()
                },
            },
            Err(_) => {
                tracing::info!("No scribble.toml found, using defaults");
                ServerConfig::default()
            },
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Apply `SCRIBBLE_*` overrides from `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("SCRIBBLE_LISTEN_ADDR")
            && !addr.is_empty()
        {
            self.listen_addr = addr;
        }
        if let Some(root) = lookup("SCRIBBLE_WEB_ROOT")
            && !root.is_empty()
        {
            self.web_root = root;
        }
        if let Some(path) = lookup("SCRIBBLE_GALLERY_PATH")
            && !path.is_empty()
        {
            self.gallery.path = Some(path);
        }
        if let Some(format) = lookup("SCRIBBLE_LOG_FORMAT")
            && !format.is_empty()
        {
            self.log_format = format;
        }
        if let Some(val) = lookup("SCRIBBLE_MAX_WS_CONNECTIONS")
            && let Ok(n) = val.parse::<usize>()
        {
            self.limits.max_ws_connections = n;
        }
        if let Some(val) = lookup("SCRIBBLE_WS_RATE_LIMIT")
            && let Ok(n) = val.parse::<f64>()
        {
            self.limits.ws_rate_limit_per_sec = n;
        }
    }
}
