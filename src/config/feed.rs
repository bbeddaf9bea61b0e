// src/config/feed.rs
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::background::{SceneConfig, Viewport};
use crate::realtime::RetryPolicy;

pub const ENV_FEED_CONFIG_PATH: &str = "FEED_CONFIG_PATH";
pub const ENV_ANON_KEY: &str = "SUPABASE_ANON_KEY";

fn default_poll_interval_ms() -> u64 {
    2_000
}
fn default_backoff_base_ms() -> u64 {
    500
}
fn default_backoff_max_ms() -> u64 {
    30_000
}
fn default_frame_interval_ms() -> u64 {
    16
}
fn default_particle_count() -> usize {
    50
}
fn default_viewport_width() -> f64 {
    1280.0
}
fn default_viewport_height() -> f64 {
    720.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Hosted backend base URL. Absent → in-process store.
    #[serde(default)]
    pub store_url: Option<String>,
    /// "ENV" means: read from SUPABASE_ANON_KEY.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_max_ms")]
    pub backoff_max_ms: u64,
    /// 0 = retry forever.
    #[serde(default)]
    pub max_retries: u32,
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
    #[serde(default = "default_particle_count")]
    pub particle_count: usize,
    #[serde(default = "default_viewport_width")]
    pub viewport_width: f64,
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            store_url: None,
            api_key: String::new(),
            poll_interval_ms: default_poll_interval_ms(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_max_ms: default_backoff_max_ms(),
            max_retries: 0,
            frame_interval_ms: default_frame_interval_ms(),
            particle_count: default_particle_count(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

impl FeedConfig {
    /// Load from a TOML or JSON file (by extension, TOML first otherwise).
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading feed config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg: FeedConfig = if ext == "json" {
            serde_json::from_str(&data).context("parsing feed config json")?
        } else {
            toml::from_str(&data).context("parsing feed config toml")?
        };
        cfg.finish()
    }

    /// Resolve config in order:
    /// 1) $FEED_CONFIG_PATH
    /// 2) config/feed.toml
    /// 3) config/feed.json
    /// 4) defaults
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = env::var(ENV_FEED_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
            return Err(anyhow!("{ENV_FEED_CONFIG_PATH} points to non-existent path"));
        }
        for candidate in ["config/feed.toml", "config/feed.json"] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from_file(&pb);
            }
        }
        Self::default().finish()
    }

    fn finish(mut self) -> Result<Self> {
        if self.api_key.trim().eq_ignore_ascii_case("env") {
            self.api_key =
                env::var(ENV_ANON_KEY).map_err(|_| anyhow!("Missing {ENV_ANON_KEY} env var"))?;
        }
        if self
            .store_url
            .as_deref()
            .is_some_and(|u| u.trim().is_empty())
        {
            self.store_url = None;
        }

        let defaults = Self::default();
        if self.poll_interval_ms == 0 {
            self.poll_interval_ms = defaults.poll_interval_ms;
        }
        if self.backoff_base_ms == 0 {
            self.backoff_base_ms = defaults.backoff_base_ms;
        }
        if self.backoff_max_ms < self.backoff_base_ms {
            self.backoff_max_ms = self.backoff_base_ms.max(defaults.backoff_max_ms);
        }
        if self.frame_interval_ms == 0 {
            self.frame_interval_ms = defaults.frame_interval_ms;
        }
        Ok(self)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            base: Duration::from_millis(self.backoff_base_ms),
            max: Duration::from_millis(self.backoff_max_ms),
            max_retries: self.max_retries,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn scene(&self) -> SceneConfig {
        SceneConfig {
            particle_count: self.particle_count,
            ..SceneConfig::default()
        }
    }

    /// `None` when the configured surface has no area.
    pub fn viewport(&self) -> Option<Viewport> {
        Viewport::new(self.viewport_width, self.viewport_height)
    }
}
