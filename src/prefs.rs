//! Client session preferences with an explicit lifecycle.
//!
//! Replaces scattered key/value flags ("seen tutorial", "seen popup",
//! "redirect to portal after login") with one typed object: `init` loads or
//! creates it, getters read, setters persist, `clear` resets and removes it.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Portal {
    Citizen,
    Ngo,
    Government,
    Research,
}

impl Portal {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "citizen" => Some(Portal::Citizen),
            "ngo" => Some(Portal::Ngo),
            "government" | "gov" => Some(Portal::Government),
            "research" => Some(Portal::Research),
            _ => None,
        }
    }

    /// Route the portal lives under.
    pub fn route(&self) -> &'static str {
        match self {
            Portal::Citizen => "/citizen",
            Portal::Ngo => "/ngo",
            Portal::Government => "/government",
            Portal::Research => "/research",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct PrefsData {
    #[serde(default)]
    seen_tutorial: bool,
    #[serde(default)]
    seen_popup: bool,
    #[serde(default)]
    target_portal: Option<Portal>,
}

#[derive(Debug)]
pub struct SessionPrefs {
    path: PathBuf,
    data: PrefsData,
}

impl SessionPrefs {
    /// Load from `path`, or start fresh when the file is missing or unreadable.
    pub fn init(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match fs::read_to_string(&path) {
            Ok(s) => serde_json::from_str(&s).unwrap_or_else(|e| {
                tracing::warn!(error = %e, path = %path.display(), "prefs corrupt; starting fresh");
                PrefsData::default()
            }),
            Err(_) => PrefsData::default(),
        };
        Self { path, data }
    }

    pub fn seen_tutorial(&self) -> bool {
        self.data.seen_tutorial
    }

    pub fn seen_popup(&self) -> bool {
        self.data.seen_popup
    }

    pub fn target_portal(&self) -> Option<Portal> {
        self.data.target_portal
    }

    pub fn mark_tutorial_seen(&mut self) -> Result<()> {
        self.data.seen_tutorial = true;
        self.save()
    }

    pub fn mark_popup_seen(&mut self) -> Result<()> {
        self.data.seen_popup = true;
        self.save()
    }

    pub fn set_target_portal(&mut self, portal: Portal) -> Result<()> {
        self.data.target_portal = Some(portal);
        self.save()
    }

    /// Read and forget the pending redirect (one-shot after login).
    pub fn take_target_portal(&mut self) -> Result<Option<Portal>> {
        let p = self.data.target_portal.take();
        if p.is_some() {
            self.save()?;
        }
        Ok(p)
    }

    /// Reset everything and remove the backing file.
    pub fn clear(&mut self) -> Result<()> {
        self.data = PrefsData::default();
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e).with_context(|| format!("removing {}", self.path.display())),
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
        }
        let body = serde_json::to_vec_pretty(&self.data).context("serializing prefs")?;
        fs::write(&self.path, body).with_context(|| format!("writing {}", self.path.display()))
    }
}
