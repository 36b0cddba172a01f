use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use oddout_core::{CHOICES, ExperimentError, Layout, Result, StimulusPool};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub pool_size: usize,
    pub trial_count: usize,
    pub choice_count: usize,
    pub inter_trial_interval_ms: u64,
    pub poll_interval_ms: u64,
    pub question: String,

    pub log_dir: PathBuf,
    pub log_base_name: String,
    pub log_extension: String,

    pub image_dir: PathBuf,
    pub image_prefix: String,
    pub image_extension: String,

    pub seed: Option<u64>,
    pub font_path: Option<PathBuf>,
    pub fullscreen: bool,
    pub layout: Layout,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            pool_size: 1854,
            trial_count: 100,
            choice_count: CHOICES,
            inter_trial_interval_ms: 300,
            poll_interval_ms: 1,
            question: "Which is the odd one out?".into(),
            log_dir: "logs".into(),
            log_base_name: "log".into(),
            log_extension: "csv".into(),
            image_dir: "imgs".into(),
            image_prefix: "im".into(),
            image_extension: "png".into(),
            seed: None,
            font_path: None,
            fullscreen: false,
            layout: Layout::default(),
        }
    }
}

impl ExperimentConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(ExperimentError::InvalidConfiguration(msg));
        if self.pool_size == 0 || self.trial_count == 0 || self.choice_count == 0 {
            return invalid(format!(
                "counts must be positive (pool {}, trials {}, choices {})",
                self.pool_size, self.trial_count, self.choice_count
            ));
        }
        if self.choice_count != CHOICES {
            return invalid(format!(
                "trials show exactly {} images, choice_count is {}",
                CHOICES, self.choice_count
            ));
        }
        if self.choice_count > self.pool_size {
            return invalid(format!(
                "cannot draw {} distinct images from a pool of {}",
                self.choice_count, self.pool_size
            ));
        }
        if self.log_base_name.trim().is_empty() {
            return invalid("log_base_name is empty".into());
        }
        self.layout.validate()
    }

    pub fn stimulus_pool(&self) -> StimulusPool {
        StimulusPool::new(
            self.image_dir.clone(),
            self.image_prefix.clone(),
            self.image_extension.clone(),
        )
    }

    pub fn inter_trial_interval(&self) -> Duration {
        Duration::from_millis(self.inter_trial_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Seeded when `seed` is set, otherwise drawn from the OS.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

/// Load the JSON configuration at `path`, writing the defaults there first if it is missing.
pub fn load_or_init(path: &Path) -> Result<ExperimentConfig> {
    if path.exists() {
        let contents = fs::read_to_string(path).map_err(|e| ExperimentError::io(path, e))?;
        serde_json::from_str(&contents).map_err(|e| {
            ExperimentError::InvalidConfiguration(format!(
                "failed to parse config from {}: {}",
                path.display(),
                e
            ))
        })
    } else {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ExperimentError::io(parent, e))?;
        }
        let value = ExperimentConfig::default();
        let serialized = serde_json::to_string_pretty(&value).map_err(|e| {
            ExperimentError::InvalidConfiguration(format!("failed to serialize config: {}", e))
        })?;
        fs::write(path, serialized).map_err(|e| ExperimentError::io(path, e))?;
        Ok(value)
    }
}
