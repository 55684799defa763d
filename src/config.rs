//! Router configuration.
//!
//! Manages routing settings loaded from an INI configuration file. Provides
//! defaults for safe startup and methods to load/save configuration.
//!
//! # Configuration File Format
//!
//! ```ini
//! [input]
//! context = gameplay
//! enabled = true
//! replay_samples = false
//! warn_threshold_ms = 100
//! ```

use configparser::ini::Ini;
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::input::context::InputContext;

/// Default safe values for startup
const DEFAULT_CONTEXT: InputContext = InputContext::Gameplay;
const DEFAULT_ENABLED: bool = true;
const DEFAULT_REPLAY_SAMPLES: bool = false;
const DEFAULT_WARN_THRESHOLD_MS: u64 = 100;
const DEFAULT_CONFIG_PATH: &str = "./relay.ini";

/// Routing configuration.
///
/// Stores the startup context, the global input gate, whether the sample
/// channels cache and replay their last value, and the slow-dispatch warning
/// threshold.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// Context the router starts in.
    pub start_context: InputContext,
    /// Whether input processing starts enabled.
    pub enabled: bool,
    /// Enable last-value caching/replay on the four sample channels. The
    /// context-change channel always replays.
    pub replay_samples: bool,
    /// Dispatch latency above which a warning is logged, in milliseconds.
    pub warn_threshold_ms: u64,
    /// Path to the configuration file.
    pub config_path: PathBuf,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RelayConfig {
    /// Create a new configuration with safe default values.
    pub fn new() -> Self {
        Self {
            start_context: DEFAULT_CONTEXT,
            enabled: DEFAULT_ENABLED,
            replay_samples: DEFAULT_REPLAY_SAMPLES,
            warn_threshold_ms: DEFAULT_WARN_THRESHOLD_MS,
            config_path: PathBuf::from(DEFAULT_CONFIG_PATH),
        }
    }

    /// Create a new configuration with a custom config file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: path.into(),
            ..Self::new()
        }
    }

    /// The warning threshold as a [`Duration`].
    pub fn warn_threshold(&self) -> Duration {
        Duration::from_millis(self.warn_threshold_ms)
    }

    /// Load configuration from the INI file.
    ///
    /// Missing values retain their current (default) values.
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(&mut self) -> Result<(), String> {
        let mut config = Ini::new();
        config
            .load(&self.config_path)
            .map_err(|e| format!("Failed to load config file: {}", e))?;

        // [input] section
        if let Some(context) = config.get("input", "context") {
            self.start_context = context
                .parse()
                .map_err(|e| format!("Bad context in config: {}", e))?;
        }
        if let Some(enabled) = config.getbool("input", "enabled").ok().flatten() {
            self.enabled = enabled;
        }
        if let Some(replay) = config.getbool("input", "replay_samples").ok().flatten() {
            self.replay_samples = replay;
        }
        if let Some(threshold) = config.getuint("input", "warn_threshold_ms").ok().flatten() {
            self.warn_threshold_ms = threshold;
        }

        info!(
            "Loaded config: context={}, enabled={}, replay_samples={}, warn_threshold_ms={}",
            self.start_context, self.enabled, self.replay_samples, self.warn_threshold_ms
        );

        Ok(())
    }

    /// Save configuration to the INI file.
    ///
    /// Creates the file if it doesn't exist.
    pub fn save_to_file(&self) -> Result<(), String> {
        let mut config = Ini::new();

        // [input] section
        config.set(
            "input",
            "context",
            Some(self.start_context.as_str().to_string()),
        );
        config.set("input", "enabled", Some(self.enabled.to_string()));
        config.set(
            "input",
            "replay_samples",
            Some(self.replay_samples.to_string()),
        );
        config.set(
            "input",
            "warn_threshold_ms",
            Some(self.warn_threshold_ms.to_string()),
        );

        config
            .write(&self.config_path)
            .map_err(|e| format!("Failed to save config file: {}", e))?;

        info!("Saved config to {:?}", self.config_path);

        Ok(())
    }
}
