// config.rs

use crate::cli::Args;
use crate::clock::SchedulerConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use log::{debug, info};
use std::path::Path;
use std::time::Duration;

pub const MIN_BPM: f64 = 20.0;
pub const MAX_BPM: f64 = 300.0;
pub const DEFAULT_BPM: f64 = 120.0;
pub const BPM_NUDGE: f64 = 1.0;

pub const PULSES_PER_QUARTER_NOTE: u64 = 24; // MIDI standard
pub const BEATS_PER_BAR: u64 = 4;

pub const DEFAULT_PORT_INDEX: usize = 0;
pub const DEFAULT_GUARD_BAND: Duration = Duration::from_micros(100);
pub const DEFAULT_DRIFT_THRESHOLD_PULSES: u32 = 4;

const SETTINGS_FILE_STEM: &str = "midiclockrs";
const ENV_PREFIX: &str = "MIDICLOCK";

/// Resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub bpm: f64,
    pub play: bool,
    /// `None` means "device default"
    pub port: Option<usize>,
    pub debug: bool,
    pub guard_band: Duration,
    pub drift_threshold_pulses: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bpm: DEFAULT_BPM,
            play: false,
            port: None,
            debug: true,
            guard_band: DEFAULT_GUARD_BAND,
            drift_threshold_pulses: DEFAULT_DRIFT_THRESHOLD_PULSES,
        }
    }
}

impl Settings {
    /// Defaults, then settings file, then `MIDICLOCK_*` environment, then
    /// command line.
    pub fn load(args: &Args) -> Result<Self, ConfigError> {
        let config = Self::builder(args.config.as_deref())?.build()?;
        let mut settings = Self::from_config(&config)?;
        settings.apply_args(args);
        info!("Loaded settings: {:?}", settings);
        Ok(settings)
    }

    pub fn builder(path: Option<&Path>) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let defaults = Settings::default();
        let file = match path {
            Some(path) => {
                debug!("Using settings file {}", path.display());
                File::from(path).required(true)
            }
            None => File::with_name(SETTINGS_FILE_STEM).required(false),
        };

        Ok(Config::builder()
            .set_default("bpm", defaults.bpm)?
            .set_default("play", defaults.play)?
            .set_default("port", -1i64)?
            .set_default("debug", defaults.debug)?
            .set_default("guard_band_us", defaults.guard_band.as_micros() as i64)?
            .set_default(
                "drift_threshold_pulses",
                i64::from(defaults.drift_threshold_pulses),
            )?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX)))
    }

    pub fn from_config(config: &Config) -> Result<Self, ConfigError> {
        let port = config.get_int("port")?;
        let guard_band_us = config.get_int("guard_band_us")?;
        let drift_threshold = config.get_int("drift_threshold_pulses")?;

        Ok(Settings {
            bpm: config.get_float("bpm")?,
            play: config.get_bool("play")?,
            port: usize::try_from(port).ok(),
            debug: config.get_bool("debug")?,
            guard_band: Duration::from_micros(guard_band_us.max(0) as u64),
            drift_threshold_pulses: u32::try_from(drift_threshold.max(1))
                .unwrap_or(DEFAULT_DRIFT_THRESHOLD_PULSES),
        })
    }

    /// Command-line values win over every other source
    pub fn apply_args(&mut self, args: &Args) {
        if let Some(bpm) = args.bpm {
            self.bpm = bpm;
        }
        if args.play {
            self.play = true;
        }
        if let Some(port) = args.port {
            self.port = usize::try_from(port).ok();
        }
        if args.no_debug {
            self.debug = false;
        }
        if let Some(us) = args.guard_band_us {
            self.guard_band = Duration::from_micros(us);
        }
        if let Some(pulses) = args.drift_threshold {
            self.drift_threshold_pulses = pulses.max(1);
        }
    }

    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig {
            guard_band: self.guard_band,
            drift_threshold_pulses: self.drift_threshold_pulses,
        }
    }
}
