//! The `log` module configures the logging facilities of the simulator. Logging is about the
//! internal behavior of a run (setup, progress, individual state transitions) and is not to be
//! confused with the statistics ledger, which is the model-level output of a run.
//!
//! This module (re)exports the five logging macros: `error!`, `warn!`, `info!`, `debug!` and
//! `trace!` where `error!` represents the highest-priority log messages and `trace!` the lowest.
//!
//! Logging is _disabled_ by default. Log messages are enabled/disabled using the functions:
//!
//!  - `enable_logging()`: turns on all log messages
//!  - `disable_logging()`: turns off all log messages
//!  - `set_log_level(level: LevelFilter)`: enables only log messages with priority at least `level`
//!
//! Per-module filtering of messages can be configured using `set_module_filter()` and
//! `remove_module_filter()`, or in bulk from a textual specification with `apply_log_levels()`:
//!
//! ```rust
//! use airborne::log::{apply_log_levels, set_module_filter, LevelFilter};
//!
//! pub fn setup_logging() {
//!     // Progress messages for the whole crate, every transition for the engine.
//!     apply_log_levels("info,airborne::engine=trace").unwrap();
//!     // Silence the grid.
//!     set_module_filter("airborne::grid", LevelFilter::Off);
//! }
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::str::FromStr;

use crate::error::AirborneError;
#[cfg(feature = "logging")]
use log4rs::Handle;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// A level filter applied to the messages emitted from one module path
/// (e.g. `"airborne::engine"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Keeps track of the filter levels of modules and holds a handle to the global logger.
///
/// Because loggers are globally installed, only one instance of this struct should exist. The
/// public API are free functions which fetch the singleton and call the appropriate member
/// function.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The level filter for modules without an explicitly set filter. A global filter level of
    /// `LevelFilter::Off` disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    /// Handle to the `log4rs` logger.
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations: HashMap::new(),

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }

            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.insert_module_filter(module, level) {
            self.set_config();
        }
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }

    fn apply(&mut self, levels: &LogLevels) {
        if let Some(level) = levels.global {
            self.global_log_level = level;
        }
        for (module, level) in &levels.modules {
            self.insert_module_filter(module, *level);
        }
        self.set_config();
    }
}

/// A parsed log level specification such as `"info,airborne::engine=trace"`: an optional bare
/// global level followed by any number of `module=level` pairs.
#[derive(Debug, Default, PartialEq)]
pub struct LogLevels {
    pub global: Option<LevelFilter>,
    pub modules: Vec<(String, LevelFilter)>,
}

fn parse_level(text: &str) -> Result<LevelFilter, AirborneError> {
    LevelFilter::from_str(text.trim())
        .map_err(|_| AirborneError::configuration(format!("unknown log level `{}`", text.trim())))
}

/// Parses a comma separated log level specification.
///
/// # Errors
///
/// Returns a `ConfigurationError` if a level is not one of `off`, `error`, `warn`, `info`,
/// `debug` or `trace` (case insensitive) or if a module name is empty.
pub fn parse_log_levels(spec: &str) -> Result<LogLevels, AirborneError> {
    let mut levels = LogLevels::default();
    for item in spec.split(',').map(str::trim).filter(|item| !item.is_empty()) {
        match item.split_once('=') {
            Some((module, level)) => {
                let module = module.trim();
                if module.is_empty() {
                    return Err(AirborneError::configuration(format!(
                        "missing module name in log level `{item}`"
                    )));
                }
                levels.modules.push((module.to_string(), parse_level(level)?));
            }
            None => levels.global = Some(parse_level(item)?),
        }
    }
    Ok(levels)
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filter(module_path, level_filter);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Parses `spec` (see [`parse_log_levels`]) and installs the resulting filters.
///
/// # Errors
///
/// Returns a `ConfigurationError` if the specification cannot be parsed. Nothing is changed in
/// that case.
pub fn apply_log_levels(spec: &str) -> Result<(), AirborneError> {
    let levels = parse_log_levels(spec)?;
    get_log_configuration().apply(&levels);
    Ok(())
}

/// Fetches a mutable reference to the global `LogConfiguration`.
fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}
