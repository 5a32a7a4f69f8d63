//! The configuration record of a run.
//!
//! Parameters are usually read from a JSON file in which every field is optional:
//!
//! ```json
//! {
//!     "env_dim": 50,
//!     "pop_size": 400,
//!     "infection_rate": 0.3,
//!     "grid": { "multi_occupant": { "cell_capacity": 13 } },
//!     "seed": 42
//! }
//! ```
//!
//! In code, use [`ParametersBuilder`]; unset fields take the same defaults as in files.
use std::fs;
use std::path::Path;

use derive_builder::Builder;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::AirborneError;

/// How many people a grid cell can hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridKind {
    #[default]
    SingleOccupant,
    MultiOccupant { cell_capacity: usize },
}

/// When an infected person starts transmitting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncubationModel {
    /// Contagious right away, at the interaction rate drawn at creation.
    None,
    /// Contagious once the presymptomatic period has elapsed, at a rate that depends on whether
    /// the person shows symptoms.
    #[default]
    FixedDelay,
}

/// How the interaction rate of a new person is drawn when there is no incubation period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionType {
    /// Everyone uses `base_interaction_rate`.
    #[default]
    Static,
    /// `round(Normal(base, base / 5))`, clamped at zero.
    Normal,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Builder)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    #[builder(default = "100")]
    pub env_dim: usize,

    #[builder(default = "1000")]
    pub pop_size: usize,

    #[builder(default = "10")]
    pub initially_infected: usize,

    #[builder(default = "2")]
    pub base_interaction_rate: u32,

    #[builder(default = "0.2")]
    pub infection_rate: f64,

    #[builder(default = "0.02")]
    pub mortality_rate: f64,

    #[builder(default = "19.0")]
    pub recovery_mean: f64,

    #[builder(default = "5.0")]
    pub recovery_sd: f64,

    #[builder(default = "13.0")]
    pub death_mean: f64,

    #[builder(default = "4.0")]
    pub death_sd: f64,

    #[builder(default = "0.25")]
    pub asymptomatic_prob: f64,

    #[builder(default = "4.5")]
    pub presymptomatic_mean: f64,

    #[builder(default = "2.0")]
    pub presymptomatic_sd: f64,

    /// Number of ticks to run; 0 runs until nobody is infectious.
    #[builder(default = "90")]
    pub tick_limit: usize,

    /// Seed of the run's generator. Drawn from OS entropy when absent.
    #[builder(default, setter(strip_option))]
    pub seed: Option<u64>,

    #[builder(default)]
    pub grid: GridKind,

    #[builder(default)]
    pub incubation: IncubationModel,

    #[builder(default)]
    pub interaction: InteractionType,

    /// Take dead and recovered people off the grid.
    #[builder(default = "true")]
    pub remove_on_exit: bool,

    #[builder(default = "true")]
    pub track_effective_r: bool,
}

impl Default for Parameters {
    fn default() -> Self {
        ParametersBuilder::default().build().unwrap()
    }
}

fn check_probability(name: &str, value: f64) -> Result<(), AirborneError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(AirborneError::configuration(format!(
            "{name} must be in [0, 1], got {value}"
        )))
    }
}

fn check_distribution(
    name: &str,
    mean: f64,
    sd: f64,
    sd_may_be_zero: bool,
) -> Result<(), AirborneError> {
    if !(mean.is_finite() && mean > 0.0) {
        return Err(AirborneError::configuration(format!(
            "{name}_mean must be positive, got {mean}"
        )));
    }
    let sd_ok = sd.is_finite() && (sd > 0.0 || (sd_may_be_zero && sd == 0.0));
    if !sd_ok {
        let bound = if sd_may_be_zero { "non-negative" } else { "positive" };
        return Err(AirborneError::configuration(format!(
            "{name}_sd must be {bound}, got {sd}"
        )));
    }
    Ok(())
}

impl Parameters {
    /// The number of people the grid can hold.
    #[must_use]
    pub fn grid_capacity(&self) -> usize {
        let cells = self.env_dim.saturating_mul(self.env_dim);
        match self.grid {
            GridKind::SingleOccupant => cells,
            GridKind::MultiOccupant { cell_capacity } => cells.saturating_mul(cell_capacity),
        }
    }

    /// Checks every field against its domain.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` for a rate outside `[0, 1]`, a non-positive mean, a bad
    /// spread, an empty grid or an empty cell capacity, and a `CapacityError` if the population
    /// does not fit on the grid or `initially_infected` is not in `(0, pop_size)`.
    pub fn validate(&self) -> Result<(), AirborneError> {
        if self.env_dim == 0 {
            return Err(AirborneError::configuration("env_dim must be positive"));
        }
        if let GridKind::MultiOccupant { cell_capacity: 0 } = self.grid {
            return Err(AirborneError::configuration("cell_capacity must be positive"));
        }
        check_probability("infection_rate", self.infection_rate)?;
        check_probability("mortality_rate", self.mortality_rate)?;
        check_probability("asymptomatic_prob", self.asymptomatic_prob)?;
        check_distribution("recovery", self.recovery_mean, self.recovery_sd, true)?;
        check_distribution("death", self.death_mean, self.death_sd, false)?;
        check_distribution(
            "presymptomatic",
            self.presymptomatic_mean,
            self.presymptomatic_sd,
            true,
        )?;

        if self.pop_size == 0 {
            return Err(AirborneError::capacity("pop_size must be positive"));
        }
        let capacity = self.grid_capacity();
        if self.pop_size > capacity {
            return Err(AirborneError::capacity(format!(
                "a population of {} does not fit on a {}x{} grid holding {capacity} people",
                self.pop_size, self.env_dim, self.env_dim
            )));
        }
        if self.initially_infected == 0 || self.initially_infected >= self.pop_size {
            return Err(AirborneError::capacity(format!(
                "initially_infected must be in (0, {}), got {}",
                self.pop_size, self.initially_infected
            )));
        }
        Ok(())
    }
}

/// Reads parameters from a JSON file. Fields missing from the file keep their defaults.
///
/// # Errors
///
/// Returns an `IoError` if the file cannot be read and a `JsonError` if it is not a valid
/// parameter record. The values themselves are not validated here.
pub fn load_parameters(path: &Path) -> Result<Parameters, AirborneError> {
    debug!("loading parameters from {}", path.display());
    let contents = fs::read_to_string(path)?;
    let parameters = serde_json::from_str(&contents)?;
    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_are_valid() {
        let parameters = Parameters::default();
        assert_eq!(parameters.env_dim, 100);
        assert_eq!(parameters.pop_size, 1000);
        assert_eq!(parameters.seed, None);
        assert_eq!(parameters.grid, GridKind::SingleOccupant);
        assert_eq!(parameters.incubation, IncubationModel::FixedDelay);
        assert!(parameters.remove_on_exit);
        parameters.validate().unwrap();
    }

    #[test]
    fn population_must_fit() {
        let parameters = ParametersBuilder::default()
            .env_dim(3)
            .pop_size(10)
            .initially_infected(1)
            .build()
            .unwrap();
        assert!(matches!(
            parameters.validate(),
            Err(AirborneError::CapacityError(_))
        ));

        let parameters = ParametersBuilder::default()
            .env_dim(3)
            .pop_size(10)
            .initially_infected(1)
            .grid(GridKind::MultiOccupant { cell_capacity: 2 })
            .build()
            .unwrap();
        assert_eq!(parameters.grid_capacity(), 18);
        parameters.validate().unwrap();
    }

    #[test]
    fn full_grid_is_allowed() {
        let parameters = ParametersBuilder::default()
            .env_dim(3)
            .pop_size(9)
            .initially_infected(1)
            .build()
            .unwrap();
        parameters.validate().unwrap();
    }

    #[test]
    fn initially_infected_range() {
        for initially_infected in [0, 50, 60] {
            let parameters = ParametersBuilder::default()
                .env_dim(10)
                .pop_size(50)
                .initially_infected(initially_infected)
                .build()
                .unwrap();
            assert!(matches!(
                parameters.validate(),
                Err(AirborneError::CapacityError(_))
            ));
        }
    }

    #[test]
    fn rates_outside_unit_interval() {
        let bad = [
            ParametersBuilder::default().infection_rate(1.5).build(),
            ParametersBuilder::default().mortality_rate(-0.1).build(),
            ParametersBuilder::default().asymptomatic_prob(f64::NAN).build(),
        ];
        for parameters in bad {
            assert!(matches!(
                parameters.unwrap().validate(),
                Err(AirborneError::ConfigurationError(_))
            ));
        }
    }

    #[test]
    fn distribution_checks() {
        let bad = [
            ParametersBuilder::default().recovery_mean(0.0).build(),
            ParametersBuilder::default().recovery_sd(-1.0).build(),
            ParametersBuilder::default().death_sd(0.0).build(),
            ParametersBuilder::default().death_mean(-13.0).build(),
            ParametersBuilder::default().presymptomatic_mean(0.0).build(),
            ParametersBuilder::default().env_dim(0).build(),
            ParametersBuilder::default()
                .grid(GridKind::MultiOccupant { cell_capacity: 0 })
                .build(),
        ];
        for parameters in bad {
            assert!(matches!(
                parameters.unwrap().validate(),
                Err(AirborneError::ConfigurationError(_))
            ));
        }
        ParametersBuilder::default()
            .recovery_sd(0.0)
            .build()
            .unwrap()
            .validate()
            .unwrap();
    }

    #[test]
    fn load_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{
                "env_dim": 20,
                "pop_size": 40,
                "seed": 7,
                "grid": {{ "multi_occupant": {{ "cell_capacity": 13 }} }},
                "incubation": "none",
                "interaction": "normal"
            }}"#
        )
        .unwrap();
        let parameters = load_parameters(file.path()).unwrap();
        assert_eq!(parameters.env_dim, 20);
        assert_eq!(parameters.pop_size, 40);
        assert_eq!(parameters.seed, Some(7));
        assert_eq!(
            parameters.grid,
            GridKind::MultiOccupant { cell_capacity: 13 }
        );
        assert_eq!(parameters.incubation, IncubationModel::None);
        assert_eq!(parameters.interaction, InteractionType::Normal);
        assert_eq!(parameters.recovery_mean, 19.0);
    }

    #[test]
    fn load_rejects_unknown_fields() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{ "env_dimension": 20 }}"#).unwrap();
        assert!(matches!(
            load_parameters(file.path()),
            Err(AirborneError::JsonError(_))
        ));
    }

    #[test]
    fn load_missing_file() {
        assert!(matches!(
            load_parameters(Path::new("/no/such/parameters.json")),
            Err(AirborneError::IoError(_))
        ));
    }
}
