//! A grid-based simulation of an airborne infection
//!
//! Airborne models the spread of an infection through a population living on a square,
//! wrap-around lattice. Every tick each person takes a random step, contagious people expose the
//! susceptible people within their contact radius, and infections progress towards recovery or
//! death. Population-level counts and the effective reproduction number are recorded once per
//! tick in a [`StatsLedger`].
//!
//! The central object is the [`EpidemicEngine`], built from a validated [`Parameters`] record:
//!
//! ```rust
//! use airborne::{EpidemicEngine, ParametersBuilder};
//!
//! let parameters = ParametersBuilder::default()
//!     .env_dim(20)
//!     .pop_size(100)
//!     .initially_infected(2)
//!     .seed(42)
//!     .tick_limit(30)
//!     .build()
//!     .unwrap();
//! let mut engine = EpidemicEngine::new(parameters).unwrap();
//! let summary = engine.run();
//! assert_eq!(summary.ticks, 30);
//! ```
//!
//! The engine is made of:
//! * [`grid`]: the lattice and its occupancy strategies.
//! * [`person`] and [`population`]: the individuals and their disease state machine.
//! * [`random`]: the distributions behind movement, transmission and disease timing.
//! * [`stats`]: the per-tick ledger and the run summary.
//!
//! [`runner`] wraps all of it in a command line program.
pub mod engine;
pub mod error;
pub mod grid;
pub mod log;
pub mod parameters;
pub mod person;
pub mod population;
pub mod random;
pub mod runner;
pub mod stats;

pub use engine::{CellSnapshot, EpidemicEngine};
pub use error::AirborneError;
pub use grid::{Direction, Lattice, MultiOccupantGrid, Position, SingleOccupantGrid};
pub use parameters::{
    load_parameters, GridKind, IncubationModel, InteractionType, Parameters, ParametersBuilder,
};
pub use person::{DiseaseState, Person, PersonId};
pub use population::{Population, StateCounts};
pub use stats::{StatsLedger, Summary, TickRecord};

// Re-export for users building their own variates on the run's generator.
pub use rand;
