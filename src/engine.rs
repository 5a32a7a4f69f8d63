//! The simulation engine. An [`EpidemicEngine`] owns the grid, the population, the statistics
//! ledger and the run's random number generator, and advances them one tick at a time:
//!
//! 1. In identifier order, every susceptible or infected person takes a random step, and a
//!    contagious one then exposes every susceptible person within its contact radius.
//! 2. Every infected person progresses: symptom onset, the daily mortality roll, then one more
//!    day towards recovery.
//! 3. The effective reproduction number is computed and a [`TickRecord`] is appended to the
//!    ledger.
//!
//! A run either lasts a fixed number of ticks or, with `tick_limit = 0`, ends at the first tick
//! after which nobody is infectious.
use log::{debug, info, trace};
use rand::Rng;
use serde::Serialize;

use crate::error::AirborneError;
use crate::grid::{cells_within, Lattice, MultiOccupantGrid, SingleOccupantGrid};
use crate::parameters::{GridKind, IncubationModel, Parameters};
use crate::person::{DiseaseState, Person, PersonId};
use crate::population::Population;
use crate::random::{bernoulli, seeded_rng, DeathCurve, SimRng};
use crate::stats::{StatsLedger, Summary, TickRecord};

/// Ticks between two progress lines in the log.
const PROGRESS_INTERVAL: usize = 10;

/// One occupied cell as seen by a renderer.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CellSnapshot {
    pub row: usize,
    pub col: usize,
    pub id: PersonId,
    pub state: DiseaseState,
    pub is_contagious: bool,
    pub interaction_rate: u32,
}

#[derive(Debug, Default, Clone, Copy)]
struct Exposure {
    contacts: usize,
    infections: usize,
}

pub struct EpidemicEngine {
    parameters: Parameters,
    seed: u64,
    rng: SimRng,
    grid: Box<dyn Lattice>,
    population: Population,
    death_curve: DeathCurve,
    ledger: StatsLedger,
    tick: usize,
}

fn build_grid(parameters: &Parameters) -> Box<dyn Lattice> {
    match parameters.grid {
        GridKind::SingleOccupant => Box::new(SingleOccupantGrid::new(parameters.env_dim)),
        GridKind::MultiOccupant { cell_capacity } => {
            Box::new(MultiOccupantGrid::new(parameters.env_dim, cell_capacity))
        }
    }
}

impl EpidemicEngine {
    /// Validates `parameters`, creates the population, places it on the grid and records the
    /// tick 0 baseline.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigurationError` or `CapacityError` if the parameters are invalid, see
    /// [`Parameters::validate`].
    pub fn new(parameters: Parameters) -> Result<Self, AirborneError> {
        parameters.validate()?;

        let seed = if let Some(seed) = parameters.seed {
            seed
        } else {
            let seed = rand::rng().random();
            info!("no seed configured, using {seed}");
            seed
        };
        let mut rng = seeded_rng(seed);
        let death_curve = DeathCurve::new(
            parameters.mortality_rate,
            parameters.death_mean,
            parameters.death_sd,
        )?;

        let mut population = Population::new();
        for index in 0..parameters.pop_size {
            let mut person = Person::sample(PersonId::new(index), &parameters, &mut rng);
            if index < parameters.initially_infected {
                person.infect();
            }
            population.add(person);
        }

        let mut grid = build_grid(&parameters);
        for id in population.ids() {
            grid.place_random(id, &mut rng)?;
        }
        debug!(
            "placed {} people ({} infected) on a {}x{} grid",
            parameters.pop_size,
            parameters.initially_infected,
            parameters.env_dim,
            parameters.env_dim
        );

        let mut engine = EpidemicEngine {
            ledger: StatsLedger::new(parameters.pop_size),
            parameters,
            seed,
            rng,
            grid,
            population,
            death_curve,
            tick: 0,
        };
        let baseline = TickRecord::new(0, engine.population.state_counts(), 0.0);
        engine.ledger.push(baseline);
        Ok(engine)
    }

    #[must_use]
    pub fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// The seed the run's generator was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of completed ticks.
    #[must_use]
    pub fn tick(&self) -> usize {
        self.tick
    }

    #[must_use]
    pub fn grid(&self) -> &dyn Lattice {
        self.grid.as_ref()
    }

    #[must_use]
    pub fn population(&self) -> &Population {
        &self.population
    }

    #[must_use]
    pub fn ledger(&self) -> &StatsLedger {
        &self.ledger
    }

    #[must_use]
    pub fn infectious(&self) -> usize {
        self.population.count_state(DiseaseState::Infected)
    }

    /// Whether the configured termination condition has been reached.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        if self.parameters.tick_limit > 0 {
            self.tick >= self.parameters.tick_limit
        } else {
            self.tick > 0 && self.infectious() == 0
        }
    }

    /// Steps until [`is_finished`](Self::is_finished) and returns the run's summary.
    pub fn run(&mut self) -> Summary {
        info!(
            "starting run: {} people, {} initially infected, seed {}",
            self.parameters.pop_size, self.parameters.initially_infected, self.seed
        );
        while !self.is_finished() {
            self.step();
        }
        let summary = self.summary();
        info!(
            "run finished after {} ticks: {} recovered, {} dead, max infectious {}",
            summary.ticks, summary.total_recovered, summary.total_dead, summary.max_infectious
        );
        summary
    }

    /// Advances the simulation by one tick and returns the record appended to the ledger.
    pub fn step(&mut self) -> TickRecord {
        self.tick += 1;
        let exposure = self.move_and_transmit();
        self.progress_infections();

        let r_effective = if self.parameters.track_effective_r {
            self.population.effective_r()
        } else {
            0.0
        };
        let mut record = TickRecord::new(self.tick, self.population.state_counts(), r_effective);
        record.new_infections = exposure.infections;
        record.contacts = exposure.contacts;
        self.ledger.push(record);

        debug!(
            "tick {}: {} susceptible, {} infectious, {} recovered, {} dead, {} new infections",
            record.tick,
            record.susceptible,
            record.infectious,
            record.recovered,
            record.dead,
            record.new_infections
        );
        if self.tick % PROGRESS_INTERVAL == 0 {
            info!(
                "tick {}: {} infectious, R effective {:.2}",
                record.tick, record.infectious, record.r_effective
            );
        }
        record
    }

    fn move_and_transmit(&mut self) -> Exposure {
        let mut exposure = Exposure::default();
        for index in 0..self.population.len() {
            let id = PersonId::new(index);
            let Some(person) = self.population.get(id) else {
                continue;
            };
            if !person.state().is_mobile() {
                continue;
            }
            let contagious = person.is_contagious();
            let radius = person.interaction_rate();

            self.grid.step_random(id, &mut self.rng);
            if contagious {
                let result = self.transmit(id, radius);
                exposure.contacts += result.contacts;
                exposure.infections += result.infections;
            }
        }
        exposure
    }

    /// Gives every susceptible person within `radius` of `infector` one chance of catching the
    /// infection. The disk is clipped at the grid edges.
    fn transmit(&mut self, infector: PersonId, radius: u32) -> Exposure {
        let Some(center) = self.grid.position_of(infector) else {
            return Exposure::default();
        };
        let candidates: Vec<PersonId> = cells_within(center, radius, self.grid.env_dim())
            .flat_map(|position| self.grid.occupants_at(position).iter().copied())
            .filter(|id| *id != infector)
            .filter(|id| {
                self.population
                    .get(*id)
                    .is_some_and(|person| person.state() == DiseaseState::Susceptible)
            })
            .collect();

        let mut exposure = Exposure {
            contacts: candidates.len(),
            infections: 0,
        };
        for candidate in candidates {
            if !bernoulli(&mut self.rng, self.parameters.infection_rate) {
                continue;
            }
            let infected = self
                .population
                .get_mut(candidate)
                .is_some_and(Person::infect);
            if infected {
                trace!("{infector} infected {candidate}");
                exposure.infections += 1;
                if let Some(person) = self.population.get_mut(infector) {
                    person.record_transmission();
                }
            }
        }
        exposure
    }

    fn progress_infections(&mut self) {
        let fixed_delay = self.parameters.incubation == IncubationModel::FixedDelay;
        for index in 0..self.population.len() {
            let id = PersonId::new(index);
            let Some(person) = self.population.get_mut(id) else {
                continue;
            };
            if person.state() != DiseaseState::Infected {
                continue;
            }
            if fixed_delay && person.at_symptom_onset() {
                let base_interaction_rate = self.parameters.base_interaction_rate;
                person.begin_contagious_period(base_interaction_rate, &mut self.rng);
            }

            let death_probability = self.death_curve.daily_probability(person.days_infected());
            let exited = if bernoulli(&mut self.rng, death_probability) {
                person.die();
                true
            } else {
                person.advance_infection()
            };
            if exited && self.parameters.remove_on_exit {
                self.grid.remove(id);
            }
        }
    }

    /// Every occupied cell in row-major order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CellSnapshot> {
        self.grid
            .occupied()
            .into_iter()
            .filter_map(|(position, id)| {
                self.population.get(id).map(|person| CellSnapshot {
                    row: position.row,
                    col: position.col,
                    id,
                    state: person.state(),
                    is_contagious: person.is_contagious(),
                    interaction_rate: person.interaction_rate(),
                })
            })
            .collect()
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        self.ledger.summary(self.seed)
    }
}
