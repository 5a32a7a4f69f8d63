use std::fmt::{Debug, Display, Formatter};

use log::trace;
use serde::{Deserialize, Serialize};
use strum::{Display as StrumDisplay, EnumIter};

use crate::parameters::{IncubationModel, InteractionType, Parameters};
use crate::random::{bernoulli, sample_normal, sample_rounded_normal, SimRng};

/// Represents a unique person.
//  the id is that person's index in the range 0 to pop_size - 1 in the population.
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PersonId(usize);

impl PersonId {
    #[must_use]
    pub fn new(index: usize) -> Self {
        PersonId(index)
    }

    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Debug for PersonId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Person {}", self.0)
    }
}

#[derive(
    Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize, StrumDisplay, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiseaseState {
    Susceptible,
    Infected,
    Recovered,
    Dead,
}

impl DiseaseState {
    /// Recovered and dead are absorbing states.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, DiseaseState::Recovered | DiseaseState::Dead)
    }

    /// Susceptible and infected individuals still wander the grid.
    #[must_use]
    pub fn is_mobile(self) -> bool {
        matches!(self, DiseaseState::Susceptible | DiseaseState::Infected)
    }
}

/// The mutable record of one individual.
#[derive(Clone, Debug)]
pub struct Person {
    id: PersonId,
    state: DiseaseState,
    days_infected: u32,
    days_to_recover: u32,
    asymptomatic: bool,
    days_presymptomatic: u32,
    interaction_rate: u32,
    has_infected: u32,
}

impl Person {
    /// Draws the personal parameters of a new, susceptible individual.
    pub fn sample(id: PersonId, parameters: &Parameters, rng: &mut SimRng) -> Self {
        let asymptomatic = bernoulli(rng, parameters.asymptomatic_prob);
        let days_to_recover =
            sample_rounded_normal(rng, parameters.recovery_mean, parameters.recovery_sd, 1);
        let days_presymptomatic = sample_presymptomatic_days(
            rng,
            parameters.presymptomatic_mean,
            parameters.presymptomatic_sd,
        );
        let interaction_rate = match parameters.incubation {
            // Not contagious until the presymptomatic period has elapsed.
            IncubationModel::FixedDelay => 0,
            IncubationModel::None => match parameters.interaction {
                InteractionType::Static => parameters.base_interaction_rate,
                InteractionType::Normal => {
                    let base = f64::from(parameters.base_interaction_rate);
                    sample_rounded_normal(rng, base, base / 5.0, 0)
                }
            },
        };
        Person {
            id,
            state: DiseaseState::Susceptible,
            days_infected: 0,
            days_to_recover,
            asymptomatic,
            days_presymptomatic,
            interaction_rate,
            has_infected: 0,
        }
    }

    #[must_use]
    pub fn id(&self) -> PersonId {
        self.id
    }

    #[must_use]
    pub fn state(&self) -> DiseaseState {
        self.state
    }

    #[must_use]
    pub fn days_infected(&self) -> u32 {
        self.days_infected
    }

    #[must_use]
    pub fn days_to_recover(&self) -> u32 {
        self.days_to_recover
    }

    #[must_use]
    pub fn is_asymptomatic(&self) -> bool {
        self.asymptomatic
    }

    #[must_use]
    pub fn days_presymptomatic(&self) -> u32 {
        self.days_presymptomatic
    }

    /// Radius of this individual's contact disk.
    #[must_use]
    pub fn interaction_rate(&self) -> u32 {
        self.interaction_rate
    }

    /// Number of individuals this one has infected.
    #[must_use]
    pub fn has_infected(&self) -> u32 {
        self.has_infected
    }

    /// Infected with a non-zero contact radius.
    #[must_use]
    pub fn is_contagious(&self) -> bool {
        self.state == DiseaseState::Infected && self.interaction_rate > 0
    }

    /// Moves a susceptible individual to `Infected`. Returns false, leaving the record untouched,
    /// for anybody else.
    pub fn infect(&mut self) -> bool {
        if self.state != DiseaseState::Susceptible {
            return false;
        }
        trace!("{} infected", self.id);
        self.state = DiseaseState::Infected;
        true
    }

    pub(crate) fn record_transmission(&mut self) {
        self.has_infected += 1;
    }

    /// The incubation period ends today.
    #[must_use]
    pub fn at_symptom_onset(&self) -> bool {
        self.state == DiseaseState::Infected && self.days_infected == self.days_presymptomatic
    }

    /// Redraws the contact radius once symptoms start. Symptomatic people mostly stay home
    /// (`Normal(1, 0.25)`), asymptomatic ones keep mixing around `base_interaction_rate`.
    pub fn begin_contagious_period(&mut self, base_interaction_rate: u32, rng: &mut SimRng) {
        let base = f64::from(base_interaction_rate);
        self.interaction_rate = if self.asymptomatic {
            sample_rounded_normal(rng, base, 0.2 * base, 0)
        } else {
            sample_rounded_normal(rng, 1.0, 0.25, 0)
        };
        trace!(
            "{} contagious with interaction rate {}",
            self.id,
            self.interaction_rate
        );
    }

    pub fn die(&mut self) {
        debug_assert_eq!(self.state, DiseaseState::Infected);
        trace!("{} died on day {} of infection", self.id, self.days_infected);
        self.state = DiseaseState::Dead;
    }

    /// Advances the infection by one day. Returns true when this completes the recovery.
    pub fn advance_infection(&mut self) -> bool {
        debug_assert_eq!(self.state, DiseaseState::Infected);
        self.days_infected += 1;
        if self.days_infected == self.days_to_recover {
            trace!("{} recovered after {} days", self.id, self.days_infected);
            self.state = DiseaseState::Recovered;
            return true;
        }
        false
    }
}

fn sample_presymptomatic_days(rng: &mut SimRng, mean: f64, sd: f64) -> u32 {
    let days = sample_normal(rng, mean, sd).round_ties_even();
    if days > 0.0 && days < f64::from(u32::MAX) {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let days = days as u32;
        days
    } else {
        // Fall back to the mean itself.
        sample_rounded_normal(rng, mean, 0.0, 1)
    }
}
