//! The owner of every [`Person`]. Individuals are stored in identifier order and are only
//! reachable through the population; the grid refers to them by [`PersonId`].
use crate::person::{DiseaseState, Person, PersonId};

/// Head counts per disease state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StateCounts {
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub dead: usize,
}

impl StateCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered + self.dead
    }
}

#[derive(Clone, Debug, Default)]
pub struct Population {
    people: Vec<Person>,
}

impl Population {
    #[must_use]
    pub fn new() -> Self {
        Population::default()
    }

    /// Appends `person`, whose id must be the next free index.
    pub fn add(&mut self, person: Person) -> PersonId {
        let id = person.id();
        assert_eq!(
            id.index(),
            self.people.len(),
            "people must be added in id order"
        );
        self.people.push(person);
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: PersonId) -> Option<&Person> {
        self.people.get(id.index())
    }

    pub fn get_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.people.get_mut(id.index())
    }

    /// Iterates in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Person> {
        self.people.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = PersonId> {
        (0..self.people.len()).map(PersonId::new)
    }

    pub fn count<F>(&self, predicate: F) -> usize
    where
        F: Fn(&Person) -> bool,
    {
        self.people.iter().filter(|person| predicate(person)).count()
    }

    #[must_use]
    pub fn count_state(&self, state: DiseaseState) -> usize {
        self.count(|person| person.state() == state)
    }

    #[must_use]
    pub fn state_counts(&self) -> StateCounts {
        let mut counts = StateCounts::default();
        for person in &self.people {
            match person.state() {
                DiseaseState::Susceptible => counts.susceptible += 1,
                DiseaseState::Infected => counts.infected += 1,
                DiseaseState::Recovered => counts.recovered += 1,
                DiseaseState::Dead => counts.dead += 1,
            }
        }
        counts
    }

    /// Mean number of secondary infections caused by individuals whose infection is over
    /// (recovered or dead). Zero while nobody has finished their infection.
    #[must_use]
    pub fn effective_r(&self) -> f64 {
        let (finished, secondary) = self
            .people
            .iter()
            .filter(|person| person.state().is_terminal())
            .fold((0usize, 0u64), |(finished, secondary), person| {
                (finished + 1, secondary + u64::from(person.has_infected()))
            });
        if finished == 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let (finished, secondary) = (finished as f64, secondary as f64);
        secondary / finished
    }
}
