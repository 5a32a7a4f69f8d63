//! The spatial index: a square lattice of `env_dim × env_dim` cells whose occupants are
//! identified by [`PersonId`]. The lattice only stores back-references; the state of each
//! individual lives in the [`Population`](crate::population::Population).
//!
//! Two occupancy strategies implement [`Lattice`]:
//! * [`SingleOccupantGrid`]: each cell holds at most one individual.
//! * [`MultiOccupantGrid`]: each cell holds up to a fixed number of individuals.
//!
//! Movement wraps around the edges of the lattice (it is a torus); contact disks returned by
//! [`cells_within`] do not, they are clipped at the edges.
use log::{debug, trace};
use rand::Rng;
use serde::Serialize;

use crate::error::AirborneError;
use crate::person::PersonId;
use crate::random::SimRng;

/// Random placement gives up on rejection sampling after this many draws and falls back to
/// choosing among the remaining free cells.
const MAX_PLACEMENT_ATTEMPTS: usize = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    #[must_use]
    pub fn new(row: usize, col: usize) -> Self {
        Position { row, col }
    }

    /// The neighbouring position in `direction` on a torus of side `env_dim`.
    #[must_use]
    pub fn step(self, direction: Direction, env_dim: usize) -> Position {
        let (d_row, d_col) = direction.offset();
        Position {
            row: wrap(self.row, d_row, env_dim),
            col: wrap(self.col, d_col, env_dim),
        }
    }

    fn index(self, env_dim: usize) -> usize {
        self.row * env_dim + self.col
    }
}

fn wrap(coordinate: usize, delta: i8, env_dim: usize) -> usize {
    match delta {
        -1 => (coordinate + env_dim - 1) % env_dim,
        1 => (coordinate + 1) % env_dim,
        _ => coordinate,
    }
}

/// Iterates over every position of a lattice in row-major order.
pub fn all_positions(env_dim: usize) -> impl Iterator<Item = Position> {
    (0..env_dim).flat_map(move |row| (0..env_dim).map(move |col| Position::new(row, col)))
}

/// The positions within Euclidean distance `radius` of `center` (`dx² + dy² ≤ r²`), in
/// row-major order. The disk is clipped at the lattice edges rather than wrapped.
pub fn cells_within(
    center: Position,
    radius: u32,
    env_dim: usize,
) -> impl Iterator<Item = Position> {
    let radius = radius as usize;
    let rows = center.row.saturating_sub(radius)..=(center.row + radius).min(env_dim - 1);
    let cols = center.col.saturating_sub(radius)..=(center.col + radius).min(env_dim - 1);
    let radius_squared = radius * radius;
    rows.flat_map(move |row| cols.clone().map(move |col| Position::new(row, col)))
        .filter(move |position| {
            let d_row = position.row.abs_diff(center.row);
            let d_col = position.col.abs_diff(center.col);
            d_row * d_row + d_col * d_col <= radius_squared
        })
}

/// One of the eight compass steps to a neighbouring cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::North,
        Direction::NorthEast,
        Direction::East,
        Direction::SouthEast,
        Direction::South,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
    ];

    /// `(row, column)` offset of the step. Rows grow southwards.
    #[must_use]
    pub fn offset(self) -> (i8, i8) {
        match self {
            Direction::North => (-1, 0),
            Direction::NorthEast => (-1, 1),
            Direction::East => (0, 1),
            Direction::SouthEast => (1, 1),
            Direction::South => (1, 0),
            Direction::SouthWest => (1, -1),
            Direction::West => (0, -1),
            Direction::NorthWest => (-1, -1),
        }
    }
}

/// The occupancy strategy of the lattice.
///
/// Implementors keep an id → position map alongside the cells, so every lookup is O(1), and
/// provide the primitive operations; placement and movement are built on top of them.
pub trait Lattice {
    fn env_dim(&self) -> usize;

    /// The maximum number of individuals the lattice can hold.
    fn capacity(&self) -> usize;

    /// Number of individuals currently placed.
    fn occupant_count(&self) -> usize;

    fn position_of(&self, id: PersonId) -> Option<Position>;

    /// The individuals occupying `position`, in arrival order.
    fn occupants_at(&self, position: Position) -> &[PersonId];

    /// Whether another individual can enter `position`.
    fn has_room(&self, position: Position) -> bool;

    /// Places `id` at `position`. Returns false without mutating anything if the cell is full or
    /// `id` is already placed.
    fn insert(&mut self, id: PersonId, position: Position) -> bool;

    /// Takes `id` off the lattice, returning the position it occupied.
    fn remove(&mut self, id: PersonId) -> Option<Position>;

    /// Places `id` in a uniformly random cell with room.
    ///
    /// # Errors
    ///
    /// Returns a `CapacityError` if no cell has room.
    fn place_random(&mut self, id: PersonId, rng: &mut SimRng) -> Result<Position, AirborneError> {
        let env_dim = self.env_dim();
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let position = Position::new(rng.random_range(0..env_dim), rng.random_range(0..env_dim));
            if self.has_room(position) && self.insert(id, position) {
                trace!("placed {id} at {position:?}");
                return Ok(position);
            }
        }

        let free: Vec<Position> = all_positions(env_dim)
            .filter(|position| self.has_room(*position))
            .collect();
        if free.is_empty() {
            return Err(AirborneError::capacity(format!(
                "no free cell left on the {env_dim}x{env_dim} grid for {id}"
            )));
        }
        let position = free[rng.random_range(0..free.len())];
        if !self.insert(id, position) {
            return Err(AirborneError::capacity(format!("{id} is already placed")));
        }
        trace!("placed {id} at {position:?} after exhausting random draws");
        Ok(position)
    }

    /// Moves `id` one step in `direction`, wrapping around the edges. The move only happens if
    /// the destination has room; otherwise nothing changes and false is returned.
    fn attempt_move(&mut self, id: PersonId, direction: Direction) -> bool {
        let Some(from) = self.position_of(id) else {
            return false;
        };
        let to = from.step(direction, self.env_dim());
        if to == from || !self.has_room(to) {
            return false;
        }
        self.remove(id);
        self.insert(id, to)
    }

    /// Tries the eight directions in random order, without replacement, until a move succeeds.
    /// Returns false if every neighbouring cell is full.
    fn step_random(&mut self, id: PersonId, rng: &mut SimRng) -> bool {
        let mut directions = Direction::ALL.to_vec();
        while !directions.is_empty() {
            let direction = directions.swap_remove(rng.random_range(0..directions.len()));
            if self.attempt_move(id, direction) {
                return true;
            }
        }
        trace!("{id} is boxed in and stays put");
        false
    }

    /// Every `(position, occupant)` pair in row-major order.
    fn occupied(&self) -> Vec<(Position, PersonId)> {
        all_positions(self.env_dim())
            .flat_map(|position| {
                self.occupants_at(position)
                    .iter()
                    .map(move |id| (position, *id))
            })
            .collect()
    }
}

fn slot(positions: &mut Vec<Option<Position>>, id: PersonId) -> &mut Option<Position> {
    let index = id.index();
    if positions.len() <= index {
        positions.resize(index + 1, None);
    }
    &mut positions[index]
}

/// A lattice where each cell is either empty or holds exactly one individual.
#[derive(Debug, Clone)]
pub struct SingleOccupantGrid {
    env_dim: usize,
    cells: Vec<Option<PersonId>>,
    positions: Vec<Option<Position>>,
    occupants: usize,
}

impl SingleOccupantGrid {
    #[must_use]
    pub fn new(env_dim: usize) -> Self {
        debug!("creating {env_dim}x{env_dim} single occupant grid");
        SingleOccupantGrid {
            env_dim,
            cells: vec![None; env_dim * env_dim],
            positions: Vec::new(),
            occupants: 0,
        }
    }
}

impl Lattice for SingleOccupantGrid {
    fn env_dim(&self) -> usize {
        self.env_dim
    }

    fn capacity(&self) -> usize {
        self.cells.len()
    }

    fn occupant_count(&self) -> usize {
        self.occupants
    }

    fn position_of(&self, id: PersonId) -> Option<Position> {
        self.positions.get(id.index()).copied().flatten()
    }

    fn occupants_at(&self, position: Position) -> &[PersonId] {
        self.cells[position.index(self.env_dim)].as_slice()
    }

    fn has_room(&self, position: Position) -> bool {
        self.cells[position.index(self.env_dim)].is_none()
    }

    fn insert(&mut self, id: PersonId, position: Position) -> bool {
        if !self.has_room(position) || self.position_of(id).is_some() {
            return false;
        }
        self.cells[position.index(self.env_dim)] = Some(id);
        *slot(&mut self.positions, id) = Some(position);
        self.occupants += 1;
        true
    }

    fn remove(&mut self, id: PersonId) -> Option<Position> {
        let position = slot(&mut self.positions, id).take()?;
        self.cells[position.index(self.env_dim)] = None;
        self.occupants -= 1;
        Some(position)
    }
}

/// A lattice where each cell holds up to `cell_capacity` individuals.
#[derive(Debug, Clone)]
pub struct MultiOccupantGrid {
    env_dim: usize,
    cell_capacity: usize,
    cells: Vec<Vec<PersonId>>,
    positions: Vec<Option<Position>>,
    occupants: usize,
}

impl MultiOccupantGrid {
    #[must_use]
    pub fn new(env_dim: usize, cell_capacity: usize) -> Self {
        debug!("creating {env_dim}x{env_dim} grid holding up to {cell_capacity} per cell");
        MultiOccupantGrid {
            env_dim,
            cell_capacity,
            cells: vec![Vec::new(); env_dim * env_dim],
            positions: Vec::new(),
            occupants: 0,
        }
    }
}

impl Lattice for MultiOccupantGrid {
    fn env_dim(&self) -> usize {
        self.env_dim
    }

    fn capacity(&self) -> usize {
        self.cells.len() * self.cell_capacity
    }

    fn occupant_count(&self) -> usize {
        self.occupants
    }

    fn position_of(&self, id: PersonId) -> Option<Position> {
        self.positions.get(id.index()).copied().flatten()
    }

    fn occupants_at(&self, position: Position) -> &[PersonId] {
        &self.cells[position.index(self.env_dim)]
    }

    fn has_room(&self, position: Position) -> bool {
        self.cells[position.index(self.env_dim)].len() < self.cell_capacity
    }

    fn insert(&mut self, id: PersonId, position: Position) -> bool {
        if !self.has_room(position) || self.position_of(id).is_some() {
            return false;
        }
        self.cells[position.index(self.env_dim)].push(id);
        *slot(&mut self.positions, id) = Some(position);
        self.occupants += 1;
        true
    }

    fn remove(&mut self, id: PersonId) -> Option<Position> {
        let position = slot(&mut self.positions, id).take()?;
        let cell = &mut self.cells[position.index(self.env_dim)];
        cell.retain(|occupant| *occupant != id);
        self.occupants -= 1;
        Some(position)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::random::seeded_rng;

    fn id(i: usize) -> PersonId {
        PersonId::new(i)
    }

    #[test]
    fn step_wraps_around_edges() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.step(Direction::North, 5), Position::new(4, 0));
        assert_eq!(corner.step(Direction::NorthWest, 5), Position::new(4, 4));
        assert_eq!(
            Position::new(4, 4).step(Direction::SouthEast, 5),
            Position::new(0, 0)
        );
        assert_eq!(
            Position::new(2, 2).step(Direction::East, 5),
            Position::new(2, 3)
        );
    }

    #[test]
    fn directions_are_distinct_unit_steps() {
        let offsets: HashSet<(i8, i8)> = Direction::ALL.iter().map(|d| d.offset()).collect();
        assert_eq!(offsets.len(), 8);
        assert!(!offsets.contains(&(0, 0)));
    }

    #[test]
    fn disk_is_clipped_not_wrapped() {
        let cells: Vec<Position> = cells_within(Position::new(0, 0), 1, 10).collect();
        assert_eq!(
            cells,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 0)
            ]
        );
        assert!(!cells.contains(&Position::new(9, 0)));
    }

    #[test]
    fn disk_uses_euclidean_distance() {
        let cells: Vec<Position> = cells_within(Position::new(5, 5), 2, 11).collect();
        // Centre, four unit steps, four diagonals and four cells two steps out.
        assert_eq!(cells.len(), 13);
        assert!(cells.contains(&Position::new(3, 5)));
        assert!(cells.contains(&Position::new(4, 4)));
        // sqrt(5) and sqrt(8) lie outside the disk.
        assert!(!cells.contains(&Position::new(3, 4)));
        assert!(!cells.contains(&Position::new(3, 3)));
    }

    #[test]
    fn disk_of_radius_zero_is_the_center() {
        let cells: Vec<Position> = cells_within(Position::new(2, 3), 0, 5).collect();
        assert_eq!(cells, vec![Position::new(2, 3)]);
    }

    #[test]
    fn single_grid_rejects_second_occupant() {
        let mut grid = SingleOccupantGrid::new(3);
        assert!(grid.insert(id(0), Position::new(1, 1)));
        assert!(!grid.insert(id(1), Position::new(1, 1)));
        assert!(!grid.insert(id(0), Position::new(0, 0)));
        assert_eq!(grid.position_of(id(0)), Some(Position::new(1, 1)));
        assert_eq!(grid.position_of(id(1)), None);
        assert_eq!(grid.occupants_at(Position::new(1, 1)), &[id(0)]);
        assert_eq!(grid.occupant_count(), 1);
    }

    #[test]
    fn remove_vacates_the_cell() {
        let mut grid = SingleOccupantGrid::new(3);
        grid.insert(id(0), Position::new(2, 2));
        assert_eq!(grid.remove(id(0)), Some(Position::new(2, 2)));
        assert!(grid.has_room(Position::new(2, 2)));
        assert_eq!(grid.position_of(id(0)), None);
        assert_eq!(grid.remove(id(0)), None);
        assert_eq!(grid.occupant_count(), 0);
    }

    #[test]
    fn attempt_move_commits_only_into_empty_cells() {
        let mut grid = SingleOccupantGrid::new(4);
        grid.insert(id(0), Position::new(0, 0));
        grid.insert(id(1), Position::new(0, 1));

        assert!(!grid.attempt_move(id(0), Direction::East));
        assert_eq!(grid.position_of(id(0)), Some(Position::new(0, 0)));

        assert!(grid.attempt_move(id(0), Direction::West));
        assert_eq!(grid.position_of(id(0)), Some(Position::new(0, 3)));
        assert!(grid.has_room(Position::new(0, 0)));
        assert_eq!(grid.occupants_at(Position::new(0, 3)), &[id(0)]);
    }

    #[test]
    fn step_random_stays_put_when_boxed_in() {
        let mut grid = SingleOccupantGrid::new(3);
        for (i, position) in all_positions(3).enumerate() {
            assert!(grid.insert(id(i), position));
        }
        let mut rng = seeded_rng(42);
        assert!(!grid.step_random(id(4), &mut rng));
        assert_eq!(grid.position_of(id(4)), Some(Position::new(1, 1)));
    }

    #[test]
    fn step_random_finds_the_only_free_neighbour() {
        let mut grid = SingleOccupantGrid::new(3);
        for (i, position) in all_positions(3).enumerate() {
            if position != Position::new(0, 2) {
                assert!(grid.insert(id(i), position));
            }
        }
        let mut rng = seeded_rng(42);
        assert!(grid.step_random(id(4), &mut rng));
        assert_eq!(grid.position_of(id(4)), Some(Position::new(0, 2)));
        assert!(grid.has_room(Position::new(1, 1)));
    }

    #[test]
    fn place_random_fills_the_grid_then_fails() {
        let mut grid = SingleOccupantGrid::new(4);
        let mut rng = seeded_rng(1);
        let mut seen = HashSet::new();
        for i in 0..16 {
            let position = grid.place_random(id(i), &mut rng).unwrap();
            assert!(seen.insert(position));
        }
        assert_eq!(grid.occupant_count(), 16);
        assert!(matches!(
            grid.place_random(id(16), &mut rng),
            Err(AirborneError::CapacityError(_))
        ));
    }

    #[test]
    fn occupied_is_row_major() {
        let mut grid = SingleOccupantGrid::new(3);
        grid.insert(id(0), Position::new(2, 0));
        grid.insert(id(1), Position::new(0, 2));
        grid.insert(id(2), Position::new(1, 1));
        assert_eq!(
            grid.occupied(),
            vec![
                (Position::new(0, 2), id(1)),
                (Position::new(1, 1), id(2)),
                (Position::new(2, 0), id(0)),
            ]
        );
    }

    #[test]
    fn multi_grid_stacks_up_to_capacity() {
        let mut grid = MultiOccupantGrid::new(2, 2);
        assert_eq!(grid.capacity(), 8);
        let cell = Position::new(0, 0);
        assert!(grid.insert(id(0), cell));
        assert!(grid.insert(id(1), cell));
        assert!(!grid.has_room(cell));
        assert!(!grid.insert(id(2), cell));
        assert_eq!(grid.occupants_at(cell), &[id(0), id(1)]);

        assert_eq!(grid.remove(id(0)), Some(cell));
        assert_eq!(grid.occupants_at(cell), &[id(1)]);
        assert!(grid.has_room(cell));
    }

    #[test]
    fn multi_grid_moves_into_partially_filled_cells() {
        let mut grid = MultiOccupantGrid::new(3, 2);
        grid.insert(id(0), Position::new(1, 1));
        grid.insert(id(1), Position::new(1, 2));
        assert!(grid.attempt_move(id(0), Direction::East));
        assert_eq!(grid.occupants_at(Position::new(1, 2)), &[id(1), id(0)]);
        assert!(grid.occupants_at(Position::new(1, 1)).is_empty());
    }

    #[test]
    fn multi_grid_place_random_respects_capacity() {
        let mut grid = MultiOccupantGrid::new(2, 3);
        let mut rng = seeded_rng(9);
        for i in 0..12 {
            grid.place_random(id(i), &mut rng).unwrap();
        }
        for position in all_positions(2) {
            assert_eq!(grid.occupants_at(position).len(), 3);
        }
        assert!(grid.place_random(id(12), &mut rng).is_err());
    }
}
