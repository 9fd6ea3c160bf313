//! The district grid and its per-district resident lists.

use crate::roster::Roster;
use crate::{Cell, GridConfig, GridError, PersonId};
use std::collections::HashSet;
use tracing::{debug, trace};

/// One grid position and the head/tail of its resident list.
///
/// A district does not own its residents; `head` and `tail` index into the
/// roster, and the list runs from most senior (`head`) to least senior
/// (`tail`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct District {
    cell: Cell,
    population: usize,
    head: Option<PersonId>,
    tail: Option<PersonId>,
}

impl District {
    const fn empty(cell: Cell) -> Self {
        Self {
            cell,
            population: 0,
            head: None,
            tail: None,
        }
    }

    #[must_use]
    pub const fn cell(&self) -> Cell {
        self.cell
    }

    /// Number of living residents.
    #[must_use]
    pub const fn population(&self) -> usize {
        self.population
    }

    /// Most senior resident.
    #[must_use]
    pub const fn head(&self) -> Option<PersonId> {
        self.head
    }

    /// Least senior resident.
    #[must_use]
    pub const fn tail(&self) -> Option<PersonId> {
        self.tail
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.population == 0
    }
}

/// Fixed-size grid of districts populated by people.
///
/// Every mutating call validates its arguments before touching any state, so
/// an `Err` always means nothing changed.
#[derive(Debug, Clone)]
pub struct PopulationGrid {
    rows: u32,
    cols: u32,
    districts: Vec<District>,
    roster: Roster,
    population: usize,
}

impl PopulationGrid {
    /// Build an empty `rows x cols` grid.
    pub fn new(rows: u32, cols: u32) -> Result<Self, GridError> {
        Self::from_config(&GridConfig { rows, cols })
    }

    /// Build an empty grid from a validated configuration.
    pub fn from_config(config: &GridConfig) -> Result<Self, GridError> {
        config.validate()?;
        let districts = (0..config.rows)
            .flat_map(|row| (0..config.cols).map(move |col| District::empty(Cell::new(row, col))))
            .collect();
        Ok(Self {
            rows: config.rows,
            cols: config.cols,
            districts,
            roster: Roster::new(),
            population: 0,
        })
    }

    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    #[must_use]
    pub const fn cols(&self) -> u32 {
        self.cols
    }

    /// Current living population of the whole grid.
    #[must_use]
    pub const fn population(&self) -> usize {
        self.population
    }

    /// Living population of district `(row, col)`; zero when out of bounds.
    #[must_use]
    pub fn district_population(&self, row: u32, col: u32) -> usize {
        self.district(row, col).map_or(0, District::population)
    }

    #[must_use]
    pub fn district(&self, row: u32, col: u32) -> Option<&District> {
        self.offset(row, col).map(|idx| &self.districts[idx])
    }

    /// All districts in row-major order.
    pub fn districts(&self) -> impl Iterator<Item = &District> + '_ {
        self.districts.iter()
    }

    /// Read-only view of the person table.
    #[must_use]
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Largest identifier ever issued plus one.
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.roster.len()
    }

    /// Identifiers queued for reuse, in the order they will be handed out.
    pub fn recycled(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.roster.recycled()
    }

    #[must_use]
    pub fn is_alive(&self, id: PersonId) -> bool {
        self.roster.get(id).is_some()
    }

    /// Create a person in district `(row, col)` as its least senior resident.
    pub fn birth(&mut self, row: u32, col: u32) -> Result<PersonId, GridError> {
        let cell = self.checked_cell(row, col).inspect_err(log_rejection)?;
        let id = self.roster.allocate(cell).inspect_err(log_rejection)?;
        self.link_tail(id, cell);
        self.population += 1;
        trace!(id = id.0, row, col, "birth");
        Ok(id)
    }

    /// Remove a living person and queue its identifier for reuse.
    pub fn death(&mut self, id: PersonId) -> Result<(), GridError> {
        self.living(id).inspect_err(log_rejection)?;
        self.unlink(id);
        self.roster.release(id);
        self.population -= 1;
        trace!(id = id.0, "death");
        Ok(())
    }

    /// Current district of a living person.
    pub fn whereis(&self, id: PersonId) -> Result<Cell, GridError> {
        self.living(id)
    }

    /// Move a living person to `(row, col)`, keeping its identifier.
    ///
    /// The person becomes the least senior resident of the target district,
    /// even when the target is its current district.
    pub fn relocate(&mut self, id: PersonId, row: u32, col: u32) -> Result<(), GridError> {
        let from = self.living(id).inspect_err(log_rejection)?;
        let to = self.checked_cell(row, col).inspect_err(log_rejection)?;
        self.unlink(id);
        self.roster.rehome(id, to);
        self.link_tail(id, to);
        trace!(
            id = id.0,
            from_row = from.row,
            from_col = from.col,
            row,
            col,
            "relocate"
        );
        Ok(())
    }

    /// Detached snapshot of the residents of `(row, col)`, most senior first.
    ///
    /// Out-of-bounds coordinates yield an empty list.
    #[must_use]
    pub fn members(&self, row: u32, col: u32) -> Vec<PersonId> {
        self.iter_members(row, col).collect()
    }

    /// Walk the residents of `(row, col)` without allocating.
    pub fn iter_members(&self, row: u32, col: u32) -> Members<'_> {
        Members {
            roster: &self.roster,
            cursor: self.district(row, col).and_then(District::head),
        }
    }

    /// Audit every structural invariant of the grid.
    ///
    /// Runs in time proportional to the roster plus the district count.
    pub fn check_invariants(&self) -> Result<(), GridError> {
        let mut seen = HashSet::with_capacity(self.population);
        let mut counted = 0usize;

        for district in &self.districts {
            let mut prev = None;
            let mut walked = 0usize;
            let mut cursor = district.head;
            while let Some(id) = cursor {
                let person = self.roster.get(id).ok_or_else(|| {
                    corrupted(format!("dead person {id} linked into {:?}", district.cell))
                })?;
                if person.cell() != district.cell {
                    return Err(corrupted(format!(
                        "person {id} records {:?} but is listed in {:?}",
                        person.cell(),
                        district.cell
                    )));
                }
                if person.prev() != prev {
                    return Err(corrupted(format!("person {id} has a broken prev link")));
                }
                if !seen.insert(id) {
                    return Err(corrupted(format!("person {id} is listed twice")));
                }
                walked += 1;
                prev = Some(id);
                cursor = person.next();
            }
            if district.tail != prev {
                return Err(corrupted(format!("{:?} tail mismatch", district.cell)));
            }
            if walked != district.population {
                return Err(corrupted(format!(
                    "{:?} counts {} residents but lists {walked}",
                    district.cell, district.population
                )));
            }
            counted += walked;
        }

        if counted != self.population {
            return Err(corrupted(format!(
                "grid population {} disagrees with district total {counted}",
                self.population
            )));
        }
        let living = self.roster.iter().filter(|p| p.is_alive()).count();
        if living != seen.len() {
            return Err(corrupted(format!(
                "{living} living people but {} listed",
                seen.len()
            )));
        }

        let mut pooled = HashSet::new();
        for id in self.roster.recycled() {
            if self.roster.get(id).is_some() {
                return Err(corrupted(format!("living person {id} is in the recycle pool")));
            }
            if !pooled.insert(id) {
                return Err(corrupted(format!("{id} is pooled twice")));
            }
        }
        if pooled.len() + living != self.roster.len() {
            return Err(corrupted(
                "recycle pool does not cover every dead slot".to_owned(),
            ));
        }
        Ok(())
    }

    /// Returns the flat index for `(row, col)`, if it lies on the grid.
    #[inline]
    fn offset(&self, row: u32, col: u32) -> Option<usize> {
        (row < self.rows && col < self.cols)
            .then(|| (row as usize) * (self.cols as usize) + (col as usize))
    }

    fn checked_cell(&self, row: u32, col: u32) -> Result<Cell, GridError> {
        match self.offset(row, col) {
            Some(_) => Ok(Cell::new(row, col)),
            None => Err(GridError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            }),
        }
    }

    fn living(&self, id: PersonId) -> Result<Cell, GridError> {
        self.roster
            .get(id)
            .map(|person| person.cell())
            .ok_or(GridError::InvalidId(id))
    }

    /// Append a living, unlinked person to the tail of `cell`'s list.
    fn link_tail(&mut self, id: PersonId, cell: Cell) {
        let Some(idx) = self.offset(cell.row, cell.col) else {
            return;
        };
        let old_tail = self.districts[idx].tail;
        if let Some(person) = self.roster.get_mut(id) {
            person.prev = old_tail;
            person.next = None;
        }
        match old_tail {
            Some(tail) => {
                if let Some(person) = self.roster.get_mut(tail) {
                    person.next = Some(id);
                }
            }
            None => self.districts[idx].head = Some(id),
        }
        let district = &mut self.districts[idx];
        district.tail = Some(id);
        district.population += 1;
    }

    /// Detach a living person from its district's list and clear its links.
    fn unlink(&mut self, id: PersonId) {
        let Some(person) = self.roster.get_mut(id) else {
            return;
        };
        let (cell, prev, next) = (person.cell(), person.prev.take(), person.next.take());
        let Some(idx) = self.offset(cell.row, cell.col) else {
            return;
        };

        match prev {
            Some(prev) => {
                if let Some(person) = self.roster.get_mut(prev) {
                    person.next = next;
                }
            }
            None => self.districts[idx].head = next,
        }
        match next {
            Some(next) => {
                if let Some(person) = self.roster.get_mut(next) {
                    person.prev = prev;
                }
            }
            None => self.districts[idx].tail = prev,
        }
        self.districts[idx].population -= 1;
    }
}

fn corrupted(message: String) -> GridError {
    GridError::Corrupted(message)
}

fn log_rejection(err: &GridError) {
    debug!(%err, "grid operation rejected");
}

/// Iterator over a district's residents, most senior first.
#[derive(Debug, Clone)]
pub struct Members<'a> {
    roster: &'a Roster,
    cursor: Option<PersonId>,
}

impl Iterator for Members<'_> {
    type Item = PersonId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cursor?;
        self.cursor = self.roster.get(id).and_then(|person| person.next());
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: u32, cols: u32) -> PopulationGrid {
        PopulationGrid::new(rows, cols).expect("grid")
    }

    #[test]
    fn new_grid_is_empty() {
        let grid = grid(3, 5);
        assert_eq!((grid.rows(), grid.cols()), (3, 5));
        assert_eq!(grid.population(), 0);
        assert_eq!(grid.districts().count(), 15);
        assert!(grid.districts().all(District::is_empty));
        grid.check_invariants().expect("empty grid is consistent");
    }

    #[test]
    fn districts_are_row_major() {
        let grid = grid(2, 3);
        let cells: Vec<_> = grid.districts().map(District::cell).collect();
        assert_eq!(cells[0], Cell::new(0, 0));
        assert_eq!(cells[2], Cell::new(0, 2));
        assert_eq!(cells[3], Cell::new(1, 0));
        assert_eq!(grid.district(1, 2).map(District::cell), Some(Cell::new(1, 2)));
        assert!(grid.district(2, 0).is_none());
    }

    #[test]
    fn unlink_handles_sole_head_tail_and_interior() {
        let mut grid = grid(1, 1);
        let ids: Vec<_> = (0..4).map(|_| grid.birth(0, 0).unwrap()).collect();

        // interior
        grid.death(ids[1]).unwrap();
        assert_eq!(grid.members(0, 0), vec![ids[0], ids[2], ids[3]]);
        // head
        grid.death(ids[0]).unwrap();
        assert_eq!(grid.district(0, 0).and_then(District::head), Some(ids[2]));
        // tail
        grid.death(ids[3]).unwrap();
        assert_eq!(grid.district(0, 0).and_then(District::tail), Some(ids[2]));
        // sole member
        grid.death(ids[2]).unwrap();
        let district = grid.district(0, 0).copied().unwrap();
        assert_eq!((district.head(), district.tail()), (None, None));
        assert_eq!(grid.population(), 0);
        grid.check_invariants().unwrap();
    }

    #[test]
    fn dead_person_links_are_cleared() {
        let mut grid = grid(1, 1);
        let a = grid.birth(0, 0).unwrap();
        let b = grid.birth(0, 0).unwrap();
        let c = grid.birth(0, 0).unwrap();
        grid.death(b).unwrap();
        let slot = grid.roster().slot(b).copied().unwrap();
        assert!(!slot.is_alive());
        assert_eq!((slot.prev(), slot.next()), (None, None));
        assert_eq!(grid.roster().get(a).and_then(|p| p.next()), Some(c));
        assert_eq!(grid.roster().get(c).and_then(|p| p.prev()), Some(a));
    }

    #[test]
    fn relocate_within_same_district_moves_to_tail() {
        let mut grid = grid(2, 2);
        let a = grid.birth(1, 0).unwrap();
        let b = grid.birth(1, 0).unwrap();
        grid.relocate(a, 1, 0).unwrap();
        assert_eq!(grid.members(1, 0), vec![b, a]);
        assert_eq!(grid.district_population(1, 0), 2);
        assert_eq!(grid.population(), 2);
        grid.check_invariants().unwrap();
    }

    #[test]
    fn audit_detects_counter_drift() {
        let mut grid = grid(2, 2);
        grid.birth(0, 0).unwrap();
        grid.population += 1;
        assert!(matches!(
            grid.check_invariants(),
            Err(GridError::Corrupted(_))
        ));
    }

    #[test]
    fn audit_detects_misfiled_resident() {
        let mut grid = grid(2, 2);
        let id = grid.birth(0, 0).unwrap();
        grid.roster.rehome(id, Cell::new(1, 1));
        assert!(grid.check_invariants().is_err());
    }
}
