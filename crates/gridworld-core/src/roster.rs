//! Append-only person table with FIFO identifier recycling.

use crate::{Cell, GridError, PersonId};
use std::collections::VecDeque;

/// One slot of the roster.
///
/// Slots are overwritten in place when an identifier is recycled. The
/// `next`/`prev` links thread the person into its district's resident list and
/// are cleared while the person is dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Person {
    id: PersonId,
    cell: Cell,
    alive: bool,
    pub(crate) next: Option<PersonId>,
    pub(crate) prev: Option<PersonId>,
}

impl Person {
    fn born(id: PersonId, cell: Cell) -> Self {
        Self {
            id,
            cell,
            alive: true,
            next: None,
            prev: None,
        }
    }

    #[must_use]
    pub const fn id(&self) -> PersonId {
        self.id
    }

    /// District the person lives in (or last lived in, if dead).
    #[must_use]
    pub const fn cell(&self) -> Cell {
        self.cell
    }

    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Next (less senior) resident of the same district.
    #[must_use]
    pub const fn next(&self) -> Option<PersonId> {
        self.next
    }

    /// Previous (more senior) resident of the same district.
    #[must_use]
    pub const fn prev(&self) -> Option<PersonId> {
        self.prev
    }
}

/// Dense table of people indexed by [`PersonId`].
///
/// The table never shrinks. Dead slots are tombstoned and their identifiers
/// queued for reuse in the order they died.
#[derive(Debug, Default, Clone)]
pub struct Roster {
    people: Vec<Person>,
    recycled: VecDeque<PersonId>,
}

impl Roster {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots ever issued (the high-water mark).
    #[must_use]
    pub fn len(&self) -> usize {
        self.people.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Number of living people in the table.
    #[must_use]
    pub fn living(&self) -> usize {
        self.people.len() - self.recycled.len()
    }

    /// Identifiers waiting for reuse, oldest death first.
    pub fn recycled(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.recycled.iter().copied()
    }

    /// Any slot, alive or dead.
    #[must_use]
    pub fn slot(&self, id: PersonId) -> Option<&Person> {
        self.people.get(id.index())
    }

    /// The person behind `id`, if alive.
    #[must_use]
    pub fn get(&self, id: PersonId) -> Option<&Person> {
        self.slot(id).filter(|person| person.alive)
    }

    pub(crate) fn get_mut(&mut self, id: PersonId) -> Option<&mut Person> {
        self.people.get_mut(id.index()).filter(|person| person.alive)
    }

    /// Iterate over every slot in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Person> + '_ {
        self.people.iter()
    }

    /// Issue an identifier for a new person living in `cell`.
    ///
    /// The oldest recycled identifier is reused first; otherwise a new slot is
    /// appended. The returned person is alive and unlinked.
    pub(crate) fn allocate(&mut self, cell: Cell) -> Result<PersonId, GridError> {
        if let Some(id) = self.recycled.pop_front() {
            self.people[id.index()] = Person::born(id, cell);
            return Ok(id);
        }
        let raw = u32::try_from(self.people.len())
            .map_err(|_| GridError::InvalidConfig("roster cannot issue more identifiers"))?;
        let id = PersonId(raw);
        self.people.push(Person::born(id, cell));
        Ok(id)
    }

    /// Tombstone a living person and queue its identifier for reuse.
    ///
    /// Callers must unlink the person from its district first.
    pub(crate) fn release(&mut self, id: PersonId) -> bool {
        let Some(person) = self.get_mut(id) else {
            return false;
        };
        debug_assert!(person.next.is_none() && person.prev.is_none());
        person.alive = false;
        person.next = None;
        person.prev = None;
        self.recycled.push_back(id);
        true
    }

    /// Update the recorded district of a living person.
    pub(crate) fn rehome(&mut self, id: PersonId, cell: Cell) {
        if let Some(person) = self.get_mut(id) {
            person.cell = cell;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_appends_sequential_ids() {
        let mut roster = Roster::new();
        let a = roster.allocate(Cell::new(0, 0)).unwrap();
        let b = roster.allocate(Cell::new(1, 1)).unwrap();
        assert_eq!((a, b), (PersonId(0), PersonId(1)));
        assert_eq!(roster.len(), 2);
        assert_eq!(roster.living(), 2);
        assert_eq!(roster.get(b).map(Person::cell), Some(Cell::new(1, 1)));
    }

    #[test]
    fn release_tombstones_without_shrinking() {
        let mut roster = Roster::new();
        let a = roster.allocate(Cell::new(0, 0)).unwrap();
        assert!(roster.release(a));
        assert!(!roster.release(a), "double release must fail");
        assert_eq!(roster.len(), 1);
        assert_eq!(roster.living(), 0);
        assert!(roster.get(a).is_none());
        assert!(roster.slot(a).is_some_and(|p| !p.is_alive()));
    }

    #[test]
    fn recycling_is_first_in_first_out() {
        let mut roster = Roster::new();
        let ids: Vec<_> = (0..4)
            .map(|_| roster.allocate(Cell::default()).unwrap())
            .collect();
        roster.release(ids[2]);
        roster.release(ids[0]);
        roster.release(ids[3]);
        assert_eq!(
            roster.recycled().collect::<Vec<_>>(),
            vec![ids[2], ids[0], ids[3]]
        );

        let reborn = roster.allocate(Cell::new(3, 4)).unwrap();
        assert_eq!(reborn, ids[2]);
        assert_eq!(roster.get(reborn).map(Person::cell), Some(Cell::new(3, 4)));
        assert_eq!(roster.allocate(Cell::default()).unwrap(), ids[0]);
        assert_eq!(roster.allocate(Cell::default()).unwrap(), ids[3]);
        assert_eq!(roster.allocate(Cell::default()).unwrap(), PersonId(4));
        assert_eq!(roster.len(), 5);
    }

    #[test]
    fn lookups_past_high_water_mark_fail() {
        let roster = Roster::new();
        assert!(roster.get(PersonId(0)).is_none());
        assert!(roster.slot(PersonId(u32::MAX)).is_none());
    }
}
