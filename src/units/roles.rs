//! Role bookkeeping
//!
//! Every own unit belongs to at most one role group. Reassignment is the
//! only way membership changes, and assigning the role a unit already has
//! is a no-op.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::units::unit::UnitId;

/// Group a friendly unit is working for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitRole {
    /// Main army
    Attacking,
    /// Peeled off to answer a threat at a base
    BaseDefender,
    /// Holding a position for the production layer
    Defending,
    Scouting,
    GateKeeper,
    DropShip,
}

impl UnitRole {
    pub const ALL: [UnitRole; 6] = [
        UnitRole::Attacking,
        UnitRole::BaseDefender,
        UnitRole::Defending,
        UnitRole::Scouting,
        UnitRole::GateKeeper,
        UnitRole::DropShip,
    ];
}

/// Role store shared with the rest of the agent
pub trait RoleBook {
    /// Put `unit` in `role`, removing it from any other role
    fn assign_role(&mut self, unit: UnitId, role: UnitRole);

    fn role_of(&self, unit: UnitId) -> Option<UnitRole>;

    /// Members of a role in ascending id order
    fn units_with_role(&self, role: UnitRole) -> Vec<UnitId>;

    /// Forget units that no longer exist
    fn remove(&mut self, unit: UnitId);
}

/// In-memory role store
#[derive(Debug, Clone, Default)]
pub struct RoleRegistry {
    roles: AHashMap<UnitId, UnitRole>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.roles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }
}

impl RoleBook for RoleRegistry {
    fn assign_role(&mut self, unit: UnitId, role: UnitRole) {
        self.roles.insert(unit, role);
    }

    fn role_of(&self, unit: UnitId) -> Option<UnitRole> {
        self.roles.get(&unit).copied()
    }

    fn units_with_role(&self, role: UnitRole) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .roles
            .iter()
            .filter(|(_, &r)| r == role)
            .map(|(&id, _)| id)
            .collect();
        ids.sort();
        ids
    }

    fn remove(&mut self, unit: UnitId) {
        self.roles.remove(&unit);
    }
}

/// Role changes held back from a shared book until the caller commits them
///
/// Reads see the pending changes layered over the book. Dropping the stage
/// without calling `into_changes` leaves the book untouched.
pub struct StagedRoles<'a> {
    book: &'a dyn RoleBook,
    pending: AHashMap<UnitId, Option<UnitRole>>,
}

impl<'a> StagedRoles<'a> {
    pub fn new(book: &'a dyn RoleBook) -> Self {
        Self {
            book,
            pending: AHashMap::new(),
        }
    }

    /// Pending changes in ascending id order, `None` meaning removal
    pub fn into_changes(self) -> Vec<(UnitId, Option<UnitRole>)> {
        let mut changes: Vec<(UnitId, Option<UnitRole>)> = self.pending.into_iter().collect();
        changes.sort_by_key(|&(id, _)| id);
        changes
    }
}

/// Write staged changes into the book
pub fn apply_role_changes(book: &mut dyn RoleBook, changes: &[(UnitId, Option<UnitRole>)]) {
    for &(unit, role) in changes {
        match role {
            Some(role) => book.assign_role(unit, role),
            None => book.remove(unit),
        }
    }
}

impl RoleBook for StagedRoles<'_> {
    fn assign_role(&mut self, unit: UnitId, role: UnitRole) {
        self.pending.insert(unit, Some(role));
    }

    fn role_of(&self, unit: UnitId) -> Option<UnitRole> {
        match self.pending.get(&unit) {
            Some(&staged) => staged,
            None => self.book.role_of(unit),
        }
    }

    fn units_with_role(&self, role: UnitRole) -> Vec<UnitId> {
        let mut ids: Vec<UnitId> = self
            .book
            .units_with_role(role)
            .into_iter()
            .filter(|id| !self.pending.contains_key(id))
            .collect();
        ids.extend(
            self.pending
                .iter()
                .filter(|(_, &staged)| staged == Some(role))
                .map(|(&id, _)| id),
        );
        ids.sort();
        ids
    }

    fn remove(&mut self, unit: UnitId) {
        self.pending.insert(unit, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_is_exclusive() {
        let mut book = RoleRegistry::new();
        book.assign_role(UnitId(1), UnitRole::Attacking);
        book.assign_role(UnitId(1), UnitRole::BaseDefender);
        assert_eq!(book.role_of(UnitId(1)), Some(UnitRole::BaseDefender));
        assert!(book.units_with_role(UnitRole::Attacking).is_empty());
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_assign_is_idempotent() {
        let mut book = RoleRegistry::new();
        book.assign_role(UnitId(7), UnitRole::Scouting);
        book.assign_role(UnitId(7), UnitRole::Scouting);
        assert_eq!(book.units_with_role(UnitRole::Scouting), vec![UnitId(7)]);
    }

    #[test]
    fn test_units_with_role_sorted() {
        let mut book = RoleRegistry::new();
        for id in [5, 2, 9] {
            book.assign_role(UnitId(id), UnitRole::Attacking);
        }
        assert_eq!(
            book.units_with_role(UnitRole::Attacking),
            vec![UnitId(2), UnitId(5), UnitId(9)]
        );
    }

    #[test]
    fn test_remove() {
        let mut book = RoleRegistry::new();
        book.assign_role(UnitId(1), UnitRole::Attacking);
        book.remove(UnitId(1));
        assert!(book.is_empty());
        assert_eq!(book.role_of(UnitId(1)), None);
    }

    #[test]
    fn test_staged_reads_see_pending_changes() {
        let mut book = RoleRegistry::new();
        book.assign_role(UnitId(1), UnitRole::Attacking);
        book.assign_role(UnitId(2), UnitRole::Attacking);

        let mut staged = StagedRoles::new(&book);
        staged.assign_role(UnitId(2), UnitRole::BaseDefender);
        staged.assign_role(UnitId(3), UnitRole::Attacking);
        staged.remove(UnitId(1));

        assert_eq!(staged.role_of(UnitId(2)), Some(UnitRole::BaseDefender));
        assert_eq!(staged.role_of(UnitId(1)), None);
        assert_eq!(staged.units_with_role(UnitRole::Attacking), vec![UnitId(3)]);
        assert_eq!(staged.units_with_role(UnitRole::BaseDefender), vec![UnitId(2)]);
    }

    #[test]
    fn test_dropped_stage_leaves_book_alone() {
        let mut book = RoleRegistry::new();
        book.assign_role(UnitId(1), UnitRole::Attacking);
        {
            let mut staged = StagedRoles::new(&book);
            staged.assign_role(UnitId(1), UnitRole::BaseDefender);
            staged.assign_role(UnitId(4), UnitRole::Attacking);
        }
        assert_eq!(book.role_of(UnitId(1)), Some(UnitRole::Attacking));
        assert_eq!(book.len(), 1);
    }

    #[test]
    fn test_committed_changes_reach_book() {
        let mut book = RoleRegistry::new();
        book.assign_role(UnitId(1), UnitRole::Attacking);
        book.assign_role(UnitId(2), UnitRole::Attacking);

        let mut staged = StagedRoles::new(&book);
        staged.assign_role(UnitId(1), UnitRole::BaseDefender);
        staged.remove(UnitId(2));
        let changes = staged.into_changes();
        apply_role_changes(&mut book, &changes);

        assert_eq!(book.role_of(UnitId(1)), Some(UnitRole::BaseDefender));
        assert_eq!(book.role_of(UnitId(2)), None);
    }
}
