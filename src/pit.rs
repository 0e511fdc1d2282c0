//! The pending-interest table: the engine's authoritative "what am I still
//! trying to fetch" set. Two levels — user-id, then interest name — per
//! §3. Each entry carries a retry counter and the object class it was
//! issued as, so receive-time and timeout-time dispatch never has to
//! re-derive class by scanning the name (see REDESIGN FLAGS).

use std::collections::HashMap;

use crate::ndn::{Name, NameComponent};

/// What kind of object an interest was issued for, tagged at emission time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
  DataCatalog,
  DataPoint,
  CkeyCatalog,
  Ckey,
  Ekey,
  Dkey,
  DkeyCatalog,
  Certificate,
}

impl ObjectClass {
  /// The retry cap for this class, or `None` for the catalog's unbounded
  /// policy.
  pub fn retry_cap(self, leaf_retry_cap: u32) -> Option<u32> {
    match self {
      ObjectClass::DataCatalog => None,
      _ => Some(leaf_retry_cap),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PitEntry {
  pub retry_count: u32,
  pub class: ObjectClass,
}

impl PitEntry {
  pub fn new(class: ObjectClass) -> Self {
    Self { retry_count: 0, class }
  }
}

/// User-id → (interest name → entry).
#[derive(Debug, Default)]
pub struct PendingInterestTable {
  users: HashMap<NameComponent, HashMap<Name, PitEntry>>,
}

impl PendingInterestTable {
  pub fn new() -> Self {
    Self::default()
  }

  /// Ensures `user_id` has a sub-map, returning a mutable reference to it.
  pub fn ensure_user(&mut self, user_id: NameComponent) -> &mut HashMap<Name, PitEntry> {
    self.users.entry(user_id).or_default()
  }

  /// Replaces a user's entire sub-map, as `on_register` does to restart
  /// the scan from a fresh timestamp (idempotent re-registration).
  pub fn reset_user(&mut self, user_id: NameComponent, name: Name, entry: PitEntry) {
    let mut map = HashMap::new();
    map.insert(name, entry);
    self.users.insert(user_id, map);
  }

  pub fn contains(&self, user_id: &NameComponent, name: &Name) -> bool {
    self.users.get(user_id).map(|m| m.contains_key(name)).unwrap_or(false)
  }

  /// Inserts an entry iff the name is not already tracked for this user —
  /// the de-duplication invariant from §3 and the suppression behavior
  /// from §4.2's local-check path.
  pub fn insert_if_absent(&mut self, user_id: NameComponent, name: Name, class: ObjectClass) -> bool {
    let map = self.users.entry(user_id).or_default();
    if map.contains_key(&name) {
      false
    } else {
      map.insert(name, PitEntry::new(class));
      true
    }
  }

  pub fn remove(&mut self, user_id: &NameComponent, name: &Name) -> Option<PitEntry> {
    self.users.get_mut(user_id)?.remove(name)
  }

  pub fn get(&self, user_id: &NameComponent, name: &Name) -> Option<&PitEntry> {
    self.users.get(user_id)?.get(name)
  }

  pub fn get_mut(&mut self, user_id: &NameComponent, name: &Name) -> Option<&mut PitEntry> {
    self.users.get_mut(user_id)?.get_mut(name)
  }

  pub fn user_entries(&self, user_id: &NameComponent) -> Option<&HashMap<Name, PitEntry>> {
    self.users.get(user_id)
  }

  /// Flattens the table for persistence: one (user-id, [names]) pair per
  /// user, in no particular order. Retry counts are intentionally dropped
  /// — they are not part of the persisted format (§4.4).
  pub fn flatten(&self) -> Vec<(NameComponent, Vec<Name>)> {
    self
      .users
      .iter()
      .map(|(user, names)| (user.clone(), names.keys().cloned().collect()))
      .collect()
  }

  /// Rebuilds a table from flattened (user-id, names) pairs, classifying
  /// each name with `classify`. Used on startup to reload persisted state
  /// (§4.2 "Name classification on re-entry").
  pub fn from_flattened(
    entries: Vec<(NameComponent, Vec<Name>)>,
    mut classify: impl FnMut(&Name) -> ObjectClass,
  ) -> Self {
    let mut table = Self::new();
    for (user_id, names) in entries {
      let map = table.users.entry(user_id).or_default();
      for name in names {
        let class = classify(&name);
        map.insert(name, PitEntry::new(class));
      }
    }
    table
  }

  #[cfg(test)]
  pub fn user_count(&self) -> usize {
    self.users.len()
  }
}
