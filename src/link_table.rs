use std::collections::HashMap;

use crate::ndn::{Link, NameComponent};

/// User-id → forwarding-hint blob. In-memory only (§3's lifecycle note) —
/// unlike the PIT it is never persisted, so a restart loses link
/// attachments until the next `register` carries one again.
#[derive(Debug, Default)]
pub struct LinkTable {
  links: HashMap<NameComponent, Link>,
}

impl LinkTable {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn set(&mut self, user_id: NameComponent, link: Link) {
    self.links.insert(user_id, link);
  }

  pub fn get(&self, user_id: &NameComponent) -> Option<&Link> {
    self.links.get(user_id)
  }
}
