use std::fmt;

/// One opaque segment of a hierarchical NDN name.
///
/// Components are compared and hashed by their raw bytes; callers that know
/// a component holds UTF-8 (user ids, timestamps, literal markers like
/// `C-KEY`) can go through [`NameComponent::as_str`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NameComponent(pub Vec<u8>);

impl NameComponent {
  pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
    Self(bytes.into())
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.0
  }

  pub fn as_str(&self) -> Option<&str> {
    std::str::from_utf8(&self.0).ok()
  }
}

impl From<&str> for NameComponent {
  fn from(s: &str) -> Self {
    Self(s.as_bytes().to_vec())
  }
}

impl From<String> for NameComponent {
  fn from(s: String) -> Self {
    Self(s.into_bytes())
  }
}

impl fmt::Display for NameComponent {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.as_str() {
      Some(s) => write!(f, "{s}"),
      None => write!(f, "%{}", hex_string(&self.0)),
    }
  }
}

fn hex_string(bytes: &[u8]) -> String {
  bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// An ordered sequence of name components, e.g.
/// `/org/openmhealth/haitao/SAMPLE/.../catalog/20170617T042400`.
///
/// Equality is component-wise, which is what the pending-interest table and
/// repo-occupancy suppression rely on for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Name(pub Vec<NameComponent>);

impl Name {
  pub fn new() -> Self {
    Self(Vec::new())
  }

  pub fn from_uri(uri: &str) -> Self {
    let comps = uri
      .split('/')
      .filter(|c| !c.is_empty())
      .map(NameComponent::from)
      .collect();
    Self(comps)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn get(&self, index: usize) -> Option<&NameComponent> {
    self.0.get(index)
  }

  /// Negative-index access matching the original's `Name::get(-1)` idiom:
  /// `-1` is the last component, `-2` the second-to-last, and so on.
  pub fn get_from_back(&self, offset_from_end: usize) -> Option<&NameComponent> {
    let len = self.0.len();
    if offset_from_end == 0 || offset_from_end > len {
      return None;
    }
    self.0.get(len - offset_from_end)
  }

  /// Keep only the first `k` components.
  pub fn prefix(&self, k: usize) -> Name {
    Name(self.0.iter().take(k).cloned().collect())
  }

  /// Drop the last `k` components.
  pub fn drop_last(&self, k: usize) -> Name {
    let keep = self.0.len().saturating_sub(k);
    Name(self.0.iter().take(keep).cloned().collect())
  }

  /// Components starting at `start` through the end, mirroring
  /// `Name::getSubName` in the original.
  pub fn sub_name(&self, start: usize) -> Name {
    Name(self.0.iter().skip(start).cloned().collect())
  }

  pub fn append(mut self, component: impl Into<NameComponent>) -> Self {
    self.0.push(component.into());
    self
  }

  pub fn append_name(mut self, other: &Name) -> Self {
    self.0.extend(other.0.iter().cloned());
    self
  }

  pub fn starts_with(&self, prefix: &Name) -> bool {
    self.0.len() >= prefix.0.len() && self.0[..prefix.0.len()] == prefix.0[..]
  }

  /// True if any component equals `needle` exactly (used to find `C-KEY`,
  /// `D-KEY`, `catalog` markers by authoritative component rather than
  /// substring scan — see REDESIGN FLAGS).
  pub fn contains_component(&self, needle: &str) -> bool {
    self.0.iter().any(|c| c.as_str() == Some(needle))
  }

  pub fn index_of_component(&self, needle: &str) -> Option<usize> {
    self.0.iter().position(|c| c.as_str() == Some(needle))
  }

  pub fn to_uri(&self) -> String {
    let mut s = String::new();
    for c in &self.0 {
      s.push('/');
      s.push_str(&c.to_string());
    }
    s
  }
}

impl From<&str> for Name {
  fn from(uri: &str) -> Self {
    Name::from_uri(uri)
  }
}

impl From<String> for Name {
  fn from(uri: String) -> Self {
    Name::from_uri(&uri)
  }
}

impl fmt::Display for Name {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.to_uri())
  }
}
