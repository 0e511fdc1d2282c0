use crate::ndn::Data;

/// Signs outbound Data packets (register-acks, confirm-replies) with the
/// process's default identity. Authoring or verifying the content-based
/// access-control crypto (C-KEY/E-KEY/D-KEY) is an explicit non-goal of
/// this crate (§1); packet-level signing is a different seam — every
/// outbound Data the NDN face accepts must be signed — and is kept
/// trait-based so tests can substitute a deterministic fake rather than
/// touch a real identity store.
pub trait KeyChain {
  fn sign(&self, data: &mut Data);
}

/// A `KeyChain` that signs nothing, for deployments where the face itself
/// enforces signing (or for tests that don't care about signature bytes).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullKeyChain;

impl KeyChain for NullKeyChain {
  fn sign(&self, _data: &mut Data) {}
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ndn::Name;

  #[test]
  fn null_keychain_leaves_data_unchanged() {
    let mut data = Data::new(Name::from_uri("/a/b"), Vec::new());
    let before = data.clone();
    NullKeyChain.sign(&mut data);
    assert_eq!(data, before);
  }
}
