use thiserror::Error;

use super::name::Name;
use super::packet::{Data, Interest};

#[derive(Debug, Error)]
pub enum FaceError {
  #[error("failed to register prefix {prefix}: {reason}")]
  RegisterFailed { prefix: Name, reason: String },
}

/// Something the NDN face observed since the caller last polled it: an
/// incoming Interest on a registered filter, a Data reply to an expressed
/// Interest, or that Interest's lifetime expiring unanswered.
///
/// Events carry the interest's full [`Name`] rather than an opaque id,
/// because the pending-interest table is itself keyed by name — that's
/// exactly how the original program correlates a timeout back to its retry
/// counter, and there is no reason to invent a second identity for the
/// same interest (see "Cyclic references" in the design notes).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaceEvent {
  InterestArrived { filter_prefix: Name, interest: Interest },
  DataArrived { data: Data },
  TimedOut { name: Name },
}

/// The local NDN face: the seam between the fetch engine and whatever
/// actually speaks the NDN forwarder protocol. Route/forwarding-hint
/// discovery and the wire-level NDN client are explicit non-goals of this
/// crate (§1) — this trait is the interface boundary the spec asks for,
/// and it is what tests substitute a deterministic fake for.
pub trait NdnFace {
  /// Express an interest toward the forwarder. The lifetime/must-be-fresh
  /// flags on `interest` govern when a `TimedOut` event is produced.
  fn express_interest(&mut self, interest: Interest);

  /// Register to receive `InterestArrived` events for interests under
  /// `prefix`.
  fn set_interest_filter(&mut self, prefix: Name) -> Result<(), FaceError>;

  /// Publish an already-signed outbound Data packet (register-ack,
  /// confirm-reply).
  fn put(&mut self, data: Data);

  /// Drain everything observed since the last call. Called once per event
  /// loop tick; never blocks.
  fn poll_events(&mut self) -> Vec<FaceEvent>;
}

/// A face with no forwarder behind it: registers nothing, expresses
/// nothing, and never produces an event. The wire-level NDN client is an
/// explicit non-goal of this crate (§1) — this is what the CLI wires in
/// until a real one is plugged in behind the trait, and it's also
/// convenient as a baseline in tests that don't care about face traffic.
#[derive(Debug, Default)]
pub struct NullFace;

impl NdnFace for NullFace {
  fn express_interest(&mut self, _interest: Interest) {}

  fn set_interest_filter(&mut self, _prefix: Name) -> Result<(), FaceError> {
    Ok(())
  }

  fn put(&mut self, _data: Data) {}

  fn poll_events(&mut self) -> Vec<FaceEvent> {
    Vec::new()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn null_face_registers_and_produces_nothing() {
    let mut face = NullFace;
    assert!(face.set_interest_filter(Name::from_uri("/a/b")).is_ok());
    assert!(face.poll_events().is_empty());
  }
}
