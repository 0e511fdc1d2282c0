//! The process wrapper (§4.6): a single-threaded, `mio`-driven loop that
//! multiplexes the three repo TCP channels and the NDN face, and persists
//! the pending-interest table on a clean shutdown.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{error, info, warn};
use mio::{Events, Poll, Token};

use crate::engine::{FetchEngine, RepoChannelKind};
use crate::error::{DsuError, DsuResult};
use crate::state_store;

const WRITE_TOKEN: Token = Token(0);
const CONFIRM_TOKEN: Token = Token(1);
const LOCAL_CHECK_TOKEN: Token = Token(2);

/// Upper bound on how long a poll tick waits for repo-socket activity
/// before coming back around to drain the NDN face, which isn't part of
/// this mio registry (its production implementation is an explicit
/// non-goal — see `ndn::face`).
const FACE_POLL_INTERVAL: Duration = Duration::from_millis(100);

pub struct EventLoop {
  poll: Poll,
  engine: FetchEngine,
  shutdown: Arc<AtomicBool>,
  state_file: PathBuf,
}

impl EventLoop {
  pub fn new(mut engine: FetchEngine, shutdown: Arc<AtomicBool>) -> DsuResult<Self> {
    let poll = Poll::new().map_err(DsuError::RepoIo)?;
    engine.write_channel().register(poll.registry()).map_err(DsuError::RepoIo)?;
    engine.confirm_channel().register(poll.registry()).map_err(DsuError::RepoIo)?;
    engine.local_check_channel().register(poll.registry()).map_err(DsuError::RepoIo)?;
    let state_file = engine.config().state_file.clone();
    Ok(Self { poll, engine, shutdown, state_file })
  }

  /// Runs until `shutdown` is set (normally by the `ctrlc` handler installed
  /// in `main`), then flushes the PIT to disk.
  pub fn run(&mut self) -> DsuResult<()> {
    let mut events = Events::with_capacity(16);
    info!("event loop starting");

    while !self.shutdown.load(Ordering::Relaxed) {
      if let Err(e) = self.poll.poll(&mut events, Some(FACE_POLL_INTERVAL)) {
        if e.kind() == std::io::ErrorKind::Interrupted {
          continue;
        }
        return Err(DsuError::RepoIo(e));
      }

      for event in events.iter() {
        let kind = match event.token() {
          WRITE_TOKEN => RepoChannelKind::Write,
          CONFIRM_TOKEN => RepoChannelKind::Confirm,
          LOCAL_CHECK_TOKEN => RepoChannelKind::LocalCheck,
          other => {
            warn!("mio event on unrecognized token {other:?}");
            continue;
          }
        };
        self.service_repo_channel(kind, event.is_writable());
      }

      self.engine.pump_face_events();
    }

    info!("shutdown requested, persisting pending-interest table to {}", self.state_file.display());
    state_store::save(&self.state_file, self.engine.pit())
  }

  fn channel_for(&mut self, kind: RepoChannelKind) -> &mut crate::repo::RepoChannel {
    match kind {
      RepoChannelKind::Write => self.engine.write_channel(),
      RepoChannelKind::Confirm => self.engine.confirm_channel(),
      RepoChannelKind::LocalCheck => self.engine.local_check_channel(),
    }
  }

  fn service_repo_channel(&mut self, kind: RepoChannelKind, writable: bool) {
    let outcome = {
      let channel = self.channel_for(kind);
      if writable {
        if let Err(e) = channel.flush_writes() {
          warn!("{kind:?} channel write failed: {e}");
        }
      }
      channel.on_readable()
    };

    let outcome = match outcome {
      Ok(outcome) => outcome,
      Err(e) => {
        warn!("{kind:?} channel read failed: {e}");
        return;
      }
    };

    if !outcome.datas.is_empty() {
      self.engine.pump_repo_channel(kind, outcome.datas);
    }

    if outcome.needs_reconnect {
      warn!("{kind:?} channel buffer full with no decodable element, reconnecting");
      let registry = self.poll.registry();
      let channel = self.channel_for(kind);
      if let Err(e) = channel.reconnect(registry) {
        error!("failed to reconnect {kind:?} channel: {e}");
      }
    } else {
      let registry = self.poll.registry();
      let channel = self.channel_for(kind);
      if let Err(e) = channel.reregister(registry) {
        warn!("failed to reregister {kind:?} channel: {e}");
      }
    }
  }
}
