//! CLI entry point: layers configuration, opens the three repo channels,
//! installs the SIGINT handler, and runs the event loop until shutdown.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;
use log::{error, info};
use mio::Token;

use ndnfit_dsu::clock::SystemClock;
use ndnfit_dsu::config::Config;
use ndnfit_dsu::event_loop::EventLoop;
use ndnfit_dsu::keychain::NullKeyChain;
use ndnfit_dsu::ndn::NullFace;
use ndnfit_dsu::repo::RepoChannel;
use ndnfit_dsu::{classify, state_store, FetchEngine};

/// Data Synchronization Unit: fetches a user's registered NDN health-data
/// catalogs and their dependents into the local repo.
#[derive(Debug, Parser)]
#[command(name = "dsu", version, about)]
struct Args {
  /// TOML config file, layered on top of the built-in defaults.
  #[arg(long)]
  config: Option<PathBuf>,

  /// Overrides the repo host.
  #[arg(long)]
  repo_host: Option<String>,

  /// Overrides the repo port.
  #[arg(long)]
  repo_port: Option<u16>,

  /// Overrides where the pending-interest table is persisted.
  #[arg(long)]
  state_file: Option<PathBuf>,
}

fn main() -> ExitCode {
  env_logger::init();

  let args = Args::parse();

  let mut config = match &args.config {
    Some(path) => match Config::load_file(path) {
      Ok(config) => config,
      Err(e) => {
        error!("{e}");
        return ExitCode::FAILURE;
      }
    },
    None => Config::default(),
  };
  config = config.apply_env();
  if let Some(repo_host) = args.repo_host {
    config.repo_host = repo_host;
  }
  if let Some(repo_port) = args.repo_port {
    config.repo_port = repo_port;
  }
  if let Some(state_file) = args.state_file {
    config.state_file = state_file;
  }

  match run(config) {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      error!("{e}");
      ExitCode::FAILURE
    }
  }
}

fn run(config: Config) -> ndnfit_dsu::DsuResult<()> {
  use std::net::ToSocketAddrs;

  let repo_addr = config
    .repo_addr()
    .to_socket_addrs()
    .ok()
    .and_then(|mut addrs| addrs.next())
    .ok_or_else(|| ndnfit_dsu::DsuError::PrefixRegistration {
      prefix: config.repo_addr(),
      reason: "not a resolvable host:port".to_string(),
    })?;

  info!("connecting to repo at {repo_addr}");
  let write_channel = RepoChannel::connect(repo_addr, Token(0))?;
  let confirm_channel = RepoChannel::connect(repo_addr, Token(1))?;
  let local_check_channel = RepoChannel::connect(repo_addr, Token(2))?;

  let pit = state_store::load(&config.state_file, classify::classify_for_reload);
  info!("loaded {} pending users from {}", pit_user_count(&pit), config.state_file.display());

  let mut engine = FetchEngine::new(
    config,
    Box::new(SystemClock),
    Box::new(NullKeyChain),
    Box::new(NullFace),
    write_channel,
    confirm_channel,
    local_check_channel,
  );
  engine.set_pit(pit);
  engine.resume_pending();

  let shutdown = Arc::new(AtomicBool::new(false));
  let handler_flag = Arc::clone(&shutdown);
  ctrlc::set_handler(move || {
    handler_flag.store(true, Ordering::Relaxed);
  })
  .expect("failed to install SIGINT handler");

  let mut event_loop = EventLoop::new(engine, shutdown)?;
  event_loop.run()
}

fn pit_user_count(pit: &ndnfit_dsu::pit::PendingInterestTable) -> usize {
  pit.flatten().len()
}
