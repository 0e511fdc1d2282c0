pub mod channel;

pub use channel::{ReadOutcome, RepoChannel, MAX_NDN_PACKET_SIZE};
