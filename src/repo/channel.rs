//! The repo TCP channel (§4.1): a length-prefix-free, TLV-framed duplex
//! stream to the local repo. Three instances are kept by the engine (write,
//! confirm, local-check) to avoid head-of-line blocking between write
//! bursts and probe replies.

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::net::SocketAddr;

use bytes::{Bytes, BytesMut};
use mio::net::TcpStream;
use mio::{Interest as MioInterest, Registry, Token};

use crate::error::{DsuError, DsuResult};
use crate::ndn::packet::{decode_packet, Packet};
use crate::ndn::Data;

/// Matches the original's `MAX_NDN_PACKET_SIZE`: the repo channel's rolling
/// read buffer never grows past this.
pub const MAX_NDN_PACKET_SIZE: usize = 8800;

/// What happened on a readable-event tick: zero or more complete Data
/// packets, and whether the connection must be torn down and reopened
/// (buffer full with no decodable element — §4.1's "Decoder" paragraph).
pub struct ReadOutcome {
  pub datas: Vec<Data>,
  pub needs_reconnect: bool,
}

pub struct RepoChannel {
  addr: SocketAddr,
  token: Token,
  stream: TcpStream,
  read_buf: BytesMut,
  write_queue: VecDeque<Bytes>,
  written_offset: usize,
}

impl RepoChannel {
  /// Opens the TCP connection. Per §4.1, a connect failure here is fatal —
  /// callers at startup should propagate this with `?` and exit.
  pub fn connect(addr: SocketAddr, token: Token) -> DsuResult<Self> {
    let std_stream = std::net::TcpStream::connect(addr)
      .map_err(|source| DsuError::RepoUnreachable { addr: addr.to_string(), source })?;
    std_stream.set_nonblocking(true).map_err(DsuError::RepoIo)?;
    let stream = TcpStream::from_std(std_stream);
    Ok(Self {
      addr,
      token,
      stream,
      read_buf: BytesMut::with_capacity(MAX_NDN_PACKET_SIZE),
      write_queue: VecDeque::new(),
      written_offset: 0,
    })
  }

  pub fn token(&self) -> Token {
    self.token
  }

  pub fn register(&mut self, registry: &Registry) -> io::Result<()> {
    registry.register(&mut self.stream, self.token, MioInterest::READABLE | MioInterest::WRITABLE)
  }

  pub fn reregister(&mut self, registry: &Registry) -> io::Result<()> {
    registry.reregister(&mut self.stream, self.token, MioInterest::READABLE | MioInterest::WRITABLE)
  }

  /// Reconnects to the same address, replacing the socket in place. Any
  /// queued-but-unsent frames are dropped along with the old connection,
  /// matching the original's "errors close and drop the socket" behavior.
  pub fn reconnect(&mut self, registry: &Registry) -> DsuResult<()> {
    let _ = registry.deregister(&mut self.stream);
    let std_stream = std::net::TcpStream::connect(self.addr)
      .map_err(|source| DsuError::RepoUnreachable { addr: self.addr.to_string(), source })?;
    std_stream.set_nonblocking(true).map_err(DsuError::RepoIo)?;
    self.stream = TcpStream::from_std(std_stream);
    self.read_buf.clear();
    self.write_queue.clear();
    self.written_offset = 0;
    self.register(registry).map_err(DsuError::RepoIo)?;
    Ok(())
  }

  /// Enqueues a frame. If the queue was empty, starts writing immediately;
  /// otherwise the frame waits its turn — writes on one channel are
  /// strictly FIFO and never overlap (§5, ordering guarantee (a)).
  pub fn send(&mut self, frame: Bytes) -> io::Result<()> {
    let was_idle = self.write_queue.is_empty();
    self.write_queue.push_back(frame);
    if was_idle {
      self.flush_writes()?;
    }
    Ok(())
  }

  /// Drives the write queue as far as the socket currently allows. Called
  /// both right after `send` and whenever the poller reports writable.
  pub fn flush_writes(&mut self) -> io::Result<()> {
    while let Some(front) = self.write_queue.front() {
      match self.stream.write(&front[self.written_offset..]) {
        Ok(0) => break,
        Ok(n) => {
          self.written_offset += n;
          if self.written_offset == front.len() {
            self.write_queue.pop_front();
            self.written_offset = 0;
          }
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(e),
      }
    }
    Ok(())
  }

  /// Reads whatever is available, decodes as many complete TLV elements
  /// as the buffer holds, and shifts consumed bytes out (§4.1's
  /// "Decoder" paragraph). Non-Data elements are silently ignored — the
  /// repo channel only ever carries Data in response to our writes/probes.
  pub fn on_readable(&mut self) -> io::Result<ReadOutcome> {
    let mut chunk = [0u8; 4096];
    loop {
      match self.stream.read(&mut chunk) {
        Ok(0) => break,
        Ok(n) => {
          if self.read_buf.len() + n > MAX_NDN_PACKET_SIZE {
            // Buffer would overflow; stop accepting more until we've
            // drained what we can decode below.
            self.read_buf.extend_from_slice(&chunk[..n.min(MAX_NDN_PACKET_SIZE - self.read_buf.len())]);
            break;
          }
          self.read_buf.extend_from_slice(&chunk[..n]);
        }
        Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
        Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
        Err(e) => return Err(e),
      }
    }

    let mut datas = Vec::new();
    let mut offset = 0usize;
    loop {
      match decode_packet(&self.read_buf[offset..]) {
        Ok(Some((Packet::Data(data), consumed))) => {
          datas.push(data);
          offset += consumed;
        }
        Ok(Some((Packet::Interest(_), consumed))) => {
          offset += consumed;
        }
        Ok(None) => break,
        Err(_) => break,
      }
    }

    let made_progress = offset > 0;
    if made_progress {
      let remaining = self.read_buf.split_off(offset);
      self.read_buf = remaining;
    }

    let needs_reconnect = !made_progress && self.read_buf.len() >= MAX_NDN_PACKET_SIZE;
    Ok(ReadOutcome { datas, needs_reconnect })
  }
}
