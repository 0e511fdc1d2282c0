use std::time::Duration;

use bytes::{Bytes, BytesMut};

use super::name::Name;
use super::tlv::{
  self, decode_name, decode_one, find_child, Decoded, TlvError, TLV_CONTENT, TLV_DATA,
  TLV_FRESHNESS_PERIOD, TLV_INTEREST, TLV_INTEREST_LIFETIME, TLV_KEY_LOCATOR, TLV_META_INFO,
  TLV_MUST_BE_FRESH, TLV_NAME, TLV_SIGNATURE_INFO,
};

/// Forwarding hint blob attached to interests for a user once their
/// `register` interest has carried a link component (§4.3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link(pub Bytes);

/// An NDN Interest: a request for a [`Name`], carrying the freshness and
/// lifetime semantics the fetch engine depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interest {
  pub name: Name,
  pub must_be_fresh: bool,
  pub lifetime: Duration,
  pub link: Option<Link>,
}

impl Interest {
  pub fn new(name: Name) -> Self {
    Self { name, must_be_fresh: false, lifetime: Duration::from_secs(4), link: None }
  }

  pub fn with_lifetime(mut self, lifetime: Duration) -> Self {
    self.lifetime = lifetime;
    self
  }

  pub fn with_must_be_fresh(mut self, must_be_fresh: bool) -> Self {
    self.must_be_fresh = must_be_fresh;
    self
  }

  pub fn with_link(mut self, link: Option<Link>) -> Self {
    self.link = link;
    self
  }

  pub fn encode(&self) -> Bytes {
    let mut out = BytesMut::new();
    tlv::write_nested(&mut out, TLV_INTEREST, |body| {
      tlv::encode_name(body, &self.name);
      if self.must_be_fresh {
        tlv::write_element(body, TLV_MUST_BE_FRESH, &[]);
      }
      let mut lifetime_ms = BytesMut::new();
      tlv::write_nonnegative_integer(&mut lifetime_ms, self.lifetime.as_millis() as u64);
      tlv::write_element(body, TLV_INTEREST_LIFETIME, &lifetime_ms);
    });
    out.freeze()
  }
}

/// A signature's key locator, reduced to the one field this deployment
/// actually uses: the certificate name to chase down.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct KeyLocator {
  pub name: Option<Name>,
}

/// An NDN Data packet: an immutable, named, signed object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Data {
  pub name: Name,
  pub content: Bytes,
  pub freshness: Option<Duration>,
  pub key_locator: KeyLocator,
}

impl Data {
  pub fn new(name: Name, content: impl Into<Bytes>) -> Self {
    Self { name, content: content.into(), freshness: None, key_locator: KeyLocator::default() }
  }

  pub fn with_freshness(mut self, freshness: Duration) -> Self {
    self.freshness = Some(freshness);
    self
  }

  pub fn with_key_locator_name(mut self, name: Name) -> Self {
    self.key_locator.name = Some(name);
    self
  }

  pub fn is_empty_content(&self) -> bool {
    self.content.is_empty()
  }

  pub fn encode(&self) -> Bytes {
    let mut out = BytesMut::new();
    tlv::write_nested(&mut out, TLV_DATA, |body| {
      tlv::encode_name(body, &self.name);
      tlv::write_nested(body, TLV_META_INFO, |meta| {
        if let Some(freshness) = self.freshness {
          let mut ms = BytesMut::new();
          tlv::write_nonnegative_integer(&mut ms, freshness.as_millis() as u64);
          tlv::write_element(meta, TLV_FRESHNESS_PERIOD, &ms);
        }
      });
      tlv::write_element(body, TLV_CONTENT, &self.content);
      tlv::write_nested(body, TLV_SIGNATURE_INFO, |sig_info| {
        if let Some(locator_name) = &self.key_locator.name {
          tlv::write_nested(sig_info, TLV_KEY_LOCATOR, |kl| {
            tlv::encode_name(kl, locator_name);
          });
        }
      });
    });
    out.freeze()
  }

  /// Decodes a Data packet from the *value* bytes of a Data TLV element
  /// (i.e. what [`tlv::decode_one`] hands back when `tlv_type == TLV_DATA`).
  pub fn decode(value: &[u8]) -> Result<Data, TlvError> {
    let name_block = find_child(value, TLV_NAME).ok_or(TlvError::NotAName(0))?;
    let name = decode_name(name_block)?;

    let content = find_child(value, TLV_CONTENT).map(|v| Bytes::copy_from_slice(v)).unwrap_or_default();

    let freshness = find_child(value, TLV_META_INFO)
      .and_then(|meta| find_child(meta, TLV_FRESHNESS_PERIOD))
      .map(|v| Duration::from_millis(tlv::read_nonnegative_integer(v)));

    let key_locator_name = find_child(value, TLV_SIGNATURE_INFO)
      .and_then(|sig_info| find_child(sig_info, TLV_KEY_LOCATOR))
      .and_then(|kl| find_child(kl, TLV_NAME))
      .and_then(|n| decode_name(n).ok());

    Ok(Data {
      name,
      content,
      freshness,
      key_locator: KeyLocator { name: key_locator_name },
    })
  }
}

/// One fully-decoded NDN packet as read off the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
  Data(Data),
  Interest(Interest),
}

/// Decodes one top-level NDN packet TLV (Interest or Data) starting at the
/// front of `buf`. Returns `Ok(None)` if the buffer doesn't yet hold a
/// complete element (the repo channel's decoder loop interprets this as
/// "stop scanning, wait for more bytes").
pub fn decode_packet(buf: &[u8]) -> Result<Option<(Packet, usize)>, TlvError> {
  match decode_one(buf) {
    Decoded::Incomplete => Ok(None),
    Decoded::Element { tlv_type, value, rest } => {
      let consumed = buf.len() - rest.len();
      match tlv_type {
        TLV_DATA => Ok(Some((Packet::Data(Data::decode(value)?), consumed))),
        TLV_INTEREST => {
          let name_block = find_child(value, TLV_NAME).ok_or(TlvError::NotAName(tlv_type))?;
          let name = decode_name(name_block)?;
          let lifetime = find_child(value, TLV_INTEREST_LIFETIME)
            .map(|v| Duration::from_millis(tlv::read_nonnegative_integer(v)))
            .unwrap_or(Duration::from_secs(4));
          let must_be_fresh = tlv::find_child(value, TLV_MUST_BE_FRESH).is_some();
          Ok(Some((
            Packet::Interest(Interest { name, must_be_fresh, lifetime, link: None }),
            consumed,
          )))
        }
        other => Err(TlvError::NotAName(other)),
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn data_round_trips_with_content_and_key_locator() {
    let data = Data::new(Name::from_uri("/a/b/c"), Bytes::from_static(b"[\"x\"]"))
      .with_freshness(Duration::from_secs(10))
      .with_key_locator_name(Name::from_uri("/a/KEY/ksk-1/ID-CERT"));
    let wire = data.encode();
    let (packet, consumed) = decode_packet(&wire).unwrap().unwrap();
    assert_eq!(consumed, wire.len());
    match packet {
      Packet::Data(decoded) => {
        assert_eq!(decoded.name, data.name);
        assert_eq!(decoded.content, data.content);
        assert_eq!(decoded.freshness, data.freshness);
        assert_eq!(decoded.key_locator.name, data.key_locator.name);
      }
      Packet::Interest(_) => panic!("expected Data"),
    }
  }

  #[test]
  fn empty_content_round_trips_as_miss() {
    let data = Data::new(Name::from_uri("/a/b"), Bytes::new());
    let wire = data.encode();
    let (packet, _) = decode_packet(&wire).unwrap().unwrap();
    let Packet::Data(decoded) = packet else { panic!("expected Data") };
    assert!(decoded.is_empty_content());
  }

  #[test]
  fn interest_round_trips_lifetime_and_must_be_fresh() {
    let interest = Interest::new(Name::from_uri("/a/b"))
      .with_lifetime(Duration::from_secs(60))
      .with_must_be_fresh(true);
    let wire = interest.encode();
    let (packet, _) = decode_packet(&wire).unwrap().unwrap();
    let Packet::Interest(decoded) = packet else { panic!("expected Interest") };
    assert_eq!(decoded.name, interest.name);
    assert_eq!(decoded.lifetime, interest.lifetime);
    assert!(decoded.must_be_fresh);
  }

  #[test]
  fn decode_packet_reports_incomplete_not_error() {
    let data = Data::new(Name::from_uri("/a/b"), Bytes::from_static(b"xyz"));
    let wire = data.encode();
    let truncated = &wire[..wire.len() - 1];
    assert!(decode_packet(truncated).unwrap().is_none());
  }
}
