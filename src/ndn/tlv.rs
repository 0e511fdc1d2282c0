//! Minimal NDN TLV (type-length-value) codec.
//!
//! Only the subset of the NDN packet spec this crate actually reads or
//! writes is implemented: Interest and Data packets carrying a Name, an
//! optional Content block, MustBeFresh/InterestLifetime, and a KeyLocator
//! name inside SignatureInfo. This is not a general-purpose NDN library.

use bytes::{Buf, BufMut, BytesMut};

use super::name::{Name, NameComponent};

pub const TLV_INTEREST: u64 = 5;
pub const TLV_DATA: u64 = 6;
pub const TLV_NAME: u64 = 7;
pub const TLV_GENERIC_NAME_COMPONENT: u64 = 8;
pub const TLV_NONCE: u64 = 10;
pub const TLV_INTEREST_LIFETIME: u64 = 12;
pub const TLV_MUST_BE_FRESH: u64 = 18;
pub const TLV_META_INFO: u64 = 20;
pub const TLV_CONTENT: u64 = 21;
pub const TLV_SIGNATURE_INFO: u64 = 22;
pub const TLV_SIGNATURE_VALUE: u64 = 23;
pub const TLV_CONTENT_TYPE: u64 = 24;
pub const TLV_FRESHNESS_PERIOD: u64 = 25;
pub const TLV_SIGNATURE_TYPE: u64 = 27;
pub const TLV_KEY_LOCATOR: u64 = 28;
pub const TLV_FORWARDING_HINT: u64 = 30;

/// Outcome of attempting to decode one TLV element from a byte slice.
pub enum Decoded<'a> {
  /// A full element was decoded; `rest` is what follows it in the buffer.
  Element { tlv_type: u64, value: &'a [u8], rest: &'a [u8] },
  /// Not enough bytes were available yet; the caller should wait for more.
  Incomplete,
}

/// Reads an NDN "VarNumber": 1, 3, 5, or 9 bytes depending on the leading
/// byte, per the NDN TLV encoding rules.
fn read_var_number(buf: &[u8]) -> Option<(u64, &[u8])> {
  let (&first, rest) = buf.split_first()?;
  match first {
    0..=252 => Some((first as u64, rest)),
    253 => {
      if rest.len() < 2 {
        return None;
      }
      let (head, tail) = rest.split_at(2);
      Some((u16::from_be_bytes([head[0], head[1]]) as u64, tail))
    }
    254 => {
      if rest.len() < 4 {
        return None;
      }
      let (head, tail) = rest.split_at(4);
      Some((u32::from_be_bytes([head[0], head[1], head[2], head[3]]) as u64, tail))
    }
    255 => {
      if rest.len() < 8 {
        return None;
      }
      let (head, tail) = rest.split_at(8);
      let mut arr = [0u8; 8];
      arr.copy_from_slice(head);
      Some((u64::from_be_bytes(arr), tail))
    }
  }
}

fn write_var_number(out: &mut BytesMut, n: u64) {
  if n <= 252 {
    out.put_u8(n as u8);
  } else if n <= u16::MAX as u64 {
    out.put_u8(253);
    out.put_u16(n as u16);
  } else if n <= u32::MAX as u64 {
    out.put_u8(254);
    out.put_u32(n as u32);
  } else {
    out.put_u8(255);
    out.put_u64(n);
  }
}

/// Decodes exactly one TLV element starting at the front of `buf`.
pub fn decode_one(buf: &[u8]) -> Decoded<'_> {
  let Some((tlv_type, after_type)) = read_var_number(buf) else {
    return Decoded::Incomplete;
  };
  let Some((length, after_length)) = read_var_number(after_type) else {
    return Decoded::Incomplete;
  };
  let length = length as usize;
  if after_length.len() < length {
    return Decoded::Incomplete;
  }
  let (value, rest) = after_length.split_at(length);
  Decoded::Element { tlv_type, value, rest }
}

/// Appends one TLV element (type, length-prefix, value) to `out`.
pub fn write_element(out: &mut BytesMut, tlv_type: u64, value: &[u8]) {
  write_var_number(out, tlv_type);
  write_var_number(out, value.len() as u64);
  out.put_slice(value);
}

/// Appends a nested TLV element whose value is itself built by `build`.
pub fn write_nested(out: &mut BytesMut, tlv_type: u64, build: impl FnOnce(&mut BytesMut)) {
  let mut inner = BytesMut::new();
  build(&mut inner);
  write_element(out, tlv_type, &inner);
}

pub fn encode_name(out: &mut BytesMut, name: &Name) {
  write_nested(out, TLV_NAME, |inner| {
    for component in &name.0 {
      write_element(inner, TLV_GENERIC_NAME_COMPONENT, component.as_bytes());
    }
  });
}

#[derive(Debug, thiserror::Error)]
pub enum TlvError {
  #[error("expected Name (type {TLV_NAME}), found type {0}")]
  NotAName(u64),
  #[error("truncated TLV element while decoding a Name")]
  Truncated,
}

pub fn decode_name(value: &[u8]) -> Result<Name, TlvError> {
  let mut components = Vec::new();
  let mut rest = value;
  while !rest.is_empty() {
    match decode_one(rest) {
      Decoded::Element { tlv_type, value, rest: next } => {
        if tlv_type == TLV_GENERIC_NAME_COMPONENT {
          components.push(NameComponent::new(value.to_vec()));
        }
        rest = next;
      }
      Decoded::Incomplete => return Err(TlvError::Truncated),
    }
  }
  Ok(Name(components))
}

/// Finds the first top-level sub-element of `tlv_type` within `container`,
/// which must itself be the *value* bytes of some outer TLV element.
pub fn find_child(container: &[u8], tlv_type: u64) -> Option<&[u8]> {
  let mut rest = container;
  while !rest.is_empty() {
    match decode_one(rest) {
      Decoded::Element { tlv_type: t, value, rest: next } => {
        if t == tlv_type {
          return Some(value);
        }
        rest = next;
      }
      Decoded::Incomplete => return None,
    }
  }
  None
}

pub fn read_nonnegative_integer(value: &[u8]) -> u64 {
  let mut n: u64 = 0;
  for &b in value {
    n = (n << 8) | b as u64;
  }
  n
}

pub fn write_nonnegative_integer(out: &mut BytesMut, n: u64) {
  if n <= u8::MAX as u64 {
    out.put_u8(n as u8);
  } else if n <= u16::MAX as u64 {
    out.put_u16(n as u16);
  } else if n <= u32::MAX as u64 {
    out.put_u32(n as u32);
  } else {
    out.put_u64(n);
  }
}
