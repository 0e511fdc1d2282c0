//! Name utilities: timeslot rounding, name-component rewriting, and the
//! handful of name constructions the fetch engine derives from a catalog or
//! a C-KEY name.

use chrono::{DateTime, TimeZone, Timelike, Utc};

use crate::ndn::Name;

pub const CKEY: &str = "C-KEY";
pub const EKEY: &str = "E-KEY";
pub const DKEY: &str = "D-KEY";
pub const CATALOG: &str = "catalog";
pub const DKEY_CATALOG: &str = "D-KEY/catalog";

/// Formats a timestamp the way the producer's catalog/C-KEY/D-KEY names do:
/// `YYYYMMDDThhmmss`.
pub fn format_iso(dt: DateTime<Utc>) -> String {
  dt.format("%Y%m%dT%H%M%S").to_string()
}

/// Parses a `YYYYMMDDThhmmss` component back into a timestamp. Returns
/// `None` on malformed input — callers (catalog expansion) treat this the
/// same way the original treats a parse failure: log and move on without
/// the derived fetch.
pub fn parse_iso(s: &str) -> Option<DateTime<Utc>> {
  chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
    .ok()
    .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Rounds a timestamp down to the start of its hour, matching the
/// original's `getRoundedTimeslot` (integer-divide the Unix timestamp by
/// one hour in milliseconds).
pub fn round_down_to_hour(dt: DateTime<Utc>) -> DateTime<Utc> {
  dt.with_minute(0)
    .and_then(|d| d.with_second(0))
    .and_then(|d| d.with_nanosecond(0))
    .unwrap_or(dt)
}

/// Replaces the first occurrence of `from` with `to` in a name's URI
/// representation and reparses it, mirroring the original's
/// `replace(dkeyName, EKEY, DKEYCATALOG)` string substitution.
pub fn replace_in_name(name: &Name, from: &str, to: &str) -> Name {
  Name::from_uri(&name.to_uri().replacen(from, to, 1))
}

/// Builds `<prefix>/C-KEY/catalog/<isoHour>` for the hour containing
/// `catalog_timestamp`.
pub fn ckey_catalog_name_for_hour(prefix: &Name, catalog_timestamp: DateTime<Utc>) -> Name {
  let hour = round_down_to_hour(catalog_timestamp);
  prefix.clone().append(CKEY).append(CATALOG).append(format_iso(hour))
}

/// Derives the E-KEY name from a C-KEY name by dropping the common prefix
/// the two names share (the length of the C-KEY-catalog interest that
/// produced the C-KEY name) — §4.2's "drop the C-KEY prefix".
pub fn ekey_name_from_ckey_name(ckey_name: &Name, shared_prefix_len: usize) -> Name {
  ckey_name.sub_name(shared_prefix_len)
}

/// Derives the D-KEY-catalog name from an E-KEY name by replacing the
/// `E-KEY` component with `D-KEY/catalog`.
pub fn dkey_catalog_name_from_ekey_name(ekey_name: &Name) -> Name {
  replace_in_name(ekey_name, EKEY, DKEY_CATALOG)
}

/// The user-id is the name component at a fixed depth; callers compute
/// that depth as "prefix length" against the known prefix rather than
/// hard-coding an index (§6).
pub fn user_id_at_depth(name: &Name, depth: usize) -> Option<&crate::ndn::NameComponent> {
  name.get(depth)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn iso_format_round_trips() {
    let dt = Utc.with_ymd_and_hms(2017, 6, 17, 4, 24, 0).unwrap();
    let formatted = format_iso(dt);
    assert_eq!(formatted, "20170617T042400");
    assert_eq!(parse_iso(&formatted), Some(dt));
  }

  #[test]
  fn rounds_down_to_the_hour() {
    let dt = Utc.with_ymd_and_hms(2017, 6, 17, 4, 24, 0).unwrap();
    let rounded = round_down_to_hour(dt);
    assert_eq!(format_iso(rounded), "20170617T040000");
  }

  #[test]
  fn ckey_catalog_name_uses_rounded_hour() {
    let prefix = Name::from_uri("/org/openmhealth/haitao/SAMPLE/fitness/physical_activity/time_location");
    let dt = Utc.with_ymd_and_hms(2017, 6, 17, 4, 24, 0).unwrap();
    let name = ckey_catalog_name_for_hour(&prefix, dt);
    assert_eq!(
      name.to_uri(),
      "/org/openmhealth/haitao/SAMPLE/fitness/physical_activity/time_location/C-KEY/catalog/20170617T040000"
    );
  }

  #[test]
  fn dkey_catalog_name_replaces_ekey_component() {
    let ekey = Name::from_uri("/org/openmhealth/haitao/READ/fitness/E-KEY/20170617T000000/20170618T000000");
    let dkey_catalog = dkey_catalog_name_from_ekey_name(&ekey);
    assert_eq!(
      dkey_catalog.to_uri(),
      "/org/openmhealth/haitao/READ/fitness/D-KEY/catalog/20170617T000000/20170618T000000"
    );
  }

  #[test]
  fn malformed_timestamp_parses_to_none() {
    assert_eq!(parse_iso("not-a-timestamp"), None);
  }
}
