//! Name-shape classification.
//!
//! The original program re-derives an inbound Data's object class by
//! scanning its name for substrings (`EKEY`, `DKEYCATALOG`, ...) every time
//! one is needed. That heuristic has a real bug: the branch meant to catch
//! D-KEY-catalog names compares against `EKEY` twice, so that path is
//! dead code (§9, "Known issues in the source"). This port tags each
//! issued interest with its class at emission time (see [`crate::pit`])
//! and only falls back to shape classification at the two points the spec
//! genuinely requires it: a local-check probe miss (the PIT has no entry
//! yet to read a tag from) and PIT reload from persisted state.

use crate::names::{CATALOG, CKEY, DKEY, EKEY};
use crate::ndn::Name;
use crate::pit::ObjectClass;

/// Classifies a local-check probe's name into one of the four singleton
/// object types the probe path can ever be used for (§4.2's repo-probe
/// branch): C-KEY catalog, E-KEY, D-KEY catalog, or certificate.
pub fn classify_local_check(name: &Name) -> ObjectClass {
  let has_ckey = name.contains_component(CKEY);
  let has_dkey = name.contains_component(DKEY);
  let has_catalog = name.contains_component(CATALOG);

  if has_ckey && has_catalog {
    ObjectClass::CkeyCatalog
  } else if has_dkey && has_catalog {
    ObjectClass::DkeyCatalog
  } else if has_dkey {
    // D-KEY catalog names are rewritten from an E-KEY name and always
    // carry a `catalog` component (see names::dkey_catalog_name_from_ekey_name),
    // so a D-KEY marker without `catalog` can only be an E-KEY name that
    // happens to also contain the literal "D-KEY" — treat it as an E-KEY.
    ObjectClass::Ekey
  } else if has_ckey {
    ObjectClass::Ekey
  } else if name.contains_component(EKEY) {
    ObjectClass::Ekey
  } else {
    ObjectClass::Certificate
  }
}

/// Best-effort reclassification of a name recovered from persisted state
/// (§4.2, "Name classification on re-entry"). Ambiguities default to
/// leaf-data, matching the original's stated fallback.
pub fn classify_for_reload(name: &Name) -> ObjectClass {
  let has_ckey = name.contains_component(CKEY);
  let has_dkey = name.contains_component(DKEY);
  let has_catalog = name.contains_component(CATALOG);

  if has_ckey && has_catalog {
    ObjectClass::CkeyCatalog
  } else if has_dkey && has_catalog {
    ObjectClass::DkeyCatalog
  } else if has_catalog {
    ObjectClass::DataCatalog
  } else if has_ckey {
    ObjectClass::Ckey
  } else if has_dkey {
    ObjectClass::Dkey
  } else {
    ObjectClass::DataPoint
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn classifies_ckey_catalog_by_authoritative_components() {
    let name = Name::from_uri("/a/b/C-KEY/catalog/20170617T040000");
    assert_eq!(classify_local_check(&name), ObjectClass::CkeyCatalog);
  }

  #[test]
  fn classifies_dkey_catalog_reaching_the_previously_dead_branch() {
    // This is exactly the shape the original's buggy EKEY/EKEY branch
    // could never match (§9 "Known issues in the source").
    let name = Name::from_uri("/a/READ/fitness/D-KEY/catalog/20170617T000000/20170618T000000");
    assert_eq!(classify_local_check(&name), ObjectClass::DkeyCatalog);
  }

  #[test]
  fn classifies_bare_ekey_name() {
    // An E-KEY name produced by names::ekey_name_from_ckey_name has the
    // shared C-KEY-catalog prefix (and its C-KEY/catalog components)
    // already stripped off, so only the literal E-KEY marker remains.
    let name = Name::from_uri("/a/READ/fitness/E-KEY/20170617T000000/20170618T000000");
    assert_eq!(classify_local_check(&name), ObjectClass::Ekey);
  }

  #[test]
  fn classifies_certificate_as_the_fallback() {
    let name = Name::from_uri("/org/openmhealth/haitao/KEY/ndnfit/ksk-1502442197258/ID-CERT");
    assert_eq!(classify_local_check(&name), ObjectClass::Certificate);
  }

  #[test]
  fn reload_defaults_ambiguous_names_to_data_point() {
    let name = Name::from_uri("/org/openmhealth/haitao/SAMPLE/fitness/physical_activity/time_location/name-A");
    assert_eq!(classify_for_reload(&name), ObjectClass::DataPoint);
  }

  #[test]
  fn reload_recognizes_data_catalog_shape() {
    let name = Name::from_uri("/org/openmhealth/haitao/SAMPLE/fitness/physical_activity/time_location/catalog/20170617T042400");
    assert_eq!(classify_for_reload(&name), ObjectClass::DataCatalog);
  }
}
