//! Flattens the pending-interest table to a tab-separated text file on
//! clean shutdown and reloads it on startup (§4.4). One line per user:
//! first field the user-id component, remaining fields the outstanding
//! interest names. Retry counts are not persisted — an intentional
//! simplification (§4.4, §9b).

use std::path::Path;

use crate::error::{DsuError, DsuResult};
use crate::ndn::{Name, NameComponent};
use crate::pit::{ObjectClass, PendingInterestTable};

pub fn save(path: &Path, pit: &PendingInterestTable) -> DsuResult<()> {
  let mut text = String::new();
  for (user_id, names) in pit.flatten() {
    text.push_str(&user_id.to_string());
    for name in names {
      text.push('\t');
      text.push_str(&name.to_uri());
    }
    text.push('\n');
  }
  std::fs::write(path, text).map_err(|source| DsuError::StateFile { path: path.to_path_buf(), source })
}

/// Reloads the table from disk, classifying each recovered name with
/// `classify` (the best-effort reclassifier of §4.2). A missing file is
/// not an error — it simply yields an empty table, matching the original's
/// "fileToMap returns false on missing file, caller keeps the map empty".
pub fn load(
  path: &Path,
  classify: impl FnMut(&Name) -> ObjectClass,
) -> PendingInterestTable {
  let Ok(text) = std::fs::read_to_string(path) else {
    return PendingInterestTable::new();
  };
  let mut entries = Vec::new();
  for line in text.lines() {
    if line.is_empty() {
      continue;
    }
    let mut fields = line.split('\t');
    let Some(user_id) = fields.next() else { continue };
    let names: Vec<Name> = fields.map(Name::from_uri).collect();
    entries.push((NameComponent::from(user_id), names));
  }
  PendingInterestTable::from_flattened(entries, classify)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::pit::PitEntry;

  fn user(s: &str) -> NameComponent {
    NameComponent::from(s)
  }

  #[test]
  fn round_trips_pit_modulo_retry_counts() {
    let dir = tempdir();
    let path = dir.join("state");

    let mut pit = PendingInterestTable::new();
    pit.insert_if_absent(user("haitao"), Name::from_uri("/a/b/catalog/20170617T042400"), ObjectClass::DataCatalog);
    if let Some(entry) = pit.get_mut(&user("haitao"), &Name::from_uri("/a/b/catalog/20170617T042400")) {
      entry.retry_count = 3;
    }

    save(&path, &pit).unwrap();
    let reloaded = load(&path, |name| {
      if name.contains_component("catalog") {
        ObjectClass::DataCatalog
      } else {
        ObjectClass::DataPoint
      }
    });

    let entry = reloaded
      .get(&user("haitao"), &Name::from_uri("/a/b/catalog/20170617T042400"))
      .unwrap();
    assert_eq!(entry, &PitEntry::new(ObjectClass::DataCatalog));

    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn missing_file_yields_empty_table() {
    let pit = load(Path::new("/nonexistent/path/to/state"), |_| ObjectClass::DataPoint);
    assert_eq!(pit.user_count(), 0);
  }

  fn tempdir() -> std::path::PathBuf {
    let dir = std::env::temp_dir().join(format!("ndnfit-dsu-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }
}
