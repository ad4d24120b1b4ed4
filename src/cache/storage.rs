//! Single-file YAML persistence for the contacts cache.
//!
//! The file holds a two-element sequence:
//!
//! ```yaml
//! - "2024-03-01T10:15:00.000Z"   # last modified, or ~
//! - some-contact-id:
//!     - [ann@example.com, Ann Example]
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use color_eyre::{eyre::WrapErr, Result};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::traits::Address;

/// Addresses keyed by contact id.
pub type AddressBook = BTreeMap<String, Vec<Address>>;

/// Everything the cache file stores.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheSnapshot {
  pub last_modified: Option<DateTime<Utc>>,
  pub addresses: AddressBook,
}

/// On-disk shape. The second element may be null in files written by hand.
type StoredCache = (Option<String>, Option<AddressBook>);

/// The backing file of a contacts cache.
#[derive(Debug, Clone)]
pub struct CacheFile {
  path: PathBuf,
}

impl CacheFile {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Read the cache file.
  ///
  /// A missing, empty or malformed file yields an empty snapshot. Any other
  /// I/O failure (permission denied, path is a directory, ...) is returned.
  pub fn read(&self) -> Result<CacheSnapshot> {
    let bytes = match std::fs::read(&self.path) {
      Ok(bytes) => bytes,
      Err(e) if e.kind() == ErrorKind::NotFound => {
        debug!(path = %self.path.display(), "No cache file, starting empty");
        return Ok(CacheSnapshot::default());
      }
      Err(e) => {
        return Err(e)
          .wrap_err_with(|| format!("Failed to read cache file {}", self.path.display()))
      }
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
      debug!(path = %self.path.display(), "Cache file is empty");
      return Ok(CacheSnapshot::default());
    }

    match decode(&bytes) {
      Some(snapshot) => Ok(snapshot),
      None => {
        warn!(path = %self.path.display(), "Cache file is malformed, discarding it");
        Ok(CacheSnapshot::default())
      }
    }
  }

  /// Overwrite the cache file with the given state.
  ///
  /// Writes in place; an interrupted write can leave a truncated file, which
  /// the next [`CacheFile::read`] treats as malformed.
  pub fn write(&self, last_modified: Option<DateTime<Utc>>, addresses: &AddressBook) -> Result<()> {
    let stored = (last_modified.map(format_timestamp), addresses);
    let yaml = serde_yaml::to_string(&stored).wrap_err("Failed to serialize contacts cache")?;

    if let Some(parent) = self.path.parent() {
      if !parent.as_os_str().is_empty() {
        std::fs::create_dir_all(parent)
          .wrap_err_with(|| format!("Failed to create cache directory {}", parent.display()))?;
      }
    }

    std::fs::write(&self.path, yaml)
      .wrap_err_with(|| format!("Failed to write cache file {}", self.path.display()))
  }
}

/// Format a timestamp the way it is persisted and sent to the contacts feed.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
  timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode(bytes: &[u8]) -> Option<CacheSnapshot> {
  let (last_modified, addresses): StoredCache = serde_yaml::from_slice(bytes).ok()?;

  let Some(addresses) = addresses else {
    return Some(CacheSnapshot::default());
  };

  let last_modified = match last_modified {
    Some(s) => Some(DateTime::parse_from_rfc3339(&s).ok()?.with_timezone(&Utc)),
    None => None,
  };

  Some(CacheSnapshot {
    last_modified,
    addresses,
  })
}
