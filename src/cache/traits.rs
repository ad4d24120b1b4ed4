//! Core traits and types for the contacts cache.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};

/// One `(email, name)` pair of a cached contact.
///
/// A contact with several email addresses is stored as several pairs that
/// repeat the same name, so searching never has to look past a flat list.
/// Persisted as a two-element `[email, name]` sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct Address {
  pub email: String,
  pub name: String,
}

impl Address {
  pub fn new(email: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      email: email.into(),
      name: name.into(),
    }
  }
}

impl From<(String, String)> for Address {
  fn from((email, name): (String, String)) -> Self {
    Self { email, name }
  }
}

impl From<Address> for (String, String) {
  fn from(address: Address) -> Self {
    (address.email, address.name)
  }
}

/// Mutation API the sync engine drives.
///
/// Implemented by [`super::ContactsCache`]; kept as a trait so a sync pass can
/// be exercised against a recording store.
pub trait ContactStore {
  /// Timestamp of the most recent mutation, used as the sync watermark.
  fn last_modified(&self) -> Option<DateTime<Utc>>;

  /// Replace every address stored for `id`.
  fn update(&mut self, id: &str, name: &str, emails: Vec<String>);

  /// Remove `id`, returning its addresses if it was present.
  fn delete(&mut self, id: &str) -> Option<Vec<Address>>;

  /// Persist the whole store.
  fn save(&self) -> Result<()>;
}
