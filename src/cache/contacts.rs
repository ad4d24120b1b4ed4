//! In-memory contacts cache backed by a single file.

use chrono::{DateTime, Duration, Utc};
use color_eyre::{eyre::WrapErr, Result};
use regex::{Regex, RegexBuilder};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use super::storage::{AddressBook, CacheFile};
use super::traits::{Address, ContactStore};

/// How a search query is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchMode {
  /// The query is a case-insensitive regular expression.
  #[default]
  Pattern,
  /// The query is matched as a case-insensitive substring.
  Literal,
}

impl SearchMode {
  fn compile(self, query: &str) -> Result<Regex> {
    let pattern = match self {
      SearchMode::Pattern => Cow::Borrowed(query),
      SearchMode::Literal => Cow::Owned(regex::escape(query)),
    };

    RegexBuilder::new(&pattern)
      .case_insensitive(true)
      .build()
      .wrap_err_with(|| format!("Invalid search pattern '{}'", query))
  }
}

/// Local copy of the remote contact list.
///
/// Every contact id maps to its `(email, name)` pairs. `last_modified` moves
/// to the current time on each mutation and doubles as the watermark for the
/// next incremental sync.
#[derive(Debug)]
pub struct ContactsCache {
  file: CacheFile,
  /// Days before the cache is considered stale; zero or less disables expiry
  lifespan_days: i64,
  addresses: AddressBook,
  last_modified: Option<DateTime<Utc>>,
}

impl ContactsCache {
  /// Load the cache stored at `path`.
  ///
  /// Starts empty when the file is missing or its content is unusable.
  /// Fails when the file exists but cannot be read.
  pub fn load(path: impl Into<PathBuf>, lifespan_days: i64) -> Result<Self> {
    let file = CacheFile::new(path);
    let snapshot = file.read()?;

    Ok(Self {
      file,
      lifespan_days,
      addresses: snapshot.addresses,
      last_modified: snapshot.last_modified,
    })
  }

  pub fn path(&self) -> &Path {
    self.file.path()
  }

  pub fn lifespan_days(&self) -> i64 {
    self.lifespan_days
  }

  pub fn last_modified(&self) -> Option<DateTime<Utc>> {
    self.last_modified
  }

  /// Number of cached contacts (not addresses).
  pub fn len(&self) -> usize {
    self.addresses.len()
  }

  pub fn is_empty(&self) -> bool {
    self.addresses.is_empty()
  }

  /// Whether the cache is due for a refresh.
  pub fn is_stale(&self) -> bool {
    self.is_stale_at(Utc::now())
  }

  fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
    if self.lifespan_days <= 0 {
      return false;
    }

    match self.last_modified {
      None => true,
      Some(modified) => Duration::try_days(self.lifespan_days)
        .and_then(|lifespan| modified.checked_add_signed(lifespan))
        .is_some_and(|expires| expires < now),
    }
  }

  /// Addresses stored for a contact id.
  #[allow(dead_code)]
  pub fn get(&self, id: &str) -> Option<&[Address]> {
    self.addresses.get(id).map(Vec::as_slice)
  }

  /// Search with the query used as a regular expression.
  ///
  /// See [`ContactsCache::search_with`].
  pub fn search(&self, query: Option<&str>) -> Result<Vec<Address>> {
    self.search_with(query, SearchMode::Pattern)
  }

  /// Find every address whose email or name matches `query`, ignoring case.
  ///
  /// A missing or empty query returns everything. Each address of a contact
  /// is matched on its own, so one contact can produce several results.
  /// Results are ordered by email, case-insensitively.
  pub fn search_with(&self, query: Option<&str>, mode: SearchMode) -> Result<Vec<Address>> {
    let matcher = match query.filter(|q| !q.is_empty()) {
      Some(q) => Some(mode.compile(q)?),
      None => None,
    };

    let mut results: Vec<Address> = self
      .addresses
      .values()
      .flatten()
      .filter(|address| {
        matcher
          .as_ref()
          .map_or(true, |re| re.is_match(&address.email) || re.is_match(&address.name))
      })
      .cloned()
      .collect();

    results.sort_by_cached_key(|address| address.email.to_lowercase());
    Ok(results)
  }

  /// Replace the addresses of `id` with one pair per email.
  pub fn update(&mut self, id: &str, name: &str, emails: Vec<String>) {
    let addresses = emails
      .into_iter()
      .map(|email| Address::new(email, name))
      .collect();
    self.addresses.insert(id.to_string(), addresses);
    self.last_modified = Some(Utc::now());
  }

  /// Remove `id`. Removing an unknown id changes nothing.
  pub fn delete(&mut self, id: &str) -> Option<Vec<Address>> {
    let removed = self.addresses.remove(id);
    if removed.is_some() {
      self.last_modified = Some(Utc::now());
    }
    removed
  }

  /// Drop every contact so the next sync downloads the full list.
  pub fn clear(&mut self) {
    self.addresses.clear();
    self.last_modified = None;
  }

  /// Write the whole cache back to its file.
  pub fn save(&self) -> Result<()> {
    self.file.write(self.last_modified, &self.addresses)
  }
}

impl ContactStore for ContactsCache {
  fn last_modified(&self) -> Option<DateTime<Utc>> {
    self.last_modified
  }

  fn update(&mut self, id: &str, name: &str, emails: Vec<String>) {
    ContactsCache::update(self, id, name, emails)
  }

  fn delete(&mut self, id: &str) -> Option<Vec<Address>> {
    ContactsCache::delete(self, id)
  }

  fn save(&self) -> Result<()> {
    ContactsCache::save(self)
  }
}
