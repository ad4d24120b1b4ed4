//! Incremental refresh of the contacts cache from a remote feed.

use color_eyre::{eyre::WrapErr, Result};
use tracing::{debug, info};

use crate::cache::{format_timestamp, ContactStore};

use super::feed::{ContactsFeed, ContactsService, Credentials, FeedEntry, PageQuery};

/// Entries requested per page unless configured otherwise.
pub const DEFAULT_FETCH_SIZE: usize = 25;

/// What a completed sync pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
  pub pages: usize,
  pub updated: usize,
  pub deleted: usize,
}

/// Pulls contact changes since the cache watermark and applies them.
///
/// One pass authenticates, walks the change feed page by page, applies each
/// entry in order and saves the cache once at the end. Any failure aborts
/// the pass before saving, so the file on disk keeps its previous content.
pub struct SyncEngine<S> {
  service: S,
  credentials: Credentials,
  fetch_size: usize,
}

impl<S: ContactsService> SyncEngine<S> {
  pub fn new(service: S, credentials: Credentials) -> Self {
    Self {
      service,
      credentials,
      fetch_size: DEFAULT_FETCH_SIZE,
    }
  }

  /// Set the page size. Values below 1 are raised to 1.
  pub fn with_fetch_size(mut self, fetch_size: usize) -> Self {
    self.fetch_size = fetch_size.max(1);
    self
  }

  pub fn fetch_size(&self) -> usize {
    self.fetch_size
  }

  /// Bring `cache` up to date with the remote service and save it.
  ///
  /// The watermark is read once before the first page; every page of the
  /// pass is filtered against that same instant. Paging stops at the first
  /// page holding fewer than `fetch_size` entries.
  pub async fn update_cache<C: ContactStore>(&self, cache: &mut C) -> Result<SyncReport> {
    debug!(login = %self.credentials.login, "Authenticating with contacts service");
    let feed = self
      .service
      .authenticate(&self.credentials)
      .await
      .wrap_err_with(|| format!("Failed to authenticate as {}", self.credentials.login))?;

    let watermark = cache.last_modified();
    match watermark {
      Some(since) => debug!(since = %format_timestamp(since), "Incremental sync"),
      None => debug!("Full sync"),
    }

    let mut report = SyncReport::default();
    let mut start_index = 1;

    loop {
      let query = PageQuery {
        start_index,
        page_size: self.fetch_size(),
        updated_since: watermark,
      };

      debug!(start_index, page_size = query.page_size, "Fetching contacts page");
      let entries = feed
        .fetch_page(&query)
        .await
        .wrap_err_with(|| format!("Failed to fetch contacts starting at {}", start_index))?;
      report.pages += 1;

      let count = entries.len();
      for entry in entries {
        apply_entry(cache, entry, &mut report);
      }

      if count < self.fetch_size {
        break;
      }
      start_index += self.fetch_size;
    }

    debug!("Saving contacts cache");
    cache.save()?;

    info!(
      pages = report.pages,
      updated = report.updated,
      deleted = report.deleted,
      "Contacts cache synchronized"
    );
    Ok(report)
  }
}

fn apply_entry<C: ContactStore>(cache: &mut C, entry: FeedEntry, report: &mut SyncReport) {
  if entry.deleted {
    if cache.delete(&entry.id).is_some() {
      report.deleted += 1;
    }
  } else {
    let name = entry.name.unwrap_or_default();
    cache.update(&entry.id, &name, entry.emails);
    report.updated += 1;
  }
}
