//! Incremental synchronization of the contacts cache.
//!
//! The engine only knows the remote side through the [`ContactsService`] and
//! [`ContactsFeed`] traits; `crate::gdata` provides the HTTP implementation.

mod engine;
mod feed;

pub use engine::{SyncEngine, SyncReport, DEFAULT_FETCH_SIZE};
pub use feed::{ContactsFeed, ContactsService, Credentials, FeedEntry, PageQuery};

/// In-memory contacts service for tests.
#[cfg(test)]
pub mod testing {
  use color_eyre::{eyre::eyre, Result};
  use std::cell::RefCell;
  use std::rc::Rc;

  use super::{ContactsFeed, ContactsService, Credentials, FeedEntry, PageQuery};

  pub fn entry(id: &str, name: Option<&str>, emails: &[&str]) -> FeedEntry {
    FeedEntry {
      id: id.to_string(),
      deleted: false,
      name: name.map(String::from),
      emails: emails.iter().map(|e| e.to_string()).collect(),
    }
  }

  pub fn deleted(id: &str) -> FeedEntry {
    FeedEntry {
      id: id.to_string(),
      deleted: true,
      ..Default::default()
    }
  }

  #[derive(Default)]
  struct State {
    pages: Vec<Vec<FeedEntry>>,
    fail_auth: bool,
    /// 1-based request number that fails
    fail_at: Option<usize>,
    requests: Vec<PageQuery>,
  }

  /// Serves fixed pages and records every request. Clones share state.
  #[derive(Clone, Default)]
  pub struct FakeService {
    state: Rc<RefCell<State>>,
  }

  impl FakeService {
    pub fn with_pages(pages: Vec<Vec<FeedEntry>>) -> Self {
      let service = Self::default();
      service.state.borrow_mut().pages = pages;
      service
    }

    pub fn failing_auth() -> Self {
      let service = Self::default();
      service.state.borrow_mut().fail_auth = true;
      service
    }

    pub fn failing_at(self, request: usize) -> Self {
      self.state.borrow_mut().fail_at = Some(request);
      self
    }

    pub fn requests(&self) -> Vec<PageQuery> {
      self.state.borrow().requests.clone()
    }
  }

  impl ContactsService for FakeService {
    type Feed = FakeService;

    async fn authenticate(&self, _credentials: &Credentials) -> Result<Self::Feed> {
      if self.state.borrow().fail_auth {
        return Err(eyre!("BadAuthentication"));
      }
      Ok(self.clone())
    }
  }

  impl ContactsFeed for FakeService {
    async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<FeedEntry>> {
      let mut state = self.state.borrow_mut();
      state.requests.push(query.clone());

      if state.fail_at == Some(state.requests.len()) {
        return Err(eyre!("connection reset"));
      }

      let index = (query.start_index - 1) / query.page_size;
      Ok(state.pages.get(index).cloned().unwrap_or_default())
    }
  }
}
