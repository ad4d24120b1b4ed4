//! Abstraction over the remote contacts service.

use chrono::{DateTime, Utc};
use color_eyre::Result;
use std::fmt;

/// Login and password for the contacts service.
#[derive(Clone)]
pub struct Credentials {
  pub login: String,
  pub password: String,
}

impl Credentials {
  pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
    Self {
      login: login.into(),
      password: password.into(),
    }
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Credentials")
      .field("login", &self.login)
      .field("password", &"<redacted>")
      .finish()
  }
}

/// Parameters of one page request.
///
/// Every feed returns entries ordered by modification time, oldest first,
/// and includes deleted contacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageQuery {
  /// 1-based offset into the change-ordered result set
  pub start_index: usize,
  pub page_size: usize,
  /// Only entries modified at or after this instant; `None` for a full sync
  pub updated_since: Option<DateTime<Utc>>,
}

/// One changed contact as reported by the feed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedEntry {
  pub id: String,
  pub deleted: bool,
  pub name: Option<String>,
  pub emails: Vec<String>,
}

/// A contacts service that exchanges credentials for a feed session.
#[allow(async_fn_in_trait)]
pub trait ContactsService {
  type Feed: ContactsFeed;

  async fn authenticate(&self, credentials: &Credentials) -> Result<Self::Feed>;
}

/// An authenticated, paginated feed of contact changes.
#[allow(async_fn_in_trait)]
pub trait ContactsFeed {
  async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<FeedEntry>>;
}
