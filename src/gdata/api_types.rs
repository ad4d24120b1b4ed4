//! Serde-deserializable types matching the GData v3 JSON contacts feed
//! (`alt=json`).
//!
//! GData wraps text nodes as `{"$t": "..."}` and prefixes namespaced
//! elements, e.g. `gd$email`.

use serde::Deserialize;

use crate::sync::FeedEntry;

#[derive(Debug, Deserialize)]
pub struct ApiText {
  #[serde(rename = "$t", default)]
  pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiEmail {
  pub address: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiEntry {
  pub id: ApiText,
  pub title: Option<ApiText>,
  pub updated: Option<ApiText>,
  #[serde(rename = "gd$email", default)]
  pub emails: Vec<ApiEmail>,
  /// Present (as an empty object) only on deleted contacts
  #[serde(rename = "gd$deleted")]
  pub deleted: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiFeed {
  #[serde(default)]
  pub entry: Vec<ApiEntry>,
}

#[derive(Debug, Deserialize)]
pub struct ApiFeedResponse {
  #[serde(default)]
  pub feed: ApiFeed,
}

// ============================================================================
// Conversions to feed types
// ============================================================================

impl From<ApiEntry> for FeedEntry {
  fn from(entry: ApiEntry) -> Self {
    FeedEntry {
      id: entry.id.text,
      deleted: entry.deleted.is_some(),
      name: entry.title.map(|t| t.text),
      emails: entry.emails.into_iter().map(|e| e.address).collect(),
    }
  }
}

impl From<ApiFeedResponse> for Vec<FeedEntry> {
  fn from(resp: ApiFeedResponse) -> Self {
    resp.feed.entry.into_iter().map(FeedEntry::from).collect()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const FEED: &str = r#"{
    "version": "1.0",
    "encoding": "UTF-8",
    "feed": {
      "id": {"$t": "somebody@example.com"},
      "openSearch$totalResults": {"$t": "2"},
      "entry": [
        {
          "id": {"$t": "http://www.google.com/m8/feeds/contacts/somebody%40example.com/base/0"},
          "updated": {"$t": "2010-03-21T23:05:19.955Z"},
          "title": {"$t": "Jpe Bloggs"},
          "gd$email": [
            {"address": "jbloggs@example.com", "rel": "http://schemas.google.com/g/2005#other", "primary": "true"},
            {"address": "another@example.com", "rel": "http://schemas.google.com/g/2005#work"}
          ]
        },
        {
          "id": {"$t": "http://www.google.com/m8/feeds/contacts/somebody%40example.com/base/1"},
          "updated": {"$t": "2010-03-22T10:00:00.000Z"},
          "title": {"$t": ""},
          "gd$deleted": {}
        }
      ]
    }
  }"#;

  #[test]
  fn test_parse_feed() {
    let resp: ApiFeedResponse = serde_json::from_str(FEED).unwrap();
    let entries: Vec<FeedEntry> = resp.into();

    assert_eq!(
      entries,
      vec![
        FeedEntry {
          id: "http://www.google.com/m8/feeds/contacts/somebody%40example.com/base/0".to_string(),
          deleted: false,
          name: Some("Jpe Bloggs".to_string()),
          emails: vec![
            "jbloggs@example.com".to_string(),
            "another@example.com".to_string()
          ],
        },
        FeedEntry {
          id: "http://www.google.com/m8/feeds/contacts/somebody%40example.com/base/1".to_string(),
          deleted: true,
          name: Some(String::new()),
          emails: Vec::new(),
        },
      ]
    );
  }

  #[test]
  fn test_feed_without_entries() {
    let resp: ApiFeedResponse =
      serde_json::from_str(r#"{"feed": {"id": {"$t": "x"}}}"#).unwrap();
    let entries: Vec<FeedEntry> = resp.into();
    assert!(entries.is_empty());
  }

  #[test]
  fn test_entry_without_title() {
    let entry: ApiEntry = serde_json::from_str(
      r#"{"id": {"$t": "abc"}, "gd$email": [{"address": "x@example.com"}]}"#,
    )
    .unwrap();
    let entry = FeedEntry::from(entry);
    assert_eq!(entry.name, None);
    assert_eq!(entry.emails, vec!["x@example.com".to_string()]);
    assert!(!entry.deleted);
  }

  #[test]
  fn test_entry_without_id_is_rejected() {
    assert!(serde_json::from_str::<ApiEntry>(r#"{"title": {"$t": "No Id"}}"#).is_err());
  }
}
