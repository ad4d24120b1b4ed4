use crate::cache::format_timestamp;
use crate::config::Settings;
use crate::gdata::api_types::ApiFeedResponse;
use crate::sync::{ContactsFeed, ContactsService, Credentials, FeedEntry, PageQuery};
use color_eyre::{eyre::eyre, Result};
use reqwest::header::AUTHORIZATION;
use tracing::debug;
use url::Url;

pub const DEFAULT_AUTH_URL: &str = "https://www.google.com/accounts/ClientLogin";
pub const DEFAULT_FEED_URL: &str = "https://www.google.com/m8/feeds/contacts";

/// Identifies this client to the service, as ClientLogin requires.
const CLIENT_SOURCE: &str = concat!("addrsync-", env!("CARGO_PKG_VERSION"));

/// Google contacts service (ClientLogin + GData v3 feed)
#[derive(Clone)]
pub struct GoogleContacts {
  http: reqwest::Client,
  auth_url: Url,
  feed_url: Url,
}

impl GoogleContacts {
  pub fn new(settings: &Settings) -> Result<Self> {
    Self::with_endpoints(&settings.auth_url, &settings.feed_url)
  }

  pub fn with_endpoints(auth_url: &str, feed_url: &str) -> Result<Self> {
    let auth_url =
      Url::parse(auth_url).map_err(|e| eyre!("Invalid auth URL {}: {}", auth_url, e))?;
    let feed_url =
      Url::parse(feed_url).map_err(|e| eyre!("Invalid feed URL {}: {}", feed_url, e))?;

    let http = reqwest::Client::builder()
      .user_agent(CLIENT_SOURCE)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      auth_url,
      feed_url,
    })
  }

  /// Feed of the given user's contacts, thin projection
  fn user_feed_url(&self, login: &str) -> Result<Url> {
    let mut url = self.feed_url.clone();
    url
      .path_segments_mut()
      .map_err(|_| eyre!("Feed URL cannot take a path: {}", self.feed_url))?
      .pop_if_empty()
      .push(login)
      .push("thin");
    Ok(url)
  }
}

impl ContactsService for GoogleContacts {
  type Feed = GoogleSession;

  /// Exchange login and password for a ClientLogin token
  async fn authenticate(&self, credentials: &Credentials) -> Result<GoogleSession> {
    let params = [
      ("accountType", "HOSTED_OR_GOOGLE"),
      ("Email", credentials.login.as_str()),
      ("Passwd", credentials.password.as_str()),
      ("service", "cp"),
      ("source", CLIENT_SOURCE),
    ];

    let response = self
      .http
      .post(self.auth_url.clone())
      .form(&params)
      .send()
      .await
      .map_err(|e| eyre!("Failed to reach {}: {}", self.auth_url, e))?;

    let status = response.status();
    let body = response
      .text()
      .await
      .map_err(|e| eyre!("Failed to read authentication response: {}", e))?;

    if !status.is_success() {
      return Err(eyre!(
        "Authentication rejected ({}): {}",
        status,
        login_error(&body).unwrap_or("no reason given")
      ));
    }

    let token = auth_token(&body)
      .ok_or_else(|| eyre!("Authentication response did not contain a token"))?;

    Ok(GoogleSession {
      http: self.http.clone(),
      feed_url: self.user_feed_url(&credentials.login)?,
      token: token.to_string(),
    })
  }
}

/// Authenticated access to one user's contacts feed
pub struct GoogleSession {
  http: reqwest::Client,
  feed_url: Url,
  token: String,
}

impl GoogleSession {
  fn page_url(&self, query: &PageQuery) -> Url {
    let mut url = self.feed_url.clone();
    {
      let mut pairs = url.query_pairs_mut();
      pairs
        .append_pair("alt", "json")
        .append_pair("orderby", "lastmodified")
        .append_pair("showdeleted", "true")
        .append_pair("max-results", &query.page_size.to_string())
        .append_pair("start-index", &query.start_index.to_string());
      if let Some(since) = query.updated_since {
        pairs.append_pair("updated-min", &format_timestamp(since));
      }
    }
    url
  }
}

impl ContactsFeed for GoogleSession {
  async fn fetch_page(&self, query: &PageQuery) -> Result<Vec<FeedEntry>> {
    let url = self.page_url(query);

    let response = self
      .http
      .get(url)
      .header(AUTHORIZATION, format!("GoogleLogin auth={}", self.token))
      .header("GData-Version", "3.0")
      .send()
      .await
      .map_err(|e| eyre!("Failed to get contacts: {}", e))?;

    let status = response.status();
    if !status.is_success() {
      return Err(eyre!("Contacts feed returned {}", status));
    }

    let page: ApiFeedResponse = response
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse contacts feed: {}", e))?;

    debug!(
      entries = page.feed.entry.len(),
      newest = page
        .feed
        .entry
        .last()
        .and_then(|e| e.updated.as_ref())
        .map(|u| u.text.as_str())
        .unwrap_or("-"),
      "Received contacts page"
    );

    Ok(page.into())
  }
}

/// The `Auth=` line of a ClientLogin response body
fn auth_token(body: &str) -> Option<&str> {
  body
    .lines()
    .find_map(|line| line.trim().strip_prefix("Auth="))
    .filter(|token| !token.is_empty())
}

/// The `Error=` line of a rejected ClientLogin response body
fn login_error(body: &str) -> Option<&str> {
  body
    .lines()
    .find_map(|line| line.trim().strip_prefix("Error="))
}
