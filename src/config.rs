use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::gdata::{DEFAULT_AUTH_URL, DEFAULT_FEED_URL};
use crate::sync::{Credentials, DEFAULT_FETCH_SIZE};

/// Days before the cache is refreshed automatically, unless configured.
pub const DEFAULT_AUTO_CHECK_DAYS: i64 = 1;

/// Environment variable holding the service password.
pub const PASSWORD_ENV: &str = "ADDRSYNC_PASSWORD";

/// Written to stdout by `addrsync skel`.
pub const SKELETON: &str = r#"# addrsync configuration
#
# Values given on the command line override the ones below.

# Google account used to download contacts
login: someone@gmail.com

# Password for the account. Can also be set with ADDRSYNC_PASSWORD.
# password: secret

# Where cached contacts are kept
# cache_file_path: ~/.cache/addrsync/contacts.yaml

# Days before the cache is refreshed automatically. 0 disables the check.
# auto_check: 1

# Contacts requested per page while syncing
# fetch_size: 25

# Log to this file instead of stderr
# log_file: ~/.cache/addrsync/addrsync.log
"#;

/// Contents of the configuration file. Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
  pub login: Option<String>,
  pub password: Option<String>,
  pub cache_file_path: Option<PathBuf>,
  /// Staleness lifespan in days; 0 or less disables the automatic refresh
  pub auto_check: Option<i64>,
  pub fetch_size: Option<usize>,
  /// ClientLogin endpoint (for testing against another server)
  pub auth_url: Option<String>,
  /// Contacts feed base URL (for testing against another server)
  pub feed_url: Option<String>,
  pub log_file: Option<PathBuf>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided (must exist)
  /// 2. ./addrsync.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/addrsync/config.yaml
  ///
  /// With no file found every setting falls back to its default.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      let p = expand_home(p);
      if p.exists() {
        Some(p)
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("addrsync.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("addrsync").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
    if contents.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(contents)
  }

  /// Get the password from the environment, if set.
  ///
  /// Checks ADDRSYNC_PASSWORD.
  pub fn get_password() -> Option<String> {
    std::env::var(PASSWORD_ENV).ok().filter(|p| !p.is_empty())
  }
}

/// Values given on the command line. They win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub login: Option<String>,
  pub password: Option<String>,
  pub cache_file_path: Option<PathBuf>,
  pub auto_check: Option<i64>,
  pub fetch_size: Option<usize>,
}

/// Resolved application settings.
///
/// Precedence: command line > environment (password only) > config file >
/// built-in default.
#[derive(Debug, Clone)]
pub struct Settings {
  pub login: Option<String>,
  pub password: Option<String>,
  pub cache_file_path: PathBuf,
  pub auto_check: i64,
  pub fetch_size: usize,
  pub auth_url: String,
  pub feed_url: String,
  pub log_file: Option<PathBuf>,
}

impl Settings {
  pub fn resolve(config: Config, overrides: Overrides, env_password: Option<String>) -> Result<Self> {
    let cache_file_path = match overrides.cache_file_path.or(config.cache_file_path) {
      Some(path) => expand_home(&path),
      None => default_cache_path()?,
    };

    Ok(Self {
      login: overrides.login.or(config.login),
      password: overrides.password.or(env_password).or(config.password),
      cache_file_path,
      auto_check: overrides
        .auto_check
        .or(config.auto_check)
        .unwrap_or(DEFAULT_AUTO_CHECK_DAYS),
      fetch_size: overrides
        .fetch_size
        .or(config.fetch_size)
        .unwrap_or(DEFAULT_FETCH_SIZE),
      auth_url: config.auth_url.unwrap_or_else(|| DEFAULT_AUTH_URL.to_string()),
      feed_url: config.feed_url.unwrap_or_else(|| DEFAULT_FEED_URL.to_string()),
      log_file: config.log_file.map(|p| expand_home(&p)),
    })
  }

  /// Credentials for the contacts service. Both login and password are required.
  pub fn credentials(&self) -> Result<Credentials> {
    let login = self
      .login
      .clone()
      .ok_or_else(|| eyre!("No login configured. Pass --login or set `login` in the config file."))?;
    let password = self.password.clone().ok_or_else(|| {
      eyre!(
        "No password configured. Pass --password, set {} or set `password` in the config file.",
        PASSWORD_ENV
      )
    })?;
    Ok(Credentials::new(login, password))
  }
}

/// Get the default contacts cache path
pub fn default_cache_path() -> Result<PathBuf> {
  let cache_dir = dirs::cache_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".cache")))
    .ok_or_else(|| eyre!("Could not determine cache directory"))?;

  Ok(cache_dir.join("addrsync").join("contacts.yaml"))
}

/// Expand a leading `~` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
  if let Ok(rest) = path.strip_prefix("~") {
    if let Some(home) = dirs::home_dir() {
      return home.join(rest);
    }
  }
  path.to_path_buf()
}
