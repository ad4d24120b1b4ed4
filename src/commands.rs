//! Subcommands and their execution.

use clap::Subcommand;
use color_eyre::Result;
use std::io::Write;
use tracing::{debug, info};

use crate::cache::{Address, ContactsCache, SearchMode};
use crate::config::{Settings, SKELETON};
use crate::gdata::GoogleContacts;
use crate::sync::{ContactsService, SyncEngine};

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
  /// Get the latest changes from the contacts service
  Update,
  /// Clear all cached addresses and reload them from the contacts service
  Reload,
  /// Search cached contacts (email or name) and print matches for mutt
  Search {
    /// Case-insensitive regular expression; empty matches everything
    query: Option<String>,
    /// Match the query as plain text instead of a regular expression
    #[arg(long)]
    literal: bool,
  },
  /// Write a skeleton configuration file to standard output
  Skel,
}

impl Command {
  /// Whether the command syncs even when the cache is fresh
  fn forces_sync(&self) -> bool {
    matches!(self, Command::Update | Command::Reload)
  }
}

/// Run a command against the Google contacts service.
pub async fn run(command: &Command, settings: &Settings, out: &mut impl Write) -> Result<()> {
  execute(command, settings, || GoogleContacts::new(settings), out).await
}

/// Write the skeleton configuration. Needs no settings or cache.
pub fn write_skeleton(out: &mut impl Write) -> Result<()> {
  out.write_all(SKELETON.as_bytes())?;
  Ok(())
}

/// Run a command, building the contacts service only if a sync is needed.
///
/// `skel` goes through [`write_skeleton`] before settings exist; here it only
/// refreshes a stale cache like every other command.
pub async fn execute<S, F>(
  command: &Command,
  settings: &Settings,
  service: F,
  out: &mut impl Write,
) -> Result<()>
where
  S: ContactsService,
  F: FnOnce() -> Result<S>,
{
  let mut cache = ContactsCache::load(&settings.cache_file_path, settings.auto_check)?;
  debug!(
    path = %cache.path().display(),
    contacts = cache.len(),
    lifespan_days = cache.lifespan_days(),
    "Loaded contacts cache"
  );

  if *command == Command::Reload {
    info!("Clearing contacts cache");
    cache.clear();
  }

  if command.forces_sync() || cache.is_stale() {
    let engine =
      SyncEngine::new(service()?, settings.credentials()?).with_fetch_size(settings.fetch_size);
    engine.update_cache(&mut cache).await?;
  }

  if let Command::Search { query, literal } = command {
    let results = if *literal {
      cache.search_with(query.as_deref(), SearchMode::Literal)?
    } else {
      cache.search(query.as_deref())?
    };
    write_results(out, &results)?;
  }

  Ok(())
}

/// Print results in mutt's query format.
///
/// mutt skips the first line of query output, so it is left blank; then one
/// `email<TAB>name` line per result.
pub fn write_results(out: &mut impl Write, results: &[Address]) -> Result<()> {
  writeln!(out)?;
  for address in results {
    writeln!(out, "{}\t{}", address.email, address.name)?;
  }
  Ok(())
}
