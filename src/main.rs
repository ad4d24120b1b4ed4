mod cache;
mod commands;
mod config;
mod gdata;
mod sync;

use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use commands::Command;
use config::{Config, Overrides, Settings};

#[derive(Parser, Debug)]
#[command(name = "addrsync")]
#[command(about = "Keeps an offline copy of your contacts for mail client address completion")]
#[command(version)]
struct Args {
  /// Path to config file (default: ./addrsync.yaml or $XDG_CONFIG_HOME/addrsync/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Days before the cache is refreshed automatically (0 disables)
  #[arg(short, long, allow_negative_numbers = true)]
  auto_check: Option<i64>,

  /// Account login
  #[arg(short, long)]
  login: Option<String>,

  /// Account password
  #[arg(short, long)]
  password: Option<String>,

  /// Contacts cache file
  #[arg(long)]
  cache_file: Option<PathBuf>,

  /// Contacts requested per page while syncing
  #[arg(long)]
  fetch_size: Option<usize>,

  /// More logging (-v info, -vv debug)
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,

  #[command(subcommand)]
  command: Command,
}

impl Args {
  fn overrides(&self) -> Overrides {
    Overrides {
      login: self.login.clone(),
      password: self.password.clone(),
      cache_file_path: self.cache_file.clone(),
      auto_check: self.auto_check,
      fetch_size: self.fetch_size,
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  let mut stdout = std::io::stdout().lock();

  // skel must work before any config exists
  if args.command == Command::Skel {
    return commands::write_skeleton(&mut stdout);
  }

  let config = Config::load(args.config.as_deref())?;
  let settings = Settings::resolve(config, args.overrides(), Config::get_password())?;

  let _guard = init_logging(args.verbose, settings.log_file.as_deref())?;

  commands::run(&args.command, &settings, &mut stdout).await
}

/// Log to stderr, or to `log_file` when one is configured.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
  let default_level = match verbose {
    0 => "addrsync=warn",
    1 => "addrsync=info",
    _ => "addrsync=debug",
  };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into());

  match log_file {
    None => {
      tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
      Ok(None)
    }
    Some(path) => {
      let dir = path.parent().filter(|d| !d.as_os_str().is_empty()).unwrap_or(Path::new("."));
      let name = path
        .file_name()
        .ok_or_else(|| eyre!("Invalid log file path: {}", path.display()))?;
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

      let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
      tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(writer).with_ansi(false))
        .init();
      Ok(Some(guard))
    }
  }
}
