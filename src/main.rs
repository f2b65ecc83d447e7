use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use podcat::admin::AdminEditController;
use podcat::backend::HttpBackend;
use podcat::browse::PublicCatalog;
use podcat::config::{Config, Settings};
use podcat::constants::constants;
use podcat::episode::EpisodeId;
use podcat::publication::PublicationController;
use podcat::query::SeasonFilter;
use podcat::{logging, output};

// --- CLI ---

#[derive(Parser, Debug)]
#[command(author, version = env!("CARGO_PKG_VERSION"), about, long_about = None)]
struct Args {
  /// Backend base URL (overrides saved preferences)
  #[arg(long, global = true, env = "PODCAT_API_BASE")]
  api_base: Option<String>,

  /// Episodes per page in the public catalog
  #[arg(long, global = true)]
  page_size: Option<usize>,

  /// Log at debug level (PODCAT_LOG takes precedence)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Browse the published catalog
  Episodes {
    /// Free-text search over title and description
    #[arg(short, long, default_value = "")]
    search: String,
    /// Season number, or 'all'
    #[arg(long, default_value = "all")]
    season: SeasonFilter,
    /// Page to show (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: usize,
  },
  /// List the seasons present in the published catalog
  Seasons,
  /// Show a published episode by its public number
  Show { number: u32 },
  /// Editing and publication tools
  Admin {
    #[command(subcommand)]
    action: AdminCommand,
  },
  /// Inspect or change saved preferences
  Config {
    #[command(subcommand)]
    action: ConfigCommand,
  },
  /// Print shell completions
  Completions { shell: clap_complete::Shell },
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
  /// List every episode, published or not
  List,
  /// Show one episode by storage id
  Show { id: String },
  /// Change title, description or publication state of one episode
  Edit {
    id: String,
    #[arg(long)]
    title: Option<String>,
    /// New HTML description
    #[arg(long, conflicts_with = "description_file")]
    description: Option<String>,
    /// Read the HTML description from a file
    #[arg(long)]
    description_file: Option<PathBuf>,
    #[arg(long, conflicts_with = "unpublish")]
    publish: bool,
    #[arg(long)]
    unpublish: bool,
  },
  /// Publish every episode
  PublishAll,
  /// Unpublish every episode
  UnpublishAll,
  /// Import new episodes from the RSS feed
  Sync,
  /// Catalog overview
  Stats,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
  /// Print effective settings
  Show,
  /// Save a preference
  Set { key: ConfigKey, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ConfigKey {
  ApiBase,
  PageSize,
}

// --- Main ---

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
  let args = Args::parse();
  let _log_guard = logging::init(args.verbose);

  let prefs = Config::load();
  let settings = prefs.resolve(args.api_base.clone(), args.page_size);
  info!(api_base = %settings.api_base, page_size = settings.page_size, "podcat starting");

  match args.command {
    Command::Episodes { search, season, page } => list_episodes(&settings, &search, season, page).await,
    Command::Seasons => list_seasons(&settings).await,
    Command::Show { number } => show_episode(&settings, number).await,
    Command::Admin { action } => run_admin(&settings, action).await,
    Command::Config { action } => run_config(prefs, &settings, action),
    Command::Completions { shell } => {
      clap_complete::generate(shell, &mut Args::command(), "podcat", &mut std::io::stdout());
      Ok(())
    }
  }
}

fn connect(settings: &Settings) -> Result<HttpBackend> {
  HttpBackend::new(&settings.api_base, Duration::from_secs(constants().http_timeout_secs))
}

// --- Public catalog ---

async fn list_episodes(settings: &Settings, search: &str, season: SeasonFilter, page: usize) -> Result<()> {
  let backend = connect(settings)?;
  let mut catalog = PublicCatalog::new(&backend, settings.page_size);
  catalog.refresh().await.context("Failed to load published episodes")?;
  catalog.set_search(search);
  catalog.set_season(season);
  catalog.set_page(page);

  let view = catalog.current_page();
  if view.page == 0 || view.page > view.total_pages {
    bail!("Page {} is out of range (1-{})", view.page, view.total_pages);
  }
  print!("{}", output::render_page(&view, catalog.search(), catalog.season()));
  Ok(())
}

async fn list_seasons(settings: &Settings) -> Result<()> {
  let backend = connect(settings)?;
  let mut catalog = PublicCatalog::new(&backend, settings.page_size);
  catalog.refresh().await.context("Failed to load published episodes")?;
  print!("{}", output::render_seasons(&catalog.index.seasons));
  Ok(())
}

async fn show_episode(settings: &Settings, number: u32) -> Result<()> {
  let backend = connect(settings)?;
  let catalog = PublicCatalog::new(&backend, settings.page_size);
  let ep = catalog.fetch_by_number(number).await.with_context(|| format!("Failed to load episode #{}", number))?;
  let download = backend.download_url(&ep.id);
  print!("{}", output::render_episode(&ep, Some(download.as_str())));
  Ok(())
}

// --- Admin ---

async fn run_admin(settings: &Settings, action: AdminCommand) -> Result<()> {
  let backend = connect(settings)?;

  match action {
    AdminCommand::List => {
      let mut ctl = PublicationController::new(&backend);
      ctl.refresh().await.context("Failed to load episodes")?;
      print!("{}", output::render_admin_table(&ctl.episodes));
      for issue in &ctl.index.issues {
        eprintln!("warning: {}", issue);
      }
    }
    AdminCommand::Show { id } => {
      let mut ctl = AdminEditController::new(&backend);
      let ep = ctl.load(&EpisodeId(id.clone())).await.with_context(|| format!("Failed to load episode {}", id))?;
      print!("{}", output::render_admin_episode(ep));
    }
    AdminCommand::Edit { id, title, description, description_file, publish, unpublish } => {
      let description = match description_file {
        Some(path) => Some(
          std::fs::read_to_string(&path).with_context(|| format!("Failed to read description from {}", path.display()))?,
        ),
        None => description,
      };
      let published = match (publish, unpublish) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
      };
      if title.is_none() && description.is_none() && published.is_none() {
        bail!("Nothing to change: pass --title, --description, --description-file, --publish or --unpublish");
      }

      let id = EpisodeId(id);
      let mut ctl = AdminEditController::new(&backend);
      ctl.load(&id).await.with_context(|| format!("Failed to load episode {}", id))?;
      if let Some(t) = title {
        ctl.form.title = t;
      }
      if let Some(d) = description {
        ctl.form.description = d;
      }
      if let Some(p) = published {
        ctl.form.published = p;
      }
      let saved = ctl.save_form().await.with_context(|| format!("Failed to save episode {}", id))?;
      if let Some(msg) = &ctl.info_message {
        println!("{}", msg);
      }
      print!("{}", output::render_admin_episode(&saved));
    }
    AdminCommand::PublishAll => set_all_published(&backend, true).await?,
    AdminCommand::UnpublishAll => set_all_published(&backend, false).await?,
    AdminCommand::Sync => {
      let mut ctl = PublicationController::new(&backend);
      let result = ctl.sync_feed().await;
      // The sync may have gone through even if the follow-up refresh failed.
      if let Some(msg) = &ctl.info_message {
        println!("{}", msg);
      }
      result.context("Feed sync failed")?;
      print!("{}", output::render_admin_table(&ctl.episodes));
    }
    AdminCommand::Stats => {
      let mut ctl = PublicationController::new(&backend);
      let stats = ctl.stats().await.context("Failed to load catalog stats")?;
      print!("{}", output::render_stats(&stats));
    }
  }
  Ok(())
}

async fn set_all_published(backend: &HttpBackend, publish: bool) -> Result<()> {
  let mut ctl = PublicationController::new(backend);
  let result = if publish { ctl.publish_all().await } else { ctl.unpublish_all().await };
  // info_message is set only once the change is applied; a failed follow-up refresh is reported as such.
  if let Some(msg) = &ctl.info_message {
    println!("{}", msg);
  }
  result.context(if ctl.info_message.is_some() {
    "Failed to reload episodes after the publication change"
  } else {
    "Bulk publication change failed"
  })?;
  println!("{} of {} episodes published.", ctl.published_count(), ctl.episodes.len());
  Ok(())
}

// --- Preferences ---

fn run_config(mut prefs: Config, settings: &Settings, action: ConfigCommand) -> Result<()> {
  match action {
    ConfigCommand::Show => {
      println!("api_base  = {}", settings.api_base);
      println!("page_size = {}", settings.page_size);
      match Config::path() {
        Some(p) => println!("file      = {}", p.display()),
        None => println!("file      = (none)"),
      }
    }
    ConfigCommand::Set { key, value } => {
      match key {
        ConfigKey::ApiBase => {
          HttpBackend::new(&value, Duration::from_secs(1))?;
          prefs.api_base = Some(value);
        }
        ConfigKey::PageSize => {
          let n: usize = value.parse().with_context(|| format!("Invalid page size '{}'", value))?;
          if n == 0 {
            bail!("Page size must be at least 1");
          }
          prefs.page_size = Some(n);
        }
      }
      let path = prefs.save()?;
      println!("Saved {}", path.display());
    }
  }
  Ok(())
}
