use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use evcal::calendar::{Calendar, today};
use evcal::config::Config;
use evcal::markup::{Node, el};
use evcal::model::{CalendarRequest, EventRecord};
use evcal::shortcode::{Asset, ShortcodeRegistry, register_calendar};
use evcal::source::EventSource;
use evcal::storage::LocalStorage;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "evcal-html", version, about = "Render month event calendars as HTML")]
struct Cli {
    /// Config file; defaults to $EVCAL_CONFIG or the user config dir.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the calendar markup for one month.
    Render {
        /// Month name ("January") or number ("01"); defaults to this month.
        month: Option<String>,
        /// Four digit year; defaults to this year.
        year: Option<String>,
    },
    /// Expand [ecv_calendar] shortcodes in a template ("-" reads stdin).
    Expand {
        template: PathBuf,
        /// Prepend the configured stylesheet and script tags.
        #[arg(long)]
        assets: bool,
    },
    /// Add the VEVENTs of an .ics file to the local event store.
    Import { ics: PathBuf },
}

fn load_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(p) => Config::load_from(p),
        None => Config::load_or_default(),
    }
}

fn asset_tag(asset: &Asset) -> Result<String> {
    let node = match asset {
        Asset::Stylesheet(href) => el("link")
            .attr("rel", "stylesheet")
            .attr("href", href.as_str()),
        Asset::Script(src) => el("script").attr("src", src.as_str()),
    };
    Ok(Node::from(node).to_html()?)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Render { month, year } => {
            let today = today(config.zone()?);
            let request = CalendarRequest::from_input(month.as_deref(), year.as_deref(), today)?;
            let source = config.event_source()?;
            let calendar = Calendar::load(request, source.as_ref()).await?;
            println!("{}", calendar.to_html()?);
        }
        Command::Expand { template, assets } => {
            let mut text = String::new();
            if template.as_os_str() == "-" {
                std::io::stdin().read_to_string(&mut text)?;
            } else {
                text = std::fs::read_to_string(&template)
                    .with_context(|| format!("reading {}", template.display()))?;
            }

            let source: Arc<dyn EventSource> = Arc::from(config.event_source()?);
            let mut registry = ShortcodeRegistry::new();
            register_calendar(&mut registry, source, &config)?;

            let page = registry.expand(&text).await?;
            if assets {
                for asset in registry.assets() {
                    println!("{}", asset_tag(asset)?);
                }
            }
            print!("{}", page);
        }
        Command::Import { ics } => {
            let path = config
                .events_file
                .clone()
                .or_else(LocalStorage::default_path)
                .context("no event store configured")?;
            let storage = LocalStorage::new(path);

            let raw = std::fs::read_to_string(&ics)
                .with_context(|| format!("reading {}", ics.display()))?;
            let imported = EventRecord::from_ics(&raw, config.zone()?)
                .map_err(|e| anyhow::anyhow!("{}: {}", ics.display(), e))?;

            let mut events = storage.load()?;
            let before = events.len();
            events.retain(|e| !imported.iter().any(|i| i.id == e.id));
            let replaced = before - events.len();
            events.extend(imported.iter().cloned());
            storage.save(&events)?;
            info!(
                store = %storage.path().display(),
                added = imported.len() - replaced.min(imported.len()),
                replaced,
                "imported events"
            );
        }
    }
    Ok(())
}
