use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

use trailfeed::config::Config;
use trailfeed::feed::{
    Category, CategoryFilter, Completion, FeedDriver, FeedItem, FeedProfile, FeedSession,
    FeedSource, FixtureSource, GeneratedSource, LoadingState, ScrollPosition, SortCriterion,
    COMMUNITY_DEFAULT_TAB, COMMUNITY_TABS,
};
use trailfeed::util::{fit_to_width, now_ms, relative_label, sanitize_line};

/// Height of one card in scroll units.
const CARD_HEIGHT: f64 = 320.0;
/// Height of the simulated viewport in scroll units.
const VIEWPORT_HEIGHT: f64 = 800.0;

/// Get the config directory path (~/.config/trailfeed/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("trailfeed"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Screen {
    Explore,
    Community,
}

#[derive(Parser, Debug)]
#[command(
    name = "trailfeed",
    about = "Simulate a route discovery feed: scroll, paginate, filter and sort"
)]
struct Args {
    /// Config file (defaults to ~/.config/trailfeed/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Which feed screen to simulate
    #[arg(long, value_enum, default_value_t = Screen::Explore)]
    screen: Screen,

    /// Category tag (explore) or tab id (community)
    #[arg(long)]
    category: Option<String>,

    /// Sort order: latest, rating or distance
    #[arg(long, default_value_t = SortCriterion::Latest)]
    sort: SortCriterion,

    /// Page through a JSON fixture instead of generated routes
    #[arg(long, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Seed for generated routes
    #[arg(long, default_value_t = 7)]
    rng_seed: u64,

    /// Number of scroll-to-bottom events to simulate
    #[arg(long, default_value_t = 3)]
    scrolls: usize,

    /// Skip the simulated fetch latency
    #[arg(long)]
    no_latency: bool,

    /// Print the display list as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct DisplayOutput<'a> {
    category: String,
    sort: SortCriterion,
    sort_label: &'static str,
    is_loading: bool,
    has_more: bool,
    error: Option<String>,
    items: Vec<&'a FeedItem>,
}

fn resolve_filter(args: &Args, config: &Config) -> CategoryFilter {
    match args.screen {
        Screen::Explore => args
            .category
            .as_deref()
            .map(|label| config.category_filter(label))
            .unwrap_or_default(),
        Screen::Community => {
            let tab = args.category.as_deref().unwrap_or(COMMUNITY_DEFAULT_TAB);
            if !COMMUNITY_TABS.iter().any(|(id, _)| *id == tab) {
                tracing::warn!(tab = %tab, "Unknown community tab, using it as a category");
            }
            CategoryFilter::Only(Category::from(tab))
        }
    }
}

fn build_source(
    args: &Args,
    config: &Config,
    profile: &FeedProfile,
    now: i64,
) -> Result<Arc<dyn FeedSource>> {
    if let Some(path) = &args.fixture {
        let source = FixtureSource::load(path, profile.page_size)
            .with_context(|| format!("Failed to load fixture: {}", path.display()))?
            .with_latency(profile.fetch_latency());
        return Ok(Arc::new(source));
    }

    let source = match args.screen {
        Screen::Explore => GeneratedSource::explore(
            profile,
            config.concrete_categories(),
            args.rng_seed,
            now,
        ),
        Screen::Community => GeneratedSource::community(profile, args.rng_seed, now),
    };
    Ok(Arc::new(source))
}

/// Scroll geometry with the viewport pinned to the bottom of the list.
fn bottom_of(item_count: usize) -> ScrollPosition {
    let content = item_count as f64 * CARD_HEIGHT;
    let offset = (content - VIEWPORT_HEIGHT).max(0.0);
    ScrollPosition::new(offset, VIEWPORT_HEIGHT, content)
}

fn category_label(filter: &CategoryFilter, config: &Config) -> String {
    match filter {
        CategoryFilter::All => config.all_label.clone(),
        CategoryFilter::Only(category) => COMMUNITY_TABS
            .iter()
            .find(|(id, _)| *id == category.as_str())
            .map(|(_, label)| label.to_string())
            .unwrap_or_else(|| category.to_string()),
    }
}

fn print_table(driver: &FeedDriver, config: &Config, now: i64) {
    let session = driver.session();
    let list = driver.display_list();
    let state = driver.loading_state();

    println!(
        "{} · {} · {} routes",
        category_label(session.category(), config),
        session.sort_criterion().label(),
        list.len()
    );
    println!(
        "{} {} {} {} {}",
        fit_to_width("Title", 30),
        fit_to_width("Category", 10),
        fit_to_width("Rating", 6),
        fit_to_width("Dist", 8),
        "Published"
    );
    for item in &list {
        println!(
            "{} {} {} {} {}",
            fit_to_width(&sanitize_line(&item.title), 30),
            fit_to_width(&sanitize_line(item.category.as_str()), 10),
            fit_to_width(&format!("{:.1}", item.rating), 6),
            fit_to_width(&sanitize_line(item.distance.label()), 8),
            relative_label(now, item.timestamp)
        );
    }
    print_footer(&state);
}

fn print_footer(state: &LoadingState) {
    if let Some(error) = &state.error {
        println!("加载失败: {error}");
    }
    if state.is_loading {
        println!("正在探索更多路线...");
    } else if !state.has_more {
        println!("已经看到尽头啦");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config_path = match &args.config {
        Some(path) => path.clone(),
        None => get_config_dir()?.join("config.toml"),
    };
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config: {}", config_path.display()))?;

    let mut profile = match args.screen {
        Screen::Explore => config.explore_profile(),
        Screen::Community => config.community_profile(),
    };
    if args.no_latency {
        profile.fetch_latency_ms = 0;
    }

    let now = now_ms();
    let filter = resolve_filter(&args, &config);
    let source = build_source(&args, &config, &profile, now)?;
    let session = FeedSession::with_seed_cache(
        source,
        &profile,
        filter,
        args.sort,
        config.seed_cache_capacity(),
    );
    let mut driver = FeedDriver::new(session, profile.fetch_timeout());

    for step in 1..=args.scrolls {
        let position = bottom_of(driver.display_list().len());
        if !driver.notify_scroll_position(position) {
            tracing::info!(step, "Scroll event ignored (loading, exhausted or far from end)");
            continue;
        }
        match driver.settle().await {
            Some(Completion::Applied { added, has_more, .. }) => {
                tracing::info!(step, added, has_more, "Loaded more routes");
            }
            Some(Completion::Failed(error)) => {
                tracing::warn!(step, error = %error, "Loading more routes failed");
            }
            Some(Completion::Stale) | None => {}
        }
    }

    if args.json {
        let session = driver.session();
        let state = driver.loading_state();
        let output = DisplayOutput {
            category: category_label(session.category(), &config),
            sort: session.sort_criterion(),
            sort_label: session.sort_criterion().label(),
            is_loading: state.is_loading,
            has_more: state.has_more,
            error: state.error.as_ref().map(|e| e.to_string()),
            items: driver.display_list(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&output).context("Failed to serialize display list")?
        );
    } else {
        print_table(&driver, &config, now);
    }

    driver.end();
    Ok(())
}
