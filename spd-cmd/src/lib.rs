//! Command implementations for the SPD CLI.
//!
//! Provides subcommands for managing plants and reading or recomputing
//! their daily reports, against the REST service or a local SQLite mock.

use anyhow::Context;
use clap::{Args, Subcommand};
use spd_core::api::Backend;
use spd_core::http::{HttpBackend, DEFAULT_API_URL, DEFAULT_MAX_TRIES};
use spd_db::Database;
use spd_monitor::config::DEFAULT_PAGE_SIZE;
use std::path::{Path, PathBuf};

pub mod output;
pub mod plants;
pub mod report;

/// Where plants and reports come from.
#[derive(Args, Debug, Clone)]
pub struct BackendArgs {
    /// Base URL of the plant/report service
    #[arg(long, global = true, conflicts_with = "mock_db")]
    pub api_url: Option<String>,

    /// The service filters plant listings by `search` itself
    #[arg(long, global = true)]
    pub native_search: bool,

    /// Attempts per service read before giving up
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_TRIES)]
    pub max_tries: u32,

    /// Use a SQLite file as the backend (created and seeded if missing)
    #[arg(long, global = true)]
    pub mock_db: Option<String>,

    /// Import `plants.csv` and `datapoints.csv` from this directory into the mock
    #[arg(long, global = true, conflicts_with = "api_url")]
    pub fixtures: Option<PathBuf>,

    /// Rows per table page
    #[arg(long, global = true, default_value_t = DEFAULT_PAGE_SIZE)]
    pub page_size: usize,
}

impl Default for BackendArgs {
    fn default() -> Self {
        Self {
            api_url: None,
            native_search: false,
            max_tries: DEFAULT_MAX_TRIES,
            mock_db: None,
            fixtures: None,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Date range of a report. `--month` wins over `--from`/`--to`; with
/// nothing given the range is the current month up to today.
#[derive(Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// First day (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Last day (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// A whole calendar month (YYYY-MM)
    #[arg(long, conflicts_with_all = ["from", "to"])]
    pub month: Option<String>,
}

#[derive(Subcommand)]
pub enum PlantCommand {
    /// List plants one page at a time
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Case-insensitive match on name or id
        #[arg(short, long)]
        search: Option<String>,

        /// Sort the page by `name` or `uid`
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,
    },

    /// Show one plant
    Show { uid: String },

    /// Create a plant
    Create { name: String },

    /// Rename a plant
    Rename { uid: String, name: String },

    /// Delete a plant
    Delete { uid: String },
}

#[derive(Subcommand)]
pub enum Command {
    /// Manage plants
    Plants {
        #[command(subcommand)]
        action: PlantCommand,
    },

    /// Fetch and print a plant's daily report
    Report {
        /// Plant id or exact name
        plant: String,

        #[command(flatten)]
        range: RangeArgs,

        /// Only rows containing this text in any column
        #[arg(short, long)]
        search: Option<String>,

        /// Column to sort by
        #[arg(long)]
        sort: Option<String>,

        /// Sort descending
        #[arg(long, requires = "sort")]
        desc: bool,

        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Also write every row in the range to this CSV file
        #[arg(long)]
        csv: Option<String>,

        /// Print the energy and irradiation chart series as JSON
        #[arg(long)]
        chart: bool,
    },

    /// Recompute a plant's report for a range, then fetch it
    Update {
        /// Plant id or exact name
        plant: String,

        #[command(flatten)]
        range: RangeArgs,
    },
}

pub async fn run(args: BackendArgs, command: Command) -> anyhow::Result<()> {
    if let Some(url) = &args.api_url {
        let backend = HttpBackend::new(url)?
            .with_native_search(args.native_search)
            .with_max_tries(args.max_tries);
        log::info!("[SPD] backend: {}", url);
        return run_with(backend, args.page_size, command).await;
    }
    let db = match &args.mock_db {
        Some(path) => Database::open(path)?,
        None => {
            log::info!("[SPD] backend: in-memory mock (set --api-url, e.g. {})", DEFAULT_API_URL);
            Database::new()?
        }
    };
    prepare_mock(&db, args.fixtures.as_deref())?;
    let show_uid = match &command {
        Command::Plants {
            action: PlantCommand::Show { uid },
        } => Some(uid.clone()),
        _ => None,
    };
    run_with(db.clone(), args.page_size, command).await?;
    if let Some(uid) = show_uid {
        plants::print_coverage(&db, &uid)?;
    }
    Ok(())
}

/// Import whichever fixture files `fixtures` holds, then seed the demo
/// plants if the mock still has none.
pub fn prepare_mock(db: &Database, fixtures: Option<&Path>) -> anyhow::Result<()> {
    if let Some(dir) = fixtures {
        let plants = dir.join("plants.csv");
        if plants.exists() {
            let data = std::fs::read_to_string(&plants)
                .with_context(|| format!("Failed to read {}", plants.display()))?;
            db.load_plants(&data)?;
        }
        let datapoints = dir.join("datapoints.csv");
        if datapoints.exists() {
            let data = std::fs::read_to_string(&datapoints)
                .with_context(|| format!("Failed to read {}", datapoints.display()))?;
            db.load_datapoints(&data)?;
        }
        if !plants.exists() && !datapoints.exists() {
            log::warn!("[SPD] fixtures: nothing to import from {}", dir.display());
        }
    }
    db.seed_demo_plants()?;
    Ok(())
}

/// Run `command` against an already opened backend.
pub async fn run_with<B: Backend + 'static>(
    backend: B,
    page_size: usize,
    command: Command,
) -> anyhow::Result<()> {
    match command {
        Command::Plants { action } => plants::run_plants(backend, page_size, action).await,
        Command::Report {
            plant,
            range,
            search,
            sort,
            desc,
            page,
            csv,
            chart,
        } => {
            let options = report::ReportOptions {
                search,
                sort,
                desc,
                page,
                page_size,
                csv,
                chart,
            };
            report::run_report(backend, &plant, &range, &options).await
        }
        Command::Update { plant, range } => report::run_update(backend, &plant, &range).await,
    }
}
