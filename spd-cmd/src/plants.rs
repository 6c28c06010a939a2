//! `plants` subcommands.

use crate::output::render_table;
use crate::PlantCommand;
use anyhow::{anyhow, bail};
use spd_core::api::{ApiError, Backend};
use spd_core::plant::Plant;
use spd_data::sort::{Column, SortState};
use spd_db::Database;
use spd_monitor::config::Timings;
use spd_monitor::notify::LogNotifier;
use spd_monitor::plants::{PlantList, PlantService, PLANT_SEARCH_FIELDS};
use spd_monitor::table::DataTable;

pub fn plant_columns() -> Vec<Column> {
    vec![Column::new("name", "Name"), Column::new("uid", "ID")]
}

fn api_error(e: ApiError) -> anyhow::Error {
    anyhow!("{}", e.message())
}

fn print_plant(plant: &Plant) {
    println!("{}\t{}", plant.uid, plant.name);
}

/// Render the list's current page the way a server-paged table shows it.
pub fn render_plant_page<B: Backend>(list: &PlantList<B, LogNotifier>) -> String {
    let mut table = DataTable::new(
        plant_columns(),
        &PLANT_SEARCH_FIELDS,
        list.plants().len().max(1),
        Timings::default().search_debounce,
    )
    .server_side(list.table_totals());
    table.set_items(list.plants().to_vec());
    table.set_controlled(list.controlled());
    render_table(table.columns(), &table.view())
}

/// Build the plant list `plants list` asks for.
pub async fn list_plants<B: Backend>(
    backend: B,
    page_size: usize,
    page: usize,
    search: Option<&str>,
    sort: Option<SortState>,
) -> anyhow::Result<PlantList<B, LogNotifier>> {
    let mut list = PlantList::new(backend, LogNotifier::default(), page_size);
    match search {
        Some(term) => list.change_search(term).await,
        None => list.refresh().await,
    }
    if let Some(sort) = sort {
        list.change_sort(sort).await;
    }
    if let Some(error) = list.error() {
        bail!("Failed to load plants: {}", error);
    }
    if page != list.current_page() && !list.change_page(page).await {
        bail!("Page {} is out of range (1 to {})", page, list.total_pages());
    }
    Ok(list)
}

pub async fn run_plants<B: Backend>(backend: B, page_size: usize, action: PlantCommand) -> anyhow::Result<()> {
    match action {
        PlantCommand::List {
            page,
            search,
            sort,
            desc,
        } => {
            let sort = match sort {
                Some(key) if PLANT_SEARCH_FIELDS.contains(&key.as_str()) => Some(if desc {
                    SortState::descending(key)
                } else {
                    SortState::ascending(key)
                }),
                Some(key) => bail!("Cannot sort plants by {:?}", key),
                None => None,
            };
            let list = list_plants(backend, page_size, page, search.as_deref(), sort).await?;
            print!("{}", render_plant_page(&list));
        }
        PlantCommand::Show { uid } => {
            let plant = PlantService::new(backend)
                .get(&uid)
                .await
                .map_err(api_error)?;
            print_plant(&plant);
        }
        PlantCommand::Create { name } => {
            let mut list = PlantList::new(backend, LogNotifier::default(), page_size);
            let plant = list.create(&name).await.map_err(api_error)?;
            print_plant(&plant);
        }
        PlantCommand::Rename { uid, name } => {
            let mut list = PlantList::new(backend, LogNotifier::default(), page_size);
            let plant = list.rename(&uid, &name).await.map_err(api_error)?;
            print_plant(&plant);
        }
        PlantCommand::Delete { uid } => {
            let mut list = PlantList::new(backend, LogNotifier::default(), page_size);
            list.delete(&uid).await.map_err(api_error)?;
            println!("Deleted {}", uid);
        }
    }
    Ok(())
}

/// Print how much report history the mock database holds for `uid`.
pub fn print_coverage(db: &Database, uid: &str) -> anyhow::Result<()> {
    let coverage = db.query_coverage(uid)?;
    match (&coverage.first_day, &coverage.last_day) {
        (Some(first), Some(last)) => println!("{} report days ({} to {})", coverage.days, first, last),
        _ => println!("No report days stored"),
    }
    Ok(())
}
