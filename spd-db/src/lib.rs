//! SQLite-backed stand-in for the plant/report service.
//!
//! Plants and computed report rows live in a SQLite database (in memory by
//! default, or a file for state that survives between runs). Report rows
//! only exist for days a recompute has covered, so a fresh plant reports
//! nothing until someone asks for a recompute, just like the real service.
//!
//! ```rust
//! use spd_db::Database;
//!
//! let db = Database::new().unwrap();
//! db.seed_demo_plants().unwrap();
//! let page = db.query_plants(5, 0, Some("alpha")).unwrap();
//! assert_eq!(page.items[0].name, "Solar Plant Alpha");
//! ```

mod backend;
mod loader;
pub mod models;
mod queries;
pub mod schema;

pub use loader::DEMO_PLANT_NAMES;

use rusqlite::Connection;
use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

/// Shared handle to the mock service database. Cheap to clone; clones see
/// the same connection.
#[derive(Clone)]
pub struct Database {
    conn: Rc<RefCell<Connection>>,
}

impl Database {
    /// An empty in-memory database with the schema applied.
    pub fn new() -> anyhow::Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    /// Open (or create) a database file.
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        log::info!("[SPD] db: opening {}", path.display());
        Self::from_connection(Connection::open(path)?)
    }

    fn from_connection(conn: Connection) -> anyhow::Result<Self> {
        conn.execute_batch(schema::create_schema())?;
        Ok(Self {
            conn: Rc::new(RefCell::new(conn)),
        })
    }
}
