//! Core types and backend contract for the solar plant dashboard.
//!
//! - `plant` / `report`: the two backend entities
//! - `selection`: the dashboard's date range selection
//! - `dates` / `date_range`: month chunking and "never past today" rules
//! - `api`: the backend contract every data source implements
//! - `http` (feature `api`): REST client for the real backend

pub mod api;
pub mod date_range;
pub mod dates;
#[cfg(feature = "api")]
pub mod http;
pub mod plant;
pub mod report;
pub mod selection;
