//! List processing for the plant and report tables.
//!
//! Everything here is a pure function of its inputs, safe to call on every
//! render:
//! - `record`: field access by column key
//! - `list`: search filter, stable sort, pagination
//! - `sort`: click-to-sort cycle over declared columns
//! - `view`: client-side vs. server-side table views
//! - `chart`: energy and irradiation line series

pub mod chart;
pub mod list;
pub mod record;
pub mod sort;
pub mod view;
