//! Stateful controllers behind the dashboard and the plant list.
//!
//! All state lives on one thread. Controllers share it through `Rc` and
//! `RefCell`, and timers run as local tasks, so everything here must be
//! driven from inside a [`tokio::task::LocalSet`] on a current-thread
//! runtime. No `RefCell` borrow is ever held across an `.await`.

pub mod cache;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod notify;
pub mod plants;
pub mod table;
pub mod timer;

#[cfg(test)]
mod test_support;
