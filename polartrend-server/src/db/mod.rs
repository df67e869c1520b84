//! Per-table database operations

pub mod candidates;
pub mod history;
pub mod mentions;
pub mod settings;
pub mod similar;
pub mod trends;
pub mod users;
