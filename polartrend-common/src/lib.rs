//! # Polartrend Common Library
//!
//! Shared code for the polartrend trend-tracking backend:
//! - Database schema, initialization and row models
//! - Trend classification (maturity stage, accuracy status)
//! - Text similarity scoring
//! - Session token and password primitives
//! - Configuration loading

pub mod auth;
pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod similarity;
pub mod slug;

pub use classify::{AccuracyStatus, MaturityStage};
pub use error::{Error, Result};
