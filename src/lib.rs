//! Notebook jobs: client-side core for scheduling notebook runs against a
//! notebook server's scheduler API.

pub mod api;
pub mod config;
pub mod environments;
pub mod error;
pub mod form;
pub mod listing;
pub mod models;
pub mod schedule;
