//! # cinelog-store
//!
//! Persistence layer for the cinelog catalog, backed by SQLite.
//!
//! The crate exposes a synchronous [`Database`] handle that wraps a
//! `rusqlite::Connection` and provides typed CRUD helpers for the three
//! domain models: users, movies, and reviews. Schema migrations run
//! automatically when the database is opened.

pub mod database;
pub mod migrations;
pub mod models;
pub mod movies;
pub mod reviews;
pub mod users;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;
