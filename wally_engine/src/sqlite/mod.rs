//! SQLite database module for the Wally wallet engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
