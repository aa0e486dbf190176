//! Owner-scoped, versioned document storage.

pub mod db;

pub use db::{DbHandle, PrdDb};
