//! FileStamp library
//!
//! Catalogs a directory tree and edits the four filesystem timestamps of
//! individual files. The catalog and timestamp modules are exported for
//! use in tests.

pub mod app;
pub mod catalog;
pub mod config;
pub mod constant;
pub mod stamp_backend;
pub mod stamp_record;
pub mod style;
pub mod ui;
