//! Session-scoped telemetry recording.
//!
//! A [`TelemetryStore`] buffers one logging session in memory as named
//! columns of scalar [`Cell`]s. Columns appear in the file in the order they
//! were first declared or appended. Nothing touches disk until the session
//! is closed and [`save_session`] writes the whole store as one CSV file.

#![deny(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)]

pub mod table;
pub mod file;
pub mod schema;
pub mod store;

pub use table::{CsvTable, read_csv, write_csv};
pub use file::{SESSION_FILE_PREFIX, save_session, session_file_name, unique_session_path};
pub use schema::TelemetrySchema;
pub use store::{Cell, TelemetryStore};
