//! Port traits that adapters implement.

pub mod config_port;
