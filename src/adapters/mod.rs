//! Concrete adapters: configuration files and price sources.

pub mod alpha_vantage;
pub mod csv_adapter;
pub mod file_config_adapter;
