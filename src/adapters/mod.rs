//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_export;
pub mod file_config_adapter;
pub mod json_report;
pub mod text_report;

#[cfg(test)]
mod fixtures;
