pub mod config;
pub mod dashboard;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;

pub use error::{ProjectError, Result, ValidationErrors};
