pub mod audit;
pub mod blog;
pub mod config;
pub mod error;
pub mod html;
pub mod identity;
pub mod models;
pub mod store;
pub mod web;
pub mod widgets;

pub use config::Config;
pub use error::{Error, Result};
