pub mod auth;
pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod inventory;
pub mod io;
pub mod kitchen;
pub mod paths;
pub mod permissions;
pub mod types;
pub mod users;
pub mod verticals;
pub mod workflow;

pub use error::{PosError, Result};
