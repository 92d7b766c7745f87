pub mod ack;
pub mod action;
pub mod config;
pub mod definition;
pub mod error;
pub mod io;
pub mod params;
pub mod paths;
pub mod store;
pub mod types;
pub mod watch;

pub use error::{Result, WatcherError};
