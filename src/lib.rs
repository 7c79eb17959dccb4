pub mod config;
pub mod counter;
pub mod error;
pub mod handler;
pub mod model;
pub mod store;
pub mod util;
pub mod visitors;
