#![allow(clippy::future_not_send)]

pub mod cli;
pub mod config;
pub mod error;
mod logging;
pub mod protocol;
pub mod shell;
pub mod transport;
mod ui;
pub mod views;

pub use error::Error;
