//! Node binary support: configuration, logging, the decision capability,
//! the paid service desk, the simulation runtime and the REST API.

pub mod api;
pub mod cli;
pub mod config;
pub mod decision;
pub mod logging;
pub mod runtime;
pub mod services;

pub use config::Config;
pub use runtime::builder::build_runtime;
