pub mod cli;
pub mod config;
pub mod http;
pub mod logging;
pub mod pom;
pub mod process;
pub mod version;
pub mod vulnerability;
