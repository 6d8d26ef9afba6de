pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod routing;
pub mod specialist;
