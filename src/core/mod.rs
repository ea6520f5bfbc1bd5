pub mod config;
pub mod edge;
pub mod execution;
pub mod lifecycle;
pub mod logs;
pub mod notify;
pub mod plugins;
pub mod services;
pub mod store;
pub mod strategies;
pub mod terminal;
