pub mod config;
pub mod dispatch;
pub mod ground_control;
pub mod session;
pub mod utils;
pub mod vehicle;
