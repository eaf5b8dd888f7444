pub mod config;
pub mod progress;
pub mod serde;
pub mod units;
