//! Port traits: the seams between the engine and the outside world.

pub mod benchmark_port;
pub mod clock_port;
pub mod config_port;
pub mod http_port;
pub mod price_port;
pub mod report_port;
