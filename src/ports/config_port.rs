//! Configuration access port trait.

use std::time::Duration;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;

    /// Non-negative duration in seconds; negative values fall back to `default`.
    fn get_secs(&self, section: &str, key: &str, default: Duration) -> Duration {
        match self.get_int(section, key, -1) {
            n if n >= 0 => Duration::from_secs(n as u64),
            _ => default,
        }
    }

    fn get_millis(&self, section: &str, key: &str, default: Duration) -> Duration {
        match self.get_int(section, key, -1) {
            n if n >= 0 => Duration::from_millis(n as u64),
            _ => default,
        }
    }
}
