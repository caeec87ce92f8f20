//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_report_adapter;
pub mod file_config_adapter;
pub mod fred_adapter;
pub mod http_client;
pub mod json_chart_adapter;
pub mod nasdaq;
pub mod system_clock;
pub mod yaml_portfolio_adapter;

/// File-name stem for a portfolio label: `Growth Tilt` → `growth_tilt`.
pub fn report_stem(label: &str) -> String {
    let stem: String = label
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    if stem.is_empty() {
        "portfolio".to_string()
    } else {
        stem
    }
}
