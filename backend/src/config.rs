//! Application configuration.
//!
//! Compile-time defaults, overridable from the environment (a `.env` file is
//! loaded by the binary before [`DashboardConfig::from_env`] is called).
//!
//! | Variable                     | Default          |
//! |------------------------------|------------------|
//! | `SALESLOAD_BRAND`            | `Crispy Chicken` |
//! | `SALESLOAD_PORT`             | `3000`           |
//! | `SALESLOAD_STATUS_TTL_SECS`  | `5`              |

use std::collections::BTreeMap;
use std::time::Duration;

/// Brand shown in branch labels and used in download file names.
pub const DEFAULT_BRAND: &str = "Crispy Chicken";

/// Port for the HTTP server.
pub const DEFAULT_PORT: u16 = 3000;

/// How long a status message stays visible.
pub const DEFAULT_STATUS_TTL: Duration = Duration::from_secs(5);

/// Maximum upload size (in bytes).
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Share of orders delivered, per year. Supplied, never derived from uploads.
pub const DEFAULT_DELIVERY_PERCENTAGES: [(i32, f64); 2] = [(2024, 0.814), (2025, 0.681)];

/// Runtime configuration shared by the pipeline, exporter and server.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub brand: String,
    pub delivery_percentages: BTreeMap<i32, f64>,
    pub status_ttl: Duration,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            brand: DEFAULT_BRAND.to_string(),
            delivery_percentages: DEFAULT_DELIVERY_PERCENTAGES.into_iter().collect(),
            status_ttl: DEFAULT_STATUS_TTL,
            port: DEFAULT_PORT,
        }
    }
}

impl DashboardConfig {
    /// Build a configuration from environment variables, falling back to defaults.
    ///
    /// Unparseable numeric values are ignored rather than treated as errors.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(brand) = lookup("SALESLOAD_BRAND").filter(|b| !b.trim().is_empty()) {
            config.brand = brand.trim().to_string();
        }
        if let Some(port) = lookup("SALESLOAD_PORT").and_then(|p| p.trim().parse().ok()) {
            config.port = port;
        }
        if let Some(secs) = lookup("SALESLOAD_STATUS_TTL_SECS").and_then(|s| s.trim().parse().ok()) {
            config.status_ttl = Duration::from_secs(secs);
        }

        config
    }

    /// Display label for a branch, e.g. `Crispy Chicken - Hamdan`.
    pub fn branch_label(&self, branch: &str) -> String {
        format!("{} - {}", self.brand, branch)
    }

    /// File-name friendly brand, e.g. `crispy-chicken`.
    pub fn brand_slug(&self) -> String {
        self.brand
            .to_lowercase()
            .chars()
            .map(|c| if c.is_alphanumeric() { c } else { '-' })
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = DashboardConfig::default();
        assert_eq!(config.brand, "Crispy Chicken");
        assert_eq!(config.port, 3000);
        assert_eq!(config.status_ttl, Duration::from_secs(5));
        assert_eq!(config.delivery_percentages[&2024], 0.814);
        assert_eq!(config.delivery_percentages[&2025], 0.681);
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("SALESLOAD_BRAND", "  Zesty Wings "),
            ("SALESLOAD_PORT", "8080"),
            ("SALESLOAD_STATUS_TTL_SECS", "not-a-number"),
        ]);
        let config = DashboardConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.brand, "Zesty Wings");
        assert_eq!(config.port, 8080);
        assert_eq!(config.status_ttl, DEFAULT_STATUS_TTL);
    }

    #[test]
    fn test_branch_label_and_slug() {
        let config = DashboardConfig::default();
        assert_eq!(config.branch_label("Hamdan"), "Crispy Chicken - Hamdan");
        assert_eq!(config.brand_slug(), "crispy-chicken");

        let odd = DashboardConfig {
            brand: "Al-Noor  Café & Grill".into(),
            ..DashboardConfig::default()
        };
        assert_eq!(odd.brand_slug(), "al-noor-café-grill");
    }
}
