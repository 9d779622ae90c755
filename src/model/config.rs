use serde::{Deserialize, Serialize};

/// Engine configuration from phaseline.toml. Every field has a default,
/// so an empty file (or no file) yields the stock heuristics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub report: ReportConfig,
    #[serde(default)]
    pub critical: CriticalConfig,
    #[serde(default)]
    pub status: StatusConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Rows whose phase or task contains any of these (case-insensitive)
    /// are summary rows, not tasks.
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        ReportConfig {
            denylist: default_denylist(),
        }
    }
}

fn default_denylist() -> Vec<String> {
    vec!["total project duration".to_string()]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriticalConfig {
    #[serde(default = "default_critical_keywords")]
    pub keywords: Vec<String>,
}

impl Default for CriticalConfig {
    fn default() -> Self {
        CriticalConfig {
            keywords: default_critical_keywords(),
        }
    }
}

fn default_critical_keywords() -> Vec<String> {
    ["foundation", "structural", "inspection", "permit"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// When set, a group whose progress leads the time-elapsed expectation
    /// by at least this many points is reported `ahead`. Unset: never ahead.
    #[serde(default)]
    pub ahead_threshold_percent: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherConfig {
    /// Lower-case substrings naming weather-sensitive work
    #[serde(default = "default_sensitive_categories")]
    pub sensitive_categories: Vec<String>,
    /// Precipitation probability strictly above this counts as rain risk
    #[serde(default = "default_rain_threshold")]
    pub rain_probability_threshold: u8,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        WeatherConfig {
            sensitive_categories: default_sensitive_categories(),
            rain_probability_threshold: default_rain_threshold(),
        }
    }
}

fn default_sensitive_categories() -> Vec<String> {
    [
        "site prep",
        "site preparation",
        "site work",
        "excavation",
        "foundation",
        "concrete",
        "framing",
        "roofing",
        "masonry",
        "exterior finish",
        "siding",
        "waterproofing",
        "window installation",
        "door installation",
        "landscaping",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_rain_threshold() -> u8 {
    50
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.weather.rain_probability_threshold, 50);
        assert!(config.critical.keywords.contains(&"permit".to_string()));
        assert_eq!(config.status.ahead_threshold_percent, None);
    }

    #[test]
    fn test_partial_override() {
        let config: EngineConfig = toml::from_str(
            r#"
[weather]
rain_probability_threshold = 70

[status]
ahead_threshold_percent = 10.0
"#,
        )
        .unwrap();
        assert_eq!(config.weather.rain_probability_threshold, 70);
        // untouched list keeps its default
        assert!(config.weather.sensitive_categories.contains(&"roofing".to_string()));
        assert_eq!(config.status.ahead_threshold_percent, Some(10.0));
        assert_eq!(config.report.denylist, vec!["total project duration"]);
    }
}
