use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of weather forecast supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub condition: String,
    /// 0..=100
    pub precipitation_probability: u8,
}

impl ForecastDay {
    pub fn new(date: NaiveDate, condition: impl Into<String>, precipitation_probability: u8) -> Self {
        ForecastDay {
            date,
            condition: condition.into(),
            precipitation_probability,
        }
    }

    /// Rain named in the condition, or probability above `threshold`
    pub fn is_rain_risk(&self, threshold: u8) -> bool {
        self.condition.to_lowercase().contains("rain") || self.precipitation_probability > threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_rain_risk() {
        assert!(ForecastDay::new(d(2024, 5, 1), "Light Rain", 10).is_rain_risk(50));
        assert!(ForecastDay::new(d(2024, 5, 1), "Cloudy", 51).is_rain_risk(50));
        assert!(!ForecastDay::new(d(2024, 5, 1), "Cloudy", 50).is_rain_risk(50));
        assert!(!ForecastDay::new(d(2024, 5, 1), "Sunny", 0).is_rain_risk(50));
    }

    #[test]
    fn test_deserialize_camel_case() {
        let day: ForecastDay = serde_json::from_str(
            r#"{"date":"2024-05-01","condition":"Showers","precipitationProbability":80}"#,
        )
        .unwrap();
        assert_eq!(day.date, d(2024, 5, 1));
        assert_eq!(day.precipitation_probability, 80);
    }
}
