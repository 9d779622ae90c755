use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Flat subtask record as persisted by the job backend.
///
/// Dates are `YYYY-MM-DD` or the empty string when unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubtaskRecord {
    pub id: i64,
    pub task: String,
    #[serde(default)]
    pub days: i64,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub status: String,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub cost: Decimal,
    #[serde(default)]
    pub deleted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accepted: Option<bool>,
    pub group_title: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_deserialize_minimal_record() {
        let record: SubtaskRecord = serde_json::from_str(
            r#"{"id":7,"task":"Frame walls","groupTitle":"Framing"}"#,
        )
        .unwrap();
        assert_eq!(record.id, 7);
        assert_eq!(record.days, 0);
        assert!(record.start_date.is_empty());
        assert_eq!(record.cost, Decimal::ZERO);
        assert_eq!(record.accepted, None);
    }

    #[test]
    fn test_serialize_camel_case_with_numeric_cost() {
        let record = SubtaskRecord {
            id: 1,
            task: "Pour slab".into(),
            days: 2,
            start_date: "2024-01-01".into(),
            end_date: "2024-01-02".into(),
            status: "pending".into(),
            cost: Decimal::new(125050, 2),
            deleted: false,
            accepted: Some(true),
            group_title: "Foundation".into(),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["startDate"], "2024-01-01");
        assert_eq!(value["groupTitle"], "Foundation");
        assert_eq!(value["cost"].as_f64(), Some(1250.5));
        assert_eq!(value["accepted"], true);
    }
}
