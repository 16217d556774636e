use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(sqlx::FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Employee {
    #[serde(rename = "id")]
    pub employee_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub gender: String,
    pub designation: String,
    pub salary: f64,
    #[serde(with = "joining_date")]
    pub date_of_joining: NaiveDate,
    pub department: String,
    pub employee_photo: Option<String>,
}

/// Parses `YYYY-MM-DD` or a full RFC 3339 timestamp into the stored date.
pub fn parse_joining_date(raw: &str) -> Result<NaiveDate, String> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .map_err(|_| format!("Invalid date: {}", raw))
}

/// Boundary format for `date_of_joining`: `YYYY-MM-DDT00:00:00.000Z`.
pub mod joining_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}T00:00:00.000Z", date.format("%Y-%m-%d")))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_joining_date(&raw).map_err(serde::de::Error::custom)
    }
}
