use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};

/// One sensor sample as served by the metering backend.
///
/// Quantity fields are optional on the wire; the accessors treat a missing
/// value as `0.0`. `time_value` is kept verbatim and parsed on demand so a
/// malformed timestamp never fails deserialization of the whole batch; a
/// missing, `null` or non-string `timeValue` decodes as an empty string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeterReading {
    pub id: i64,
    pub meter_id: i64,
    #[serde(default, deserialize_with = "lenient_time_value")]
    pub time_value: String,
    #[serde(default)]
    pub power_value: Option<f64>,
    #[serde(default)]
    pub voltage_value: Option<f64>,
    #[serde(default)]
    pub current_value: Option<f64>,
    #[serde(default)]
    pub consumption_value: Option<f64>,
    #[serde(default)]
    pub electricity_cost: Option<f64>,
    #[serde(default)]
    pub power_factor_value: Option<f64>,
}

impl MeterReading {
    pub fn new(id: i64, meter_id: i64, time_value: impl Into<String>) -> Self {
        Self {
            id,
            meter_id,
            time_value: time_value.into(),
            power_value: None,
            voltage_value: None,
            current_value: None,
            consumption_value: None,
            electricity_cost: None,
            power_factor_value: None,
        }
    }

    pub fn with_power(mut self, watts: f64) -> Self {
        self.power_value = Some(watts);
        self
    }

    pub fn with_voltage(mut self, volts: f64) -> Self {
        self.voltage_value = Some(volts);
        self
    }

    pub fn with_current(mut self, amps: f64) -> Self {
        self.current_value = Some(amps);
        self
    }

    pub fn with_consumption(mut self, kwh: f64) -> Self {
        self.consumption_value = Some(kwh);
        self
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.electricity_cost = Some(cost);
        self
    }

    pub fn with_power_factor(mut self, pf: f64) -> Self {
        self.power_factor_value = Some(pf);
        self
    }

    /// Parsed `time_value`, or `None` when it is not a recognised ISO-8601 form.
    pub fn timestamp(&self) -> Option<OffsetDateTime> {
        parse_time_value(&self.time_value)
    }

    pub fn power(&self) -> f64 {
        self.power_value.unwrap_or(0.0)
    }

    pub fn voltage(&self) -> f64 {
        self.voltage_value.unwrap_or(0.0)
    }

    pub fn current(&self) -> f64 {
        self.current_value.unwrap_or(0.0)
    }

    pub fn consumption(&self) -> f64 {
        self.consumption_value.unwrap_or(0.0)
    }

    pub fn cost(&self) -> f64 {
        self.electricity_cost.unwrap_or(0.0)
    }

    pub fn power_factor(&self) -> f64 {
        self.power_factor_value.unwrap_or(0.0)
    }
}

fn lenient_time_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) => s,
        Some(Raw::Other(_)) | None => String::new(),
    })
}

/// Parse an ISO-8601 timestamp.
///
/// Accepts RFC 3339, a naive date-time (treated as UTC) and a bare date
/// (midnight UTC).
pub fn parse_time_value(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }

    let with_seconds =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
    if let Ok(ts) = PrimitiveDateTime::parse(raw, with_seconds) {
        return Some(ts.assume_utc());
    }

    let without_seconds = format_description!("[year]-[month]-[day]T[hour]:[minute]");
    if let Ok(ts) = PrimitiveDateTime::parse(raw, without_seconds) {
        return Some(ts.assume_utc());
    }

    Date::parse(raw, format_description!("[year]-[month]-[day]"))
        .ok()
        .map(|d| d.with_time(Time::MIDNIGHT).assume_utc())
}
