//! Wire types for the backend's JSON payloads.
//!
//! Every field is optional and loosely typed: the backend forwards values
//! scraped from `dumpsys` and `/proc/meminfo`, so numbers turn up as
//! strings, strings turn up as numbers, and anything may be missing.
//! Normalization happens later in [`crate::metrics::normalize`].

use serde::{Deserialize, Deserializer, Serialize, de::DeserializeOwned};
use serde_json::Value;

/// `GET /api/status`
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceStatus {
    #[serde(default, deserialize_with = "lenient")]
    pub device_connected: bool,
    #[serde(
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub adb_available: Option<bool>,
}

/// `GET /api/metrics`, one poll cycle's worth of raw metrics.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSnapshot {
    pub cpu_usage: Value,
    #[serde(deserialize_with = "lenient")]
    pub memory_info: MemoryInfo,
    #[serde(deserialize_with = "lenient")]
    pub battery_info: BatteryInfo,
    #[serde(deserialize_with = "lenient_list")]
    pub processes: Option<Vec<ProcessEntry>>,
}

/// The interesting part of a `/proc/meminfo` block, values like `"123456 kB"`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryInfo {
    #[serde(rename = "MemTotal")]
    pub mem_total: Value,
    #[serde(rename = "MemAvailable")]
    pub mem_available: Value,
}

/// The interesting part of `dumpsys battery`.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryInfo {
    pub level: Value,
    /// Tenths of a degree Celsius.
    pub temperature: Value,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessEntry {
    pub pid: Value,
    pub name: Value,
    pub cpu: Value,
    /// Megabytes.
    pub memory: Value,
}

/// Falls back to the default when the value has the wrong shape (`null`, a
/// string where an object was expected, ...).
fn lenient<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Anything but an array means "no process list this cycle".
fn lenient_list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .map(|item| serde_json::from_value(item).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    })
}
