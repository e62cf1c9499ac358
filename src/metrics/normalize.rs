//! Turns a loosely typed [`MetricSnapshot`] into bounded numbers.
//!
//! Nothing in here fails. A garbled or missing field reads as `0` so a single
//! bad sample never stalls the live view.

use serde_json::Value;

use crate::metrics::snapshot::{BatteryInfo, MemoryInfo, MetricSnapshot};

const KB_PER_MB: f64 = 1024.0;

/// One snapshot's worth of normalized values.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Reading {
    /// Percent, 0-100.
    pub cpu: f64,
    pub memory: MemoryUsage,
    /// Percent as reported by the device.
    pub battery: f64,
    /// Degrees Celsius.
    pub temperature: f64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MemoryUsage {
    pub total_kb: u64,
    pub available_kb: u64,
    pub used_kb: u64,
    pub used_mb: f64,
    pub used_percent: f64,
}

impl Reading {
    pub fn from_snapshot(snapshot: &MetricSnapshot) -> Self {
        Self {
            cpu: normalize_cpu(&snapshot.cpu_usage),
            memory: MemoryUsage::from_meminfo(&snapshot.memory_info),
            battery: normalize_battery(&snapshot.battery_info),
            temperature: normalize_temperature(&snapshot.battery_info),
        }
    }
}

impl MemoryUsage {
    pub fn from_meminfo(info: &MemoryInfo) -> Self {
        Self::from_kb(parse_kb(&info.mem_total), parse_kb(&info.mem_available))
    }

    pub fn from_kb(total_kb: u64, available_kb: u64) -> Self {
        let used_kb = total_kb.saturating_sub(available_kb);
        let used_percent = if total_kb > 0 {
            used_kb as f64 / total_kb as f64 * 100.0
        } else {
            0.0
        };
        Self {
            total_kb,
            available_kb,
            used_kb,
            used_mb: used_kb as f64 / KB_PER_MB,
            used_percent,
        }
    }
}

/// Coerce, then clamp to `[0, 100]`.
pub fn normalize_cpu(raw: &Value) -> f64 {
    coerce_number(raw).clamp(0.0, 100.0)
}

pub fn normalize_battery(info: &BatteryInfo) -> f64 {
    leading_int(&info.level).unwrap_or(0) as f64
}

/// The device reports tenths of a degree.
pub fn normalize_temperature(info: &BatteryInfo) -> f64 {
    leading_int(&info.temperature).unwrap_or(0) as f64 / 10.0
}

/// Parse a meminfo value such as `"123456 kB"`. Only the first token counts.
pub fn parse_kb(raw: &Value) -> u64 {
    let n = match raw {
        Value::String(s) => s.split_whitespace().next().and_then(parse_leading_int),
        other => leading_int(other),
    };
    n.and_then(|n| u64::try_from(n).ok()).unwrap_or(0)
}

/// Loose numeric coercion: numbers pass through, strings are parsed after
/// trimming (an empty string is `0`), booleans are `1`/`0`. Anything that
/// doesn't come out finite is `0`.
pub fn coerce_number(raw: &Value) -> f64 {
    let n = match raw {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => {
            let s = s.trim();
            if s.is_empty() {
                0.0
            } else {
                s.parse().unwrap_or(f64::NAN)
            }
        }
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => f64::NAN,
    };
    if n.is_finite() { n } else { 0.0 }
}

/// Integer parse with "leading digits" semantics: `"85"`, `" 85%"` and
/// `85.9` all read as `85`.
pub fn leading_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
        Value::String(s) => parse_leading_int(s),
        _ => None,
    }
}

fn parse_leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let magnitude: i64 = digits[..end].parse().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

/// Coarse battery state shown next to the level readout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatteryStatus {
    Charged,
    Discharging,
    Low,
}

impl BatteryStatus {
    pub fn from_level(level: f64) -> Self {
        if level > 70.0 {
            BatteryStatus::Charged
        } else if level > 30.0 {
            BatteryStatus::Discharging
        } else {
            BatteryStatus::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BatteryStatus::Charged => "Charged",
            BatteryStatus::Discharging => "Discharging",
            BatteryStatus::Low => "Low",
        }
    }
}
