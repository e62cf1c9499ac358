use serde_json::Value;

use crate::metrics::{
    normalize::{coerce_number, leading_int},
    snapshot::ProcessEntry,
};

#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProcessRow {
    pub pid: Option<i64>,
    pub name: String,
    pub cpu: f64,
    pub memory_mb: f64,
}

impl ProcessRow {
    pub fn from_entry(entry: &ProcessEntry) -> Self {
        let name = match &entry.name {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        Self {
            pid: leading_int(&entry.pid),
            name,
            cpu: coerce_number(&entry.cpu),
            memory_mb: coerce_number(&entry.memory),
        }
    }
}

/// Normalize and order busiest first. Equal CPU keeps the backend's order.
pub fn sort_by_cpu(entries: &[ProcessEntry]) -> Vec<ProcessRow> {
    let mut rows: Vec<ProcessRow> = entries.iter().map(ProcessRow::from_entry).collect();
    rows.sort_by(|a, b| b.cpu.total_cmp(&a.cpu));
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entry(name: &str, cpu: Value) -> ProcessEntry {
        ProcessEntry {
            pid: json!(1),
            name: json!(name),
            cpu,
            memory: json!(10.0),
        }
    }

    #[test]
    fn sorted_descending_by_cpu() {
        let entries = vec![
            entry("com.low", json!(1.5)),
            entry("com.high", json!(40.0)),
            entry("com.mid", json!("12.3")),
            entry("com.broken", json!("n/a")),
        ];
        let names: Vec<String> = sort_by_cpu(&entries).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["com.high", "com.mid", "com.low", "com.broken"]);
    }

    #[test]
    fn ties_keep_backend_order() {
        let entries = vec![entry("a", json!(5)), entry("b", json!(5)), entry("c", json!(5))];
        let names: Vec<String> = sort_by_cpu(&entries).into_iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn empty_list() {
        assert!(sort_by_cpu(&[]).is_empty());
    }

    #[test]
    fn blank_entry_normalizes_to_zeroes() {
        let row = ProcessRow::from_entry(&ProcessEntry::default());
        assert_eq!(row, ProcessRow::default());
    }

    #[test]
    fn pid_and_memory_from_strings() {
        let row = ProcessRow::from_entry(&ProcessEntry {
            pid: json!("1234"),
            name: json!("com.spotify.music"),
            cpu: json!(2.3),
            memory: json!("180.4"),
        });
        assert_eq!(row.pid, Some(1234));
        assert_eq!(row.memory_mb, 180.4);
    }
}
