//! The dashboard's data context: rolling series, the latest readout, the
//! process table and the device status. Owned by the app, read by the UI.

use std::time::Instant;

use log::*;

use crate::metrics::{DeviceStatus, ProcessRow, Reading, SeriesStore};

/// Orders poll cycles. `epoch` moves forward every time the poller is
/// restarted so a fresh poller's first cycle still beats a stale one.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CycleToken {
    pub epoch: u32,
    pub cycle: u64,
}

impl CycleToken {
    pub fn new(epoch: u32, cycle: u64) -> Self {
        Self { epoch, cycle }
    }
}

/// One normalized poll result on its way to the [`Monitor`].
#[derive(Debug, Clone, PartialEq)]
pub struct MetricsUpdate {
    pub token: CycleToken,
    pub label: String,
    pub reading: Reading,
    /// `None` when the backend sent no process list this cycle.
    pub processes: Option<Vec<ProcessRow>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Connection {
    Unknown,
    Connected { adb_available: Option<bool> },
    Disconnected { adb_available: Option<bool> },
}

impl From<DeviceStatus> for Connection {
    fn from(status: DeviceStatus) -> Self {
        if status.device_connected {
            Connection::Connected {
                adb_available: status.adb_available,
            }
        } else {
            Connection::Disconnected {
                adb_available: status.adb_available,
            }
        }
    }
}

#[derive(Debug)]
pub struct Monitor {
    pub series: SeriesStore,
    pub latest: Option<Reading>,
    pub processes: Vec<ProcessRow>,
    pub connection: Connection,
    pub last_update: Option<Instant>,
    pub last_label: Option<String>,
    pub failures: u64,
    /// Why the most recent cycle failed, cleared by the next good one.
    pub last_error: Option<String>,
    applied: Option<CycleToken>,
}

impl Monitor {
    pub fn new(capacity: usize) -> Self {
        Self {
            series: SeriesStore::new(capacity),
            latest: None,
            processes: Vec::new(),
            connection: Connection::Unknown,
            last_update: None,
            last_label: None,
            failures: 0,
            last_error: None,
            applied: None,
        }
    }

    /// Apply a poll result unless something newer already landed.
    /// Returns whether the update was applied.
    pub fn apply(&mut self, update: MetricsUpdate) -> bool {
        if let Some(applied) = self.applied
            && update.token <= applied
        {
            debug!(target: "Monitor", "Dropping stale cycle {:?} (have {:?})", update.token, applied);
            return false;
        }
        self.applied = Some(update.token);
        self.series.push_reading(&update.label, &update.reading);
        self.latest = Some(update.reading);
        if let Some(processes) = update.processes {
            self.processes = processes;
        }
        self.last_update = Some(Instant::now());
        self.last_label = Some(update.label);
        self.last_error = None;
        true
    }

    pub fn record_failure(&mut self, reason: String) {
        self.failures += 1;
        self.last_error = Some(reason);
    }

    pub fn set_status(&mut self, connection: Connection) {
        if connection != self.connection {
            info!(target: "Monitor", "Device status: {:?}", connection);
        }
        self.connection = connection;
    }

    pub fn last_applied(&self) -> Option<CycleToken> {
        self.applied
    }

    /// Whether data arrived within `window` of `now`.
    pub fn is_fresh(&self, now: Instant, window: std::time::Duration) -> bool {
        self.last_update
            .is_some_and(|t| now.saturating_duration_since(t) <= window)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::metrics::{MemoryUsage, SeriesKey};

    fn update(epoch: u32, cycle: u64, cpu: f64, processes: Option<Vec<ProcessRow>>) -> MetricsUpdate {
        MetricsUpdate {
            token: CycleToken::new(epoch, cycle),
            label: format!("10:00:{cycle:02}"),
            reading: Reading {
                cpu,
                memory: MemoryUsage::from_kb(1000, 500),
                battery: 80.0,
                temperature: 30.5,
            },
            processes,
        }
    }

    fn row(name: &str, cpu: f64) -> ProcessRow {
        ProcessRow {
            pid: Some(1),
            name: name.to_string(),
            cpu,
            memory_mb: 1.0,
        }
    }

    #[test]
    fn applies_in_order() {
        let mut monitor = Monitor::new(20);
        assert!(monitor.apply(update(0, 1, 10.0, None)));
        assert!(monitor.apply(update(0, 2, 20.0, None)));
        assert_eq!(monitor.series.values_of(SeriesKey::Cpu), vec![10.0, 20.0]);
        assert_eq!(monitor.series.values_of(SeriesKey::Memory), vec![50.0, 50.0]);
        assert_eq!(monitor.latest.map(|r| r.cpu), Some(20.0));
        assert_eq!(monitor.last_label.as_deref(), Some("10:00:02"));
        assert_eq!(monitor.last_applied(), Some(CycleToken::new(0, 2)));
    }

    #[test]
    fn stale_cycle_is_dropped() {
        let mut monitor = Monitor::new(20);
        assert!(monitor.apply(update(0, 3, 30.0, None)));
        assert!(!monitor.apply(update(0, 2, 20.0, Some(vec![row("late", 1.0)]))));
        assert!(!monitor.apply(update(0, 3, 30.0, None)));
        assert_eq!(monitor.series.len(), 1);
        assert_eq!(monitor.latest.map(|r| r.cpu), Some(30.0));
        assert!(monitor.processes.is_empty());
    }

    #[test]
    fn new_epoch_beats_old_cycles() {
        let mut monitor = Monitor::new(20);
        assert!(monitor.apply(update(0, 500, 1.0, None)));
        assert!(monitor.apply(update(1, 1, 2.0, None)));
        assert!(!monitor.apply(update(0, 501, 3.0, None)));
        assert_eq!(monitor.series.values_of(SeriesKey::Cpu), vec![1.0, 2.0]);
    }

    #[test]
    fn absent_process_list_keeps_previous() {
        let mut monitor = Monitor::new(20);
        monitor.apply(update(0, 1, 1.0, Some(vec![row("a", 2.0), row("b", 1.0)])));
        monitor.apply(update(0, 2, 1.0, None));
        assert_eq!(monitor.processes.len(), 2);
        monitor.apply(update(0, 3, 1.0, Some(vec![])));
        assert!(monitor.processes.is_empty());
    }

    #[test]
    fn series_stay_bounded() {
        let mut monitor = Monitor::new(20);
        for cycle in 1..=45 {
            monitor.apply(update(0, cycle, cycle as f64, None));
        }
        for key in SeriesKey::ALL {
            assert_eq!(monitor.series.buffer(key).len(), 20);
        }
        assert_eq!(monitor.series.values_of(SeriesKey::Cpu).first(), Some(&26.0));
    }

    #[test]
    fn failure_reason_until_next_good_cycle() {
        let mut monitor = Monitor::new(20);
        monitor.record_failure("connection refused".to_string());
        monitor.record_failure("HTTP 503".to_string());
        assert_eq!(monitor.failures, 2);
        assert_eq!(monitor.last_error.as_deref(), Some("HTTP 503"));
        monitor.apply(update(0, 1, 1.0, None));
        assert_eq!(monitor.last_error, None);
        assert_eq!(monitor.failures, 2);
    }

    #[test]
    fn freshness_window() {
        let mut monitor = Monitor::new(20);
        let now = Instant::now();
        assert!(!monitor.is_fresh(now, Duration::from_secs(2)));
        monitor.apply(update(0, 1, 1.0, None));
        assert!(monitor.is_fresh(Instant::now(), Duration::from_secs(2)));
    }

    #[test]
    fn connection_from_status() {
        let mut monitor = Monitor::new(20);
        assert_eq!(monitor.connection, Connection::Unknown);
        monitor.set_status(
            DeviceStatus {
                device_connected: true,
                adb_available: Some(true),
            }
            .into(),
        );
        assert_eq!(
            monitor.connection,
            Connection::Connected {
                adb_available: Some(true)
            }
        );
        monitor.set_status(DeviceStatus::default().into());
        assert_eq!(
            monitor.connection,
            Connection::Disconnected {
                adb_available: None
            }
        );
    }
}
