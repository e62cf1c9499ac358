//! Fixed-capacity rolling history for the four charted metrics.

use std::{collections::VecDeque, fmt};

use crate::metrics::normalize::Reading;

pub const DEFAULT_CAPACITY: usize = 20;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub time: String,
    pub value: f64,
}

impl MetricPoint {
    pub fn new(time: impl Into<String>, value: f64) -> Self {
        Self {
            time: time.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeriesKey {
    Cpu,
    Memory,
    Battery,
    Temperature,
}

impl SeriesKey {
    pub const ALL: [SeriesKey; 4] = [
        SeriesKey::Cpu,
        SeriesKey::Memory,
        SeriesKey::Battery,
        SeriesKey::Temperature,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SeriesKey::Cpu => "CPU",
            SeriesKey::Memory => "Memory",
            SeriesKey::Battery => "Battery",
            SeriesKey::Temperature => "Temperature",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            SeriesKey::Cpu | SeriesKey::Memory | SeriesKey::Battery => "%",
            SeriesKey::Temperature => "°C",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            SeriesKey::Cpu => 0,
            SeriesKey::Memory => 1,
            SeriesKey::Battery => 2,
            SeriesKey::Temperature => 3,
        }
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// The value this series charts out of a reading.
    pub fn value_of(&self, reading: &Reading) -> f64 {
        match self {
            SeriesKey::Cpu => reading.cpu,
            SeriesKey::Memory => reading.memory.used_percent,
            SeriesKey::Battery => reading.battery,
            SeriesKey::Temperature => reading.temperature,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// FIFO of at most `capacity` points, oldest first.
#[derive(Debug, Clone)]
pub struct SeriesBuffer {
    points: VecDeque<MetricPoint>,
    capacity: usize,
}

impl SeriesBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    pub fn push(&mut self, point: MetricPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &MetricPoint> {
        self.points.iter()
    }

    pub fn last(&self) -> Option<&MetricPoint> {
        self.points.back()
    }
}

/// The four series, kept in lock step.
#[derive(Debug, Clone)]
pub struct SeriesStore {
    buffers: [SeriesBuffer; 4],
}

impl Default for SeriesStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SeriesStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            buffers: std::array::from_fn(|_| SeriesBuffer::new(capacity)),
        }
    }

    pub fn buffer(&self, key: SeriesKey) -> &SeriesBuffer {
        &self.buffers[key.index()]
    }

    /// Push one point onto a single series. Callers are expected to append
    /// to every series once per cycle; see [`SeriesStore::push_reading`].
    pub fn append(&mut self, key: SeriesKey, point: MetricPoint) {
        self.buffers[key.index()].push(point);
    }

    /// Append one point per series, all under the same label.
    pub fn push_reading(&mut self, label: &str, reading: &Reading) {
        for key in SeriesKey::ALL {
            self.append(key, MetricPoint::new(label, key.value_of(reading)));
        }
    }

    pub fn values_of(&self, key: SeriesKey) -> Vec<f64> {
        self.buffer(key).iter().map(|p| p.value).collect()
    }

    pub fn labels_of(&self, key: SeriesKey) -> Vec<String> {
        self.buffer(key).iter().map(|p| p.time.clone()).collect()
    }

    pub fn latest(&self, key: SeriesKey) -> Option<f64> {
        self.buffer(key).last().map(|p| p.value)
    }

    pub fn capacity(&self) -> usize {
        self.buffers[0].capacity()
    }

    pub fn len(&self) -> usize {
        self.buffers[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffers[0].is_empty()
    }
}
