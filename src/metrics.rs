pub mod normalize;
pub mod process;
pub mod series;
pub mod snapshot;

pub use normalize::{BatteryStatus, MemoryUsage, Reading};
pub use process::ProcessRow;
pub use series::{MetricPoint, SeriesBuffer, SeriesKey, SeriesStore};
pub use snapshot::{DeviceStatus, MetricSnapshot};
