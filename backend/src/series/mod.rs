pub mod hourly;

pub use hourly::{HourlyPrice, MAX_BUCKETS, get_hourly_series, hourly_buckets};
