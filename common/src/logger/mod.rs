mod init;
mod spans;
mod trace_id;

pub use init::init_tracing;
pub use spans::{alert_span, asset_span, run_span, warn_if_slow};
pub use trace_id::TraceId;
