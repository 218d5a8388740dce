mod require_session;
pub mod trace_id;

pub use require_session::require_session;
pub use trace_id::{TraceId, TraceIdLayer};
