pub mod log_stream;
pub mod path_resolver;
pub mod readiness;
pub mod service_locks;

pub use log_stream::{LogStreamBroadcaster, LogStreamConfig, LogSubscription};
pub use path_resolver::{expand_home, resolve, resolve_dir, ResolvedService};
pub use readiness::{wait_for_port, ReadinessSettings};
pub use service_locks::{ServiceGuard, ServiceLocks};
