//! Gradewatch engine: portal ports, session driving and the polling scheduler.
mod extract;
mod notify;
mod port;
mod scheduler;
mod session;

pub use extract::{extract_results, ExtractError};
pub use notify::{LogSink, NotificationSink};
pub use port::{
    CaptchaOracle, Control, Field, PortalConnector, PortalError, PortalFaultKind, PortalPage,
};
pub use scheduler::{Scheduler, SchedulerConfig, SchedulerError};
pub use session::{RetryPolicy, SessionError, SessionRunner};
