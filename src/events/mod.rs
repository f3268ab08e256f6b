//! Observability side-channels: event sinks, toasts, and the message log.
//!
//! Nothing here feeds back into pipeline state.

mod log;
mod sink;
mod toasts;

pub use log::{LogEntry, MessageLog, MESSAGE_LOG_CAP};
pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};
pub use toasts::{Toast, ToastHub, ToastKind, DEFAULT_TOAST_TTL};
