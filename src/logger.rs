use serde_json::Value;

/// Caller-supplied sink for mix lifecycle messages.
///
/// Implementations must not panic; the pipeline never inspects what a logger
/// does with a message and a logger can't change the outcome of a mix.
pub trait MixLogger: Send + Sync {
    fn info(&self, message: &str, fields: &Value);
    fn debug(&self, message: &str, fields: &Value);
    fn error(&self, message: &str, fields: &Value);
}

/// Forwards to the `tracing` macros.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

impl MixLogger for TracingLogger {
    fn info(&self, message: &str, fields: &Value) {
        tracing::info!(%fields, "{message}");
    }

    fn debug(&self, message: &str, fields: &Value) {
        tracing::debug!(%fields, "{message}");
    }

    fn error(&self, message: &str, fields: &Value) {
        tracing::error!(%fields, "{message}");
    }
}

// Guarded helpers so call sites stay one line when no logger was passed.

pub(crate) fn info(logger: Option<&dyn MixLogger>, message: &str, fields: Value) {
    if let Some(l) = logger {
        l.info(message, &fields);
    }
}

pub(crate) fn debug(logger: Option<&dyn MixLogger>, message: &str, fields: Value) {
    if let Some(l) = logger {
        l.debug(message, &fields);
    }
}

pub(crate) fn error(logger: Option<&dyn MixLogger>, message: &str, fields: Value) {
    if let Some(l) = logger {
        l.error(message, &fields);
    }
}
