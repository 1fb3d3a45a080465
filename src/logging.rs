//! Request-scoped logging on top of `tracing`.

use std::fmt;

use tracing_subscriber::EnvFilter;

/// Request-scoped logger.
///
/// Obtained from [`RequestContext::log`](crate::RequestContext::log) and
/// bound to its lifetime. Every event carries `request_id` and, when known,
/// the caller's email.
#[derive(Debug, Clone, Copy)]
pub struct RequestLog<'a> {
    request_id: &'a str,
    caller: Option<&'a str>,
}

impl<'a> RequestLog<'a> {
    pub(crate) fn new(request_id: &'a str, caller: Option<&'a str>) -> Self {
        Self { request_id, caller }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs an info-level message.
    ///
    /// ```no_run
    /// # use marketplace_core::RequestContext;
    /// let ctx = RequestContext::anonymous("req-1");
    /// ctx.log().info(format_args!("listing {} sales", 3));
    /// ```
    pub fn info(&self, args: fmt::Arguments<'_>) {
        tracing::info!(request_id = %self.request_id, caller = ?self.caller, "{}", args);
    }

    /// Logs a warning-level message.
    pub fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(request_id = %self.request_id, caller = ?self.caller, "{}", args);
    }

    /// Logs an error-level message.
    pub fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(request_id = %self.request_id, caller = ?self.caller, "{}", args);
    }

    /// Logs a debug-level message.
    pub fn debug(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(request_id = %self.request_id, caller = ?self.caller, "{}", args);
    }
}

/// Installs a global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. Calling this more than
/// once is harmless; only the first call installs anything.
pub fn init(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init("debug");
        init("info");
        let log = RequestLog::new("req-9", Some("a@b.io"));
        log.debug(format_args!("still logging"));
    }
}
