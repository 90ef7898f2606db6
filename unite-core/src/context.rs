//! Host capabilities consulted by the cache: execution context and clock.

use chrono::Utc;

use crate::TimestampMs;

/// Capability query distinguishing client from non-client execution.
///
/// Every public cache operation consults this first. In a non-client
/// context the cache returns safe defaults and never touches storage.
pub trait ExecutionContext: Send + Sync {
    /// Returns true when running in a client execution context.
    fn is_client(&self) -> bool;
}

/// Client execution context. Caching is active.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClientContext;

impl ExecutionContext for ClientContext {
    fn is_client(&self) -> bool {
        true
    }
}

/// Non-client (server-side render, build step) execution context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerContext;

impl ExecutionContext for ServerContext {
    fn is_client(&self) -> bool {
        false
    }
}

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> TimestampMs;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> TimestampMs {
        Utc::now().timestamp_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contexts() {
        assert!(ClientContext.is_client());
        assert!(!ServerContext.is_client());
    }

    #[test]
    fn test_system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now_millis() > 1_577_836_800_000);
    }

    #[test]
    fn test_context_trait_objects() {
        let contexts: Vec<Box<dyn ExecutionContext>> =
            vec![Box::new(ClientContext), Box::new(ServerContext)];
        let flags: Vec<bool> = contexts.iter().map(|c| c.is_client()).collect();
        assert_eq!(flags, vec![true, false]);
    }
}
