//! Host capabilities injected into the engine
//!
//! The engine never reaches for the wall clock or a random id on its own;
//! both come through [`Env`] so the whole engine stays a seedable pure
//! function under test.

/// Clock and id generation, supplied by the host.
pub trait Env: Send {
    /// Current time in ms since epoch
    fn now_ms(&self) -> i64;

    /// Generate a fresh id with the given prefix
    fn next_id(&mut self, prefix: &str) -> String;
}

/// Production environment: wall clock and random ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemEnv;

impl Env for SystemEnv {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn next_id(&mut self, prefix: &str) -> String {
        format!("{prefix}_{}", uuid::Uuid::new_v4().simple())
    }
}

/// Deterministic environment: a fixed clock and sequential ids.
///
/// Used by tests and by hosts that need reproducible state transitions.
#[derive(Debug, Clone, Default)]
pub struct FixedEnv {
    /// The time every `now_ms` call reports
    pub now: i64,
    counter: u64,
}

impl FixedEnv {
    /// Create an environment pinned at the given time
    pub fn at(now: i64) -> Self {
        Self { now, counter: 0 }
    }
}

impl Env for FixedEnv {
    fn now_ms(&self) -> i64 {
        self.now
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.counter += 1;
        format!("{prefix}_{}", self.counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_env_is_sequential() {
        let mut env = FixedEnv::at(42);
        assert_eq!(env.now_ms(), 42);
        assert_eq!(env.next_id("text"), "text_1");
        assert_eq!(env.next_id("tool"), "tool_2");
    }

    #[test]
    fn test_system_env_ids_are_unique() {
        let mut env = SystemEnv;
        let a = env.next_id("user");
        let b = env.next_id("user");
        assert_ne!(a, b);
        assert!(a.starts_with("user_"));
    }
}
