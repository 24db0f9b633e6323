//! Transport abstraction over the agent runtime

use std::{pin::Pin, time::Duration};

use async_trait::async_trait;
use tokio_stream::Stream;

use avm_model::{Message, MessageContent};

use crate::error::Result;
use crate::events::Envelope;

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

/// A stream of event envelopes from the runtime
pub type EventStream = Pin<Box<dyn Stream<Item = Envelope> + Send>>;

/// What the runtime returns when it accepts a user message
#[derive(Debug, Clone, Default)]
pub struct SendReceipt {
    /// The agent instance now handling the thread, when the runtime
    /// reports one. Passed back on interrupt.
    pub agent_id: Option<String>,
}

/// Transport to the agent runtime hosting the conversation threads.
///
/// Implementations own connection management and wire encoding; the session
/// layer only sees typed messages and envelopes.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch the full ordered message log for a thread
    async fn fetch_history(&self, thread_id: &str) -> Result<Vec<Message>>;

    /// Submit a user message to a thread
    async fn send(&self, thread_id: &str, content: MessageContent) -> Result<SendReceipt>;

    /// Ask the runtime to stop the in-flight turn on a thread
    async fn interrupt(&self, thread_id: &str, agent_id: Option<&str>) -> Result<()>;

    /// Open the event stream for a thread
    async fn subscribe(&self, thread_id: &str) -> Result<EventStream>;
}
