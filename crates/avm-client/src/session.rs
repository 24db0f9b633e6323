//! One conversation thread: state, transport calls, event application

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use avm_engine::{Action, ConversationState, Env, SystemEnv, reduce};
use avm_model::{
    AgentStatus, AssistantConversationStatus, MessageContent, SEND_FAILED, UiError,
    UserConversation, UserConversationStatus,
};

use crate::error::Result;
use crate::events::{AgentEvent, Envelope};
use crate::transport::{RetryConfig, Transport};

/// Client-side view of one conversation thread.
///
/// Owns the conversation state and the only dispatch path into it. Inbound
/// envelopes and local intents (send, interrupt) both funnel through
/// [`reduce`](avm_engine::reduce), one action at a time, so state transitions
/// stay single-threaded regardless of how the host schedules I/O.
pub struct Session<T: Transport> {
    transport: T,
    state: ConversationState,
    env: Box<dyn Env>,
    thread_id: String,
    agent_id: Option<String>,
    retry: RetryConfig,
}

impl<T: Transport> Session<T> {
    /// Create a session for a thread, using the system clock and random ids
    pub fn new(transport: T, thread_id: impl Into<String>) -> Self {
        Self::with_env(transport, thread_id, Box::new(SystemEnv))
    }

    /// Create a session with an explicit environment
    pub fn with_env(transport: T, thread_id: impl Into<String>, env: Box<dyn Env>) -> Self {
        Self {
            transport,
            state: ConversationState::new(),
            env,
            thread_id: thread_id.into(),
            agent_id: None,
            retry: RetryConfig::default(),
        }
    }

    /// Set the retry configuration for history fetches
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The current conversation state
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// The thread this session is bound to
    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    /// Whether the agent is actively working (drives UI spinners)
    pub fn is_loading(&self) -> bool {
        self.state.is_loading()
    }

    /// Fold one action into the state
    fn dispatch(&mut self, action: Action) {
        let state = std::mem::take(&mut self.state);
        self.state = reduce(state, action, self.env.as_mut());
    }

    /// Discard all conversation state for this thread
    pub fn reset(&mut self) {
        self.dispatch(Action::Reset);
    }

    /// Clear surfaced errors
    pub fn clear_errors(&mut self) {
        self.dispatch(Action::ErrorsClear);
    }

    /// Switch to a different thread: reset, then replay its history
    pub async fn select_thread(&mut self, thread_id: impl Into<String>) -> Result<()> {
        self.thread_id = thread_id.into();
        self.agent_id = None;
        self.dispatch(Action::Reset);
        self.load_history().await
    }

    /// Fetch the thread's message log and seed the state from it.
    ///
    /// Retries with exponential backoff. After the final attempt fails, a
    /// recoverable error is surfaced and the state is left as it was.
    pub async fn load_history(&mut self) -> Result<()> {
        let mut attempt = 0u32;
        loop {
            match self.transport.fetch_history(&self.thread_id).await {
                Ok(messages) => {
                    self.dispatch(Action::LoadHistory { messages });
                    return Ok(());
                }
                Err(err) if attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        thread_id = %self.thread_id,
                        "History fetch failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempt + 1,
                        self.retry.max_retries + 1,
                        err,
                        delay
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    tracing::error!(thread_id = %self.thread_id, "History fetch failed: {err}");
                    self.dispatch(Action::ErrorAdd {
                        error: UiError {
                            code: "HISTORY_LOAD_FAILED".to_string(),
                            message: err.to_string(),
                            recoverable: true,
                        },
                    });
                    return Err(err);
                }
            }
        }
    }

    /// Send a user message on this thread.
    ///
    /// The user turn appears immediately as `pending` and resolves to
    /// `success` or `error` when the transport answers. On success a queued
    /// assistant turn opens to receive the streamed response.
    pub async fn send(&mut self, content: impl Into<MessageContent>) -> Result<()> {
        let content = content.into();
        self.dispatch(Action::ErrorsClear);

        let conversation = UserConversation {
            id: self.env.next_id("user"),
            content: content.clone(),
            timestamp: self.env.now_ms(),
            status: UserConversationStatus::Pending,
            error_code: None,
        };
        self.dispatch(Action::UserAdd { conversation });

        match self.transport.send(&self.thread_id, content).await {
            Ok(receipt) => {
                self.agent_id = receipt.agent_id;
                self.dispatch(Action::UserStatus {
                    status: UserConversationStatus::Success,
                    error_code: None,
                });
                let id = self.env.next_id("assistant");
                self.dispatch(Action::AssistantStart { id });
                Ok(())
            }
            Err(err) => {
                tracing::error!(thread_id = %self.thread_id, "Send failed: {err}");
                self.dispatch(Action::UserStatus {
                    status: UserConversationStatus::Error,
                    error_code: Some(SEND_FAILED.to_string()),
                });
                self.dispatch(Action::SetAgentStatus {
                    status: AgentStatus::Error,
                });
                Err(err)
            }
        }
    }

    /// Interrupt the in-flight turn.
    ///
    /// The pending user turn is marked interrupted right away; the transport
    /// call is best-effort and a failure only logs.
    pub async fn interrupt(&mut self) {
        self.dispatch(Action::UserStatus {
            status: UserConversationStatus::Interrupted,
            error_code: None,
        });
        if let Err(err) = self
            .transport
            .interrupt(&self.thread_id, self.agent_id.as_deref())
            .await
        {
            tracing::warn!(thread_id = %self.thread_id, "Interrupt failed: {err}");
        }
    }

    /// Apply one inbound envelope.
    ///
    /// Envelopes addressed to a different thread are dropped; envelopes with
    /// no thread context are broadcasts and always apply.
    pub fn apply(&mut self, envelope: Envelope) {
        if let Some(thread_id) = &envelope.context.thread_id {
            if *thread_id != self.thread_id {
                tracing::debug!(%thread_id, "Dropping event for another thread");
                return;
            }
        }
        for action in event_actions(envelope.event) {
            self.dispatch(action);
        }
    }

    /// Subscribe to the thread's event stream and apply envelopes until the
    /// stream ends or `cancel` fires.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        let mut events = self.transport.subscribe(&self.thread_id).await?;
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                next = events.next() => match next {
                    Some(envelope) => self.apply(envelope),
                    None => {
                        tracing::debug!(thread_id = %self.thread_id, "Event stream ended");
                        break;
                    }
                },
            }
        }
        Ok(())
    }
}

/// Translate one runtime event into the actions it implies, in dispatch
/// order.
fn event_actions(event: AgentEvent) -> Vec<Action> {
    match event {
        AgentEvent::ConversationStart => vec![
            Action::SetAgentStatus {
                status: AgentStatus::Thinking,
            },
            Action::AssistantStatus {
                status: AssistantConversationStatus::Processing,
            },
        ],
        AgentEvent::ConversationThinking => vec![
            Action::SetAgentStatus {
                status: AgentStatus::Thinking,
            },
            Action::AssistantStatus {
                status: AssistantConversationStatus::Thinking,
            },
        ],
        AgentEvent::ConversationResponding => vec![
            Action::SetAgentStatus {
                status: AgentStatus::Responding,
            },
            Action::AssistantStatus {
                status: AssistantConversationStatus::Streaming,
            },
        ],
        AgentEvent::ConversationEnd => vec![
            Action::AssistantFinish,
            Action::SetAgentStatus {
                status: AgentStatus::Idle,
            },
        ],
        AgentEvent::MessageStart { message_id } => {
            vec![Action::AssistantMessageStart { message_id }]
        }
        AgentEvent::TextDelta { delta } => vec![Action::TextDelta { text: delta }],
        AgentEvent::ToolExecuting => vec![Action::SetAgentStatus {
            status: AgentStatus::PlanningTool,
        }],
        AgentEvent::ToolUseStart {
            tool_call_id,
            tool_name,
        } => vec![Action::ToolPlanning {
            tool_call_id,
            tool_name,
        }],
        // The persisted assistant message closes the streamed text; its
        // content was already delivered delta by delta.
        AgentEvent::AssistantMessage { .. } => vec![Action::TextFinish],
        AgentEvent::ToolCallMessage { message } => vec![Action::ToolAdd { message }],
        AgentEvent::ToolResultMessage { message } => vec![Action::ToolResult { message }],
        AgentEvent::ErrorMessage { message } => vec![Action::ErrorConversationAdd { message }],
        AgentEvent::ErrorOccurred {
            code,
            message,
            recoverable,
        } => vec![
            Action::ErrorAdd {
                error: UiError {
                    code: code.clone(),
                    message,
                    recoverable,
                },
            },
            Action::SetAgentStatus {
                status: AgentStatus::Error,
            },
            Action::UserStatus {
                status: UserConversationStatus::Error,
                error_code: Some(code),
            },
        ],
    }
}
