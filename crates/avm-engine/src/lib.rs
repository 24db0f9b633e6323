//! avm-engine: the pure conversation engine
//!
//! Two components, both free of I/O, compose into the engine:
//!
//! - [`history::reconstruct`] turns a flat persisted message log into the
//!   turn-structured view a user sees on first open.
//! - [`reducer::reduce`] folds one [`Action`] at a time into a
//!   [`ConversationState`], driven by an external single-threaded dispatch
//!   loop.
//!
//! The two agree bit-for-bit on turn-grouping semantics: replaying a log
//! through the reconstructor and streaming the equivalent live actions
//! through the reducer produce the same conversation structure.

pub mod action;
pub mod env;
pub mod history;
pub mod reducer;
pub mod state;

pub use action::Action;
pub use env::{Env, FixedEnv, SystemEnv};
pub use history::HistoryView;
pub use reducer::reduce;
pub use state::ConversationState;
