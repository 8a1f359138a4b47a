//! # confab-core
//!
//! Conversation state, protocol events, and the event reducer.
//!
//! This crate provides the vocabulary the rest of the workspace builds on:
//!
//! - **Messages**: [`messages::Message`] and the open [`messages::Role`] enum
//! - **Events**: [`events::Event`], the tagged protocol union with a
//!   forward-compatible passthrough variant
//! - **State**: [`state::ConversationState`], the reconciled transcript plus
//!   opaque side-state and run-lifecycle flag
//! - **Reduction**: [`reducer::reduce`], the total function that folds one
//!   event into the state
//!
//! ## Crate Position
//!
//! Foundation crate. Depended on by `confab-client`; no dependency on any
//! transport or I/O.

#![deny(unsafe_code)]

pub mod events;
pub mod messages;
pub mod reducer;
pub mod state;

pub use events::{BaseEvent, Event};
pub use messages::{Message, Role};
pub use reducer::reduce;
pub use state::{ConversationState, RunIds};
