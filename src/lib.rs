//! Builds a product-requirements document from a free-text conversation.
//!
//! Each user message is one turn: the [`session::TurnOrchestrator`] asks a
//! [`provider::CompletionAdapter`] for an extraction, folds it into the running
//! [`prd::PrdDocument`] with [`merge::merge`], and filters the follow-up
//! questions through [`questions::filter`].

pub mod commands;
pub mod config;
pub mod conversation;
pub mod endpoint;
pub mod merge;
pub mod prd;
pub mod provider;
pub mod questions;
pub mod session;
