//! Inbox Router: LLM-assisted email triage for a customer-service back office.

pub mod analysis;
pub mod config;
pub mod email;
pub mod error;
pub mod llm;
pub mod pipeline;
