//! ChatIRIS backend: a colorectal cancer screening assistant that tracks the
//! user's health beliefs while answering from a local document index.

pub mod agents;
pub mod beliefs;
pub mod chat;
pub mod core;
pub mod llm;
pub mod pipeline;
pub mod rag;
pub mod server;
pub mod state;
