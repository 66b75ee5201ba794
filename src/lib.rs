//! # docchat
//!
//! A retrieval-augmented chat CLI over a local directory of text documents.
//!
//! docchat loads every `.txt` file in a docs directory at startup, and for
//! each user turn retrieves the documents sharing the most words with the
//! query, injects them as system messages ahead of the running transcript,
//! and streams a reply from an OpenAI-style chat completions endpoint.
//!
//! ```text
//! user input ──▶ transcript ──▶ retriever ──▶ request assembly
//!                                                  │
//!      transcript ◀── assistant reply ◀── streamed completion
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! mkdir docs && cp notes/*.txt docs/
//! export OPENAI_API_KEY=sk-...
//! docchat chat                    # interactive session
//! docchat ask "what is a cat?"    # one-shot question
//! docchat retrieve "cat dog"      # inspect retrieval
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`store`] | In-memory document store |
//! | [`retrieve`] | Bag-of-words overlap retriever |
//! | [`session`] | Transcript and turn state machine |
//! | [`completion`] | Streaming completion client |
//! | [`chat`] | Command drivers |

pub mod chat;
pub mod completion;
pub mod config;
pub mod models;
pub mod retrieve;
pub mod session;
pub mod store;
