//! Conversation runtime for the rental sales assistant.
//!
//! A turn flows through a constrained loop:
//! 1. **Intent** (`intent`) - classify the latest user message
//! 2. **State** (`conversation`, `slots`) - rebuild what the client already told us
//! 3. **Guardrails** (`guardrails`) - keep replies from repeating or resetting
//! 4. **Reply** (`runtime`) - canned template, deterministic quote, or generated text
//!
//! The language model only phrases replies. Packs, quantities and prices
//! always come from `soundrent_core`.

pub mod catalog;
pub mod conversation;
pub mod draft;
pub mod guardrails;
pub mod intent;
pub mod llm;
pub mod preamble;
pub mod runtime;
pub mod slots;
pub mod templates;

pub use catalog::{CatalogClient, CatalogEntry, InMemoryCatalog};
pub use conversation::{ConversationState, Message, MessageKind, Role, SideChannel, StateBuilder};
pub use guardrails::{GuardrailDecision, GuardrailPolicy};
pub use intent::{Intent, IntentCategory, IntentClassifier};
pub use llm::{client_from_config, LlmClient, OllamaClient, OpenAiClient, StaticLlmClient};
pub use runtime::{AgentRuntime, Clock, FixedClock, SystemClock, TurnError, TurnReply, TurnRequest};
