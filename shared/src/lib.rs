//! Shared library for the concept card Lambda functions.
//!
//! The core is the generation pipeline: an entry's payload is assembled into
//! context ([`context`]), turned into an instruction ([`prompt`]), sent to the
//! text-generation service ([`llm`]) and recovered into template fields
//! ([`invoker`]), all sequenced by [`orchestrator`]. Search, image and history
//! are the surrounding collaborators.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod history;
pub mod http;
pub mod image;
pub mod invoker;
pub mod llm;
pub mod models;
pub mod orchestrator;
pub mod prompt;
pub mod search;
pub mod secrets;
pub mod templates;

pub use config::Config;
pub use error::{Error, Result, ValidationError};
pub use history::{HistoryStore, InMemoryHistoryStore, PgHistoryStore};
pub use image::{ImageGenerator, ImageService, OpenAiImageClient};
pub use invoker::{DegradeReason, GenerationInvoker, GenerationOutcome};
pub use llm::{OpenAiChatClient, TextGenerator};
pub use models::{
    EntryType, GenerateRequest, GenerateResponse, GeneratedContent, HistoryPage, HistoryRecord,
    ImageRequest, ImageResponse, NewHistoryRecord, SearchHit, SearchRequest, SearchResponse,
};
pub use orchestrator::{GenerationResult, Orchestrator};
pub use search::SearchClient;
pub use secrets::{key_or_none, resolve_api_key};
pub use templates::{Field, Template, TemplateRegistry};
