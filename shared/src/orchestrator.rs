//! Concept generation entry point: context assembly, prompt, model call.

use std::time::{Duration, Instant};
use tracing::info;

use crate::context;
use crate::error::ValidationError;
use crate::invoker::{DegradeReason, GenerationInvoker};
use crate::llm::TextGenerator;
use crate::models::{GenerateRequest, GenerateResponse, GeneratedContent};
use crate::prompt::build_prompt;
use crate::templates::TemplateRegistry;
use crate::Result;

/// Everything the caller gets back from a generation.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub content: GeneratedContent,
    pub duration: Duration,
    pub sources: Vec<String>,
    pub degraded: Option<DegradeReason>,
}

impl From<GenerationResult> for GenerateResponse {
    fn from(result: GenerationResult) -> Self {
        Self {
            content: result.content,
            duration: result.duration.as_millis() as u64,
            sources: result.sources,
        }
    }
}

/// Sequences validation, context assembly, prompt building and invocation.
///
/// Holds no per-request state; one instance serves every request.
pub struct Orchestrator<G> {
    registry: &'static TemplateRegistry,
    invoker: GenerationInvoker<G>,
}

impl<G: TextGenerator> Orchestrator<G> {
    pub fn new(registry: &'static TemplateRegistry, generator: G, timeout: Duration) -> Self {
        Self {
            registry,
            invoker: GenerationInvoker::new(generator, timeout),
        }
    }

    /// Only validation failures are returned as errors; generation problems
    /// come back as placeholder content with `degraded` set.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerationResult> {
        let started = Instant::now();

        let template_id = request
            .template_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(ValidationError::MissingTemplateId)?;

        let template = self
            .registry
            .find(template_id)
            .ok_or_else(|| ValidationError::UnknownTemplate(template_id.to_string()))?;

        let assembled = context::assemble(request)?;
        let prompt = build_prompt(template, &assembled.text);

        info!(
            template_id = %template.id,
            entry_type = request.entry_type.as_str(),
            sources = assembled.sources.len(),
            "Generating concept"
        );

        let outcome = self.invoker.invoke(&prompt, template).await;
        let duration = started.elapsed();

        info!(
            template_id = %template.id,
            duration_ms = duration.as_millis() as u64,
            degraded = outcome.degraded.is_some(),
            "Concept generation complete"
        );

        Ok(GenerationResult {
            content: outcome.content,
            duration,
            sources: assembled.sources,
            degraded: outcome.degraded,
        })
    }
}
