//! OCR: turn a rasterised page into plain text.
//!
//! The extractor talks to a [`PageRecognizer`]; the default implementation,
//! [`VisionRecognizer`], sends the page to a vision-capable LLM through
//! `edgequake-llm` and asks for a verbatim transcription.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from LLM APIs are transient. Exponential backoff
//! (`retry_backoff_ms * 2^attempt`) with the default 500 ms base and 2 retries
//! waits 500 ms → 1 s before giving up on a page. A page that still fails
//! becomes a [`PageError`]; the rest of the document carries on.

use super::{encode, postprocess};
use crate::config::ImportConfig;
use crate::error::{ImportError, PageError};
use crate::prompts::{page_instruction, OCR_SYSTEM_PROMPT};
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use image::DynamicImage;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Model used when a provider is named without one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-nano";

/// Image-to-text capability for one page.
pub trait PageRecognizer: Send + Sync {
    /// Transcribe page `page_num` (1-indexed) of `total_pages`.
    fn recognize<'a>(
        &'a self,
        page_num: usize,
        total_pages: usize,
        image: &'a DynamicImage,
    ) -> BoxFuture<'a, Result<String, PageError>>;
}

/// [`PageRecognizer`] backed by a vision LLM.
pub struct VisionRecognizer {
    provider: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    max_retries: u32,
    retry_backoff_ms: u64,
}

impl VisionRecognizer {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &ImportConfig) -> Self {
        Self {
            provider,
            options: build_options(config),
            max_retries: config.max_retries,
            retry_backoff_ms: config.retry_backoff_ms,
        }
    }

    /// Resolve a provider from `config` and the environment.
    pub fn from_config(config: &ImportConfig) -> Result<Self, ImportError> {
        Ok(Self::new(resolve_provider(config)?, config))
    }

    async fn transcribe(
        &self,
        page_num: usize,
        total_pages: usize,
        image: &DynamicImage,
    ) -> Result<String, PageError> {
        let start = Instant::now();
        let image_data = encode::encode_page(image).map_err(|e| PageError::RenderFailed {
            page: page_num,
            detail: format!("image encoding failed: {e}"),
        })?;

        let instruction = page_instruction(page_num, total_pages);
        let messages = vec![
            ChatMessage::system(OCR_SYSTEM_PROMPT),
            ChatMessage::user_with_images(&instruction, vec![image_data]),
        ];

        let mut last_err: Option<String> = None;
        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let backoff = self.retry_backoff_ms * 2u64.pow(attempt - 1);
                warn!(
                    "Page {}: OCR retry {}/{} after {}ms",
                    page_num, attempt, self.max_retries, backoff
                );
                sleep(Duration::from_millis(backoff)).await;
            }

            match self.provider.chat(&messages, Some(&self.options)).await {
                Ok(response) => {
                    debug!(
                        "Page {}: {} output tokens in {:?}",
                        page_num,
                        response.completion_tokens,
                        start.elapsed()
                    );
                    return Ok(postprocess::clean_transcription(&response.content));
                }
                Err(e) => {
                    warn!("Page {}: OCR attempt {} failed: {}", page_num, attempt + 1, e);
                    last_err = Some(e.to_string());
                }
            }
        }

        Err(PageError::RecognitionFailed {
            page: page_num,
            retries: u8::try_from(self.max_retries).unwrap_or(u8::MAX),
            detail: last_err.unwrap_or_else(|| "unknown error".to_string()),
        })
    }
}

impl PageRecognizer for VisionRecognizer {
    fn recognize<'a>(
        &'a self,
        page_num: usize,
        total_pages: usize,
        image: &'a DynamicImage,
    ) -> BoxFuture<'a, Result<String, PageError>> {
        Box::pin(self.transcribe(page_num, total_pages, image))
    }
}

fn build_options(config: &ImportConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, ImportError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        ImportError::ExtractionUnavailable {
            collaborator: format!("OCR provider '{provider_name}'"),
            detail: e.to_string(),
        }
    })
}

/// Resolve the vision provider, from most-specific to least-specific:
///
/// 1. the pre-built `config.provider`
/// 2. `config.provider_name` with `config.model` (or [`DEFAULT_MODEL`])
/// 3. `EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`, when both are set
/// 4. OpenAI, when `OPENAI_API_KEY` is set
/// 5. whatever `ProviderFactory::from_env` detects
pub fn resolve_provider(config: &ImportConfig) -> Result<Arc<dyn LLMProvider>, ImportError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);
    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            return create_vision_provider(&prov, &env_model);
        }
    }

    if std::env::var("OPENAI_API_KEY").is_ok_and(|key| !key.is_empty()) {
        return create_vision_provider("openai", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| ImportError::ExtractionUnavailable {
            collaborator: "OCR provider".to_string(),
            detail: format!(
                "no vision provider could be detected from the environment. \
                Set OPENAI_API_KEY or ANTHROPIC_API_KEY, or pass --provider. ({e})"
            ),
        })?;
    Ok(llm_provider)
}
