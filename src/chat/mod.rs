//! Chat response resolution pipeline: language detection, intent scoring,
//! enhanced-knowledge lookup, FAQ search, canned fallbacks, and the
//! orchestrator that chains them.

pub mod fallback;
pub mod faq_search;
pub mod intent;
pub mod knowledge;
pub mod language;
pub mod rag;

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::database::sqlite::SqliteDatabase;
use crate::errors::Result;
use crate::models::language::Language;

use self::intent::{Classification, Intent};

/// Internal bar inside the knowledge responder's direct entry point:
/// a category match above this is preferred over the generic fallback.
pub const KNOWLEDGE_PREFER_THRESHOLD: f64 = 0.3;

/// Orchestrator acceptance bar for knowledge answers. Deliberately distinct
/// from `KNOWLEDGE_PREFER_THRESHOLD`; the source system used both literals
/// at adjacent decision points.
pub const KNOWLEDGE_ACCEPT_THRESHOLD: f64 = 0.5;

/// Minimum word-overlap score for a FAQ match (strictly exceeded).
pub const FAQ_MIN_OVERLAP: f64 = 0.2;

/// Fixed confidence reported for an accepted FAQ answer.
pub const FAQ_CONFIDENCE: f64 = 0.7;

/// Fixed confidence when the canned fallback is invoked directly by the
/// knowledge responder.
pub const FALLBACK_DIRECT_CONFIDENCE: f64 = 0.6;

/// Fixed confidence when the canned fallback terminates the orchestrator.
pub const FALLBACK_TERMINAL_CONFIDENCE: f64 = 0.8;

/// Where a reply came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResponseSource {
    EnhancedKnowledge,
    FaqDatabase,
    EnhancedFallback,
    FallbackResponse,
    ErrorHandler,
    RagService,
    RagFallback,
    LocalFallback,
}

impl ResponseSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseSource::EnhancedKnowledge => "enhanced_knowledge",
            ResponseSource::FaqDatabase => "faq_database",
            ResponseSource::EnhancedFallback => "enhanced_fallback",
            ResponseSource::FallbackResponse => "fallback_response",
            ResponseSource::ErrorHandler => "error_handler",
            ResponseSource::RagService => "rag_service",
            ResponseSource::RagFallback => "rag_fallback",
            ResponseSource::LocalFallback => "local_fallback",
        }
    }
}

/// A single responder's answer, before the orchestrator's acceptance check.
#[derive(Debug, Clone)]
pub struct ResponderAnswer {
    pub text: String,
    pub confidence: f64,
    pub source: ResponseSource,
}

/// Everything a responder may look at for one message.
pub struct ResponderRequest<'a> {
    pub raw: &'a str,
    pub normalized: &'a str,
    pub language: Language,
    pub intent: Intent,
}

/// One stage of the fallback chain. Stages are iterated in order until one
/// yields an answer whose confidence strictly exceeds the stage's own
/// acceptance threshold.
#[axum::async_trait]
pub trait Responder: Send + Sync {
    fn name(&self) -> &'static str;

    /// An answer is accepted when its confidence strictly exceeds this.
    fn acceptance_threshold(&self) -> f64;

    async fn attempt(&self, request: &ResponderRequest<'_>) -> Result<Option<ResponderAnswer>>;
}

/// The bot's reply to one message.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatReply {
    pub message: String,
    pub language: Language,
    pub confidence: f64,
    pub intent: Intent,
    pub entities: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub source: ResponseSource,
}

/// Lower-case, strip non-word characters, collapse whitespace.
pub fn normalize(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    let mut last_was_space = true;
    for c in message.to_lowercase().chars() {
        if c.is_alphanumeric() {
            out.push(c);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    while out.ends_with(' ') {
        out.pop();
    }
    out
}

struct KnowledgeStrategy;

#[axum::async_trait]
impl Responder for KnowledgeStrategy {
    fn name(&self) -> &'static str {
        "enhanced_knowledge"
    }

    fn acceptance_threshold(&self) -> f64 {
        KNOWLEDGE_ACCEPT_THRESHOLD
    }

    async fn attempt(&self, request: &ResponderRequest<'_>) -> Result<Option<ResponderAnswer>> {
        // The keyword scan sees the raw message; normalization would merge
        // some Devanagari keyword boundaries.
        Ok(knowledge::best_match(request.raw).map(|m| ResponderAnswer {
            text: m.category.answer(request.language).to_string(),
            confidence: m.confidence,
            source: ResponseSource::EnhancedKnowledge,
        }))
    }
}

struct FaqStrategy {
    db: Arc<SqliteDatabase>,
}

#[axum::async_trait]
impl Responder for FaqStrategy {
    fn name(&self) -> &'static str {
        "faq_database"
    }

    fn acceptance_threshold(&self) -> f64 {
        // The overlap gate lives inside the search itself.
        0.0
    }

    async fn attempt(&self, request: &ResponderRequest<'_>) -> Result<Option<ResponderAnswer>> {
        let matched = faq_search::search(
            &self.db,
            request.normalized,
            request.intent,
            request.language,
        )
        .await?;
        Ok(matched.map(|m| ResponderAnswer {
            text: m.answer,
            confidence: FAQ_CONFIDENCE,
            source: ResponseSource::FaqDatabase,
        }))
    }
}

struct FallbackStrategy;

#[axum::async_trait]
impl Responder for FallbackStrategy {
    fn name(&self) -> &'static str {
        "enhanced_fallback"
    }

    fn acceptance_threshold(&self) -> f64 {
        0.0
    }

    async fn attempt(&self, request: &ResponderRequest<'_>) -> Result<Option<ResponderAnswer>> {
        Ok(Some(fallback::terminal(request.language, request.intent)))
    }
}

/// Orchestrates one message through the ordered responder chain.
pub struct ChatEngine {
    responders: Vec<Box<dyn Responder>>,
}

impl ChatEngine {
    pub fn new(db: Arc<SqliteDatabase>) -> Self {
        Self {
            responders: vec![
                Box::new(KnowledgeStrategy),
                Box::new(FaqStrategy { db }),
                Box::new(FallbackStrategy),
            ],
        }
    }

    /// Resolve one incoming message into a reply. Never fails: any internal
    /// error is converted into a canned error reply.
    pub async fn process_message(
        &self,
        message: &str,
        language: Option<Language>,
        session_id: Uuid,
    ) -> ChatReply {
        let started = Instant::now();
        let resolved = language.unwrap_or_else(|| language::detect(message));

        match self.try_process(message, resolved).await {
            Ok(reply) => {
                info!(
                    action = "chat_reply",
                    session_id = %session_id,
                    source = reply.source.as_str(),
                    intent = reply.intent.as_str(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                );
                reply
            }
            Err(e) => {
                error!(action = "chat_processing_failed", session_id = %session_id, error = %e);
                error_reply(resolved)
            }
        }
    }

    async fn try_process(&self, message: &str, language: Language) -> Result<ChatReply> {
        let normalized = normalize(message);
        // The classifier's own confidence is discarded here; per-stage
        // confidences drive the chain.
        let Classification {
            intent, entities, ..
        } = intent::classify(&normalized);

        let request = ResponderRequest {
            raw: message,
            normalized: &normalized,
            language,
            intent,
        };

        for responder in &self.responders {
            if let Some(answer) = responder.attempt(&request).await? {
                if answer.confidence <= responder.acceptance_threshold() {
                    debug!(
                        responder = responder.name(),
                        confidence = answer.confidence,
                        "answer below acceptance threshold, trying next stage"
                    );
                } else {
                    return Ok(ChatReply {
                        message: answer.text,
                        language,
                        confidence: answer.confidence,
                        intent,
                        entities,
                        timestamp: Utc::now(),
                        source: answer.source,
                    });
                }
            }
        }

        // The terminal fallback always answers; reaching this point means
        // the chain was misconfigured.
        Err(crate::errors::AppError::InternalError(
            "no responder produced an answer".to_string(),
        ))
    }
}

/// Canned reply for the top-level catch. The only path that must never
/// itself fail.
pub fn error_reply(language: Language) -> ChatReply {
    let message = match language {
        Language::En => {
            "I apologize, but I'm experiencing technical difficulties. Please try again later or contact support."
        }
        Language::Hi => "क्षमा करें, मुझे तकनीकी कठिनाई हो रही है। कृपया बाद में पुनः प्रयास करें।",
        Language::Raj => "माफ करजो, अभी तकनीकी समस्या है। थोड़ी देर बाद फेर कोशिश करजो।",
    };
    ChatReply {
        message: message.to_string(),
        language,
        confidence: 0.0,
        intent: Intent::Error,
        entities: Vec::new(),
        timestamp: Utc::now(),
        source: ResponseSource::ErrorHandler,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::faq::FaqCategory;

    #[test]
    fn normalize_strips_punctuation_and_collapses_whitespace() {
        assert_eq!(normalize("What   are the Hostel-Fees?!"), "what are the hostel fees");
        assert_eq!(normalize("  "), "");
    }

    #[test]
    fn normalize_keeps_devanagari_letters() {
        assert_eq!(normalize("फीस कितनी है?"), "फीस कितनी है");
    }

    async fn engine_with_memory_db() -> (ChatEngine, Arc<SqliteDatabase>) {
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        (ChatEngine::new(db.clone()), db)
    }

    #[tokio::test]
    async fn hostel_fees_short_circuits_on_knowledge() {
        let (engine, _db) = engine_with_memory_db().await;
        let reply = engine
            .process_message("What are the hostel fees?", Some(Language::En), Uuid::new_v4())
            .await;
        assert_eq!(reply.source, ResponseSource::EnhancedKnowledge);
        assert!(reply.confidence > 0.5);
        assert!(matches!(reply.intent, Intent::Fees | Intent::Hostel));
    }

    #[tokio::test]
    async fn unmatched_raj_message_hits_terminal_fallback() {
        let (engine, _db) = engine_with_memory_db().await;
        let reply = engine
            .process_message("zzz qqq", Some(Language::Raj), Uuid::new_v4())
            .await;
        assert_eq!(reply.source, ResponseSource::EnhancedFallback);
        assert!((reply.confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(reply.language, Language::Raj);
        assert_eq!(reply.message, fallback::fallback_text(Language::Raj, Intent::General));
    }

    #[tokio::test]
    async fn faq_answer_beats_terminal_fallback() {
        let (engine, db) = engine_with_memory_db().await;
        // No knowledge-base keyword appears here, so the chain reaches the
        // FAQ stage.
        db.create_faq(
            "when is the exam timetable published",
            "The exam timetable is published two weeks before each exam window.",
            Language::En,
            FaqCategory::Academics,
            &["exam".to_string(), "timetable".to_string()],
        )
        .await
        .unwrap();

        let reply = engine
            .process_message(
                "when will the exam timetable be published",
                Some(Language::En),
                Uuid::new_v4(),
            )
            .await;
        assert_eq!(reply.source, ResponseSource::FaqDatabase);
        assert!((reply.confidence - FAQ_CONFIDENCE).abs() < f64::EPSILON);
        assert!(reply.message.contains("two weeks"));
    }

    #[tokio::test]
    async fn caller_language_wins_over_detection() {
        let (engine, _db) = engine_with_memory_db().await;
        let reply = engine
            .process_message("zzz qqq", Some(Language::Hi), Uuid::new_v4())
            .await;
        assert_eq!(reply.language, Language::Hi);
    }
}
