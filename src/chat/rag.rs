use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::chat::intent::Intent;
use crate::chat::ResponseSource;
use crate::config::AppConfig;
use crate::models::language::Language;

/// Reply shape for the RAG proxy surface.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RagReply {
    pub message: String,
    pub language: Language,
    /// Passed through on the remote service's own scale, no re-normalization.
    pub confidence: f64,
    pub intent: Intent,
    pub entities: Vec<String>,
    pub timestamp: DateTime<Utc>,
    pub source: ResponseSource,
    pub rag_enabled: bool,
}

/// Wire shape of the external chatbot service.
#[derive(Debug, Deserialize)]
pub struct RemoteChatResponse {
    pub response: String,
    pub status: String,
    pub confidence: Option<f64>,
    pub intent: Option<String>,
    pub rag_enabled: bool,
    pub language: Option<Language>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RagHealth {
    pub available: bool,
    pub url: String,
}

/// Client for the external RAG chatbot service with a cached availability
/// flag. The flag only gates an optimization; concurrent refreshes are
/// harmless.
pub struct RagClient {
    base_url: String,
    http: reqwest::Client,
    available: AtomicBool,
    health_timeout: Duration,
    chat_timeout: Duration,
}

impl RagClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            base_url: config.rag_base_url.trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
            available: AtomicBool::new(true),
            health_timeout: Duration::from_secs(config.rag_health_timeout_secs),
            chat_timeout: Duration::from_secs(config.rag_chat_timeout_secs),
        }
    }

    pub fn is_available(&self) -> bool {
        self.available.load(Ordering::Relaxed)
    }

    /// Probe the remote health endpoint and refresh the cached flag.
    pub async fn check_health(&self) -> bool {
        let url = format!("{}/health", self.base_url);
        let ok = match self
            .http
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(_) => false,
        };
        self.available.store(ok, Ordering::Relaxed);
        if ok {
            info!(action = "rag_health", available = true);
        } else {
            warn!(action = "rag_health", available = false, "RAG service unavailable, falling back to local responses");
        }
        ok
    }

    pub async fn health(&self) -> RagHealth {
        let available = self.check_health().await;
        RagHealth {
            available,
            url: self.base_url.clone(),
        }
    }

    /// Send one message to the remote service, degrading to the local
    /// canned apology on any failure.
    pub async fn send_message(
        &self,
        message: &str,
        user_id: &str,
        language: Language,
    ) -> RagReply {
        if !self.is_available() {
            self.check_health().await;
        }
        if !self.is_available() {
            return self.local_fallback(message, language);
        }

        let url = format!("{}/chat", self.base_url);
        let body = serde_json::json!({
            "message": message,
            "user_id": user_id,
            "language": language,
        });

        let response = self
            .http
            .post(&url)
            .timeout(self.chat_timeout)
            .json(&body)
            .send()
            .await;

        let parsed: std::result::Result<RemoteChatResponse, _> = match response {
            Ok(resp) if resp.status().is_success() => resp.json().await,
            Ok(resp) => {
                warn!(action = "rag_send_failed", status = %resp.status());
                self.available.store(false, Ordering::Relaxed);
                return self.local_fallback(message, language);
            }
            Err(e) => {
                warn!(action = "rag_send_failed", error = %e);
                self.available.store(false, Ordering::Relaxed);
                return self.local_fallback(message, language);
            }
        };

        match parsed {
            Ok(remote) if remote.status == "success" => RagReply {
                message: remote.response,
                language: remote.language.unwrap_or(language),
                confidence: remote.confidence.unwrap_or(85.0),
                intent: remote
                    .intent
                    .as_deref()
                    .and_then(Intent::from_code)
                    .unwrap_or_else(|| extract_intent(message)),
                entities: extract_entities(message),
                timestamp: Utc::now(),
                source: if remote.rag_enabled {
                    ResponseSource::RagService
                } else {
                    ResponseSource::RagFallback
                },
                rag_enabled: remote.rag_enabled,
            },
            Ok(remote) => {
                warn!(action = "rag_error_status", status = %remote.status);
                self.local_fallback(message, language)
            }
            Err(e) => {
                warn!(action = "rag_decode_failed", error = %e);
                self.available.store(false, Ordering::Relaxed);
                self.local_fallback(message, language)
            }
        }
    }

    fn local_fallback(&self, message: &str, language: Language) -> RagReply {
        let text = match language {
            Language::En => {
                "I'm Saarthi, your JECRC chatbot. I'm currently experiencing some technical difficulties with my advanced features, but I'm here to help with basic queries about JECRC Foundation."
            }
            Language::Hi => {
                "मैं सारथी हूं, आपका JECRC चैटबॉट। वर्तमान में मेरी उन्नत सुविधाओं में कुछ तकनीकी कठिनाइयां हैं, लेकिन मैं JECRC Foundation के बारे में बुनियादी प्रश्नों में मदद के लिए यहां हूं।"
            }
            Language::Raj => {
                "म्हूं सारथी हूं, थारो JECRC चैटबॉट। अभी म्हारी कुछ तकनीकी समस्या है, पण JECRC Foundation के बारे में सामान्य सवालों में म्हूं मदद कर सकूं हूं।"
            }
        };
        RagReply {
            message: text.to_string(),
            language,
            confidence: 0.5,
            intent: extract_intent(message),
            entities: Vec::new(),
            timestamp: Utc::now(),
            source: ResponseSource::LocalFallback,
            rag_enabled: false,
        }
    }
}

static ACADEMIC_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"course|syllabus|exam|marks|grade|result|academic|study|subject|class").unwrap()
});
static ADMISSION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"admission|apply|eligibility|entrance|cutoff|seat|selection").unwrap());
static FEES_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"fee|payment|cost|charge|scholarship|financial").unwrap());
static HOSTEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"hostel|accommodation|room|mess|warden|stay").unwrap());
static PLACEMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"placement|job|company|recruit|career|interview").unwrap());
static CAMPUS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"campus|facility|library|lab|infrastructure").unwrap());

/// Local intent guess for RAG replies that come back without one.
pub fn extract_intent(message: &str) -> Intent {
    let lower = message.to_lowercase();
    if ACADEMIC_RE.is_match(&lower) {
        Intent::Academic
    } else if ADMISSION_RE.is_match(&lower) {
        Intent::Admission
    } else if FEES_RE.is_match(&lower) {
        Intent::Fees
    } else if HOSTEL_RE.is_match(&lower) {
        Intent::Hostel
    } else if PLACEMENT_RE.is_match(&lower) {
        Intent::Placement
    } else if CAMPUS_RE.is_match(&lower) {
        Intent::Facilities
    } else {
        Intent::General
    }
}

const DEPARTMENTS: [&str; 10] = [
    "cse",
    "it",
    "ece",
    "me",
    "ce",
    "computer science",
    "information technology",
    "mechanical",
    "civil",
    "electronics",
];

static YEAR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(first|second|third|fourth|1st|2nd|3rd|4th|\d+)?\s*(year|semester)\b")
        .unwrap()
});

/// Department and academic-year entities mentioned in the message.
pub fn extract_entities(message: &str) -> Vec<String> {
    let lower = message.to_lowercase();
    let mut entities: Vec<String> = DEPARTMENTS
        .iter()
        .filter(|d| lower.contains(**d))
        .map(|d| format!("department:{d}"))
        .collect();

    if let Some(m) = YEAR_RE.find(message) {
        entities.push(format!("academic_year:{}", m.as_str().trim()));
    }

    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_client() -> RagClient {
        let config = AppConfig {
            port: 0,
            database_path: String::new(),
            jwt_secret: "test".to_string(),
            frontend_url: String::new(),
            // Nothing listens here; the probe fails fast.
            rag_base_url: "http://127.0.0.1:9".to_string(),
            rag_health_timeout_secs: 1,
            rag_chat_timeout_secs: 1,
            rate_limit_per_sec: 5,
        };
        RagClient::new(&config)
    }

    #[tokio::test]
    async fn failed_probe_degrades_to_language_apology() {
        let client = unreachable_client();
        for lang in Language::all() {
            let reply = client.send_message("hostel fees?", "test-user", lang).await;
            assert!(!reply.rag_enabled);
            assert_eq!(reply.source, ResponseSource::LocalFallback);
            assert_eq!(reply.language, lang);
            assert!(reply.message.contains("सारथी") || reply.message.contains("Saarthi"));
        }
        assert!(!client.is_available());
    }

    #[test]
    fn intent_regexes_follow_priority_order() {
        assert_eq!(extract_intent("exam results please"), Intent::Academic);
        assert_eq!(extract_intent("hostel stay options"), Intent::Hostel);
        assert_eq!(extract_intent("how is the campus"), Intent::Facilities);
        assert_eq!(extract_intent("zzz"), Intent::General);
    }

    #[test]
    fn entities_pick_up_departments_and_years() {
        let entities = extract_entities("CSE second year hostel");
        assert!(entities.contains(&"department:cse".to_string()));
        assert!(entities.iter().any(|e| e.starts_with("academic_year:")));
    }
}
