use std::sync::Arc;

use uuid::Uuid;

use crate::chat::intent::Intent;
use crate::chat::{normalize, FAQ_MIN_OVERLAP};
use crate::database::sqlite::SqliteDatabase;
use crate::errors::Result;
use crate::models::faq::FaqCategory;
use crate::models::language::Language;

/// An accepted FAQ answer.
#[derive(Debug, Clone)]
pub struct FaqMatch {
    pub faq_id: Uuid,
    pub answer: String,
    pub score: f64,
}

/// Category filter applied when searching FAQs for a given intent.
/// `general` (and the error intent) search the whole collection.
pub fn category_for_intent(intent: Intent) -> Option<FaqCategory> {
    match intent {
        Intent::Greeting => Some(FaqCategory::General),
        Intent::Fees => Some(FaqCategory::Fees),
        Intent::Admission => Some(FaqCategory::Admissions),
        Intent::Scholarship => Some(FaqCategory::Scholarships),
        Intent::Academic => Some(FaqCategory::Academics),
        Intent::Library => Some(FaqCategory::Library),
        Intent::Hostel => Some(FaqCategory::Hostel),
        Intent::Contact => Some(FaqCategory::Contact),
        Intent::Placement => Some(FaqCategory::Placements),
        Intent::Facilities => Some(FaqCategory::Facilities),
        Intent::General | Intent::Error => None,
    }
}

/// Word-overlap score between a stored question and the normalized message:
/// matched question words longer than two characters, over the question's
/// total word count.
pub fn overlap_score(question: &str, normalized_message: &str) -> f64 {
    let normalized_question = normalize(question);
    let words: Vec<&str> = normalized_question.split_whitespace().collect();
    if words.is_empty() {
        return 0.0;
    }
    let matched = words
        .iter()
        .filter(|w| w.chars().count() > 2 && normalized_message.contains(**w))
        .count();
    matched as f64 / words.len() as f64
}

/// Search active FAQs for the message. In-language candidates are tried
/// first; an empty candidate set widens to all languages. Accepting a match
/// increments that FAQ's stored access counter.
pub async fn search(
    db: &Arc<SqliteDatabase>,
    normalized_message: &str,
    intent: Intent,
    language: Language,
) -> Result<Option<FaqMatch>> {
    let category = category_for_intent(intent);

    let mut candidates = db.find_active_faqs(Some(language), category).await?;
    if candidates.is_empty() {
        candidates = db.find_active_faqs(None, category).await?;
    }

    let best = candidates
        .into_iter()
        .map(|faq| {
            let score = overlap_score(&faq.question, normalized_message);
            (faq, score)
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));

    match best {
        Some((faq, score)) if score > FAQ_MIN_OVERLAP => {
            db.increment_faq_access(&faq.id).await?;
            Ok(Some(FaqMatch {
                faq_id: faq.id,
                answer: faq.answer,
                score,
            }))
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlap_counts_only_longer_words() {
        // "is" and "an" are too short to count as matches, but still sit in
        // the denominator.
        let score = overlap_score("is an exam hard", "exam hard yes");
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_question_scores_zero() {
        assert_eq!(overlap_score("", "anything"), 0.0);
    }

    #[test]
    fn boundary_score_is_rejected_downstream() {
        // Exactly 1/5 = 0.2 must not be accepted (strictly-greater gate).
        let score = overlap_score("one two3 extra4 filler5 library", "library");
        assert!((score - 0.2).abs() < f64::EPSILON);
        assert!(score <= FAQ_MIN_OVERLAP);
    }

    #[test]
    fn general_intent_omits_category_filter() {
        assert_eq!(category_for_intent(Intent::General), None);
        assert_eq!(category_for_intent(Intent::Fees), Some(FaqCategory::Fees));
    }

    #[tokio::test]
    async fn accepting_a_match_increments_access_count() {
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        let faq = db
            .create_faq(
                "when is the exam timetable published",
                "Two weeks before the window.",
                Language::En,
                FaqCategory::Academics,
                &[],
            )
            .await
            .unwrap();

        let found = search(&db, "when exam timetable published", Intent::Academic, Language::En)
            .await
            .unwrap()
            .expect("match accepted");
        assert_eq!(found.faq_id, faq.id);

        let stored = db.get_faq(&faq.id).await.unwrap().unwrap();
        assert_eq!(stored.access_count, faq.access_count + 1);
    }

    #[tokio::test]
    async fn missing_language_widens_to_all_languages() {
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        db.create_faq(
            "when is the exam timetable published",
            "Two weeks before the window.",
            Language::En,
            FaqCategory::Academics,
            &[],
        )
        .await
        .unwrap();

        let found = search(&db, "when exam timetable published", Intent::Academic, Language::Raj)
            .await
            .unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn weak_overlap_yields_nothing() {
        let db = Arc::new(SqliteDatabase::in_memory().await.unwrap());
        db.create_faq(
            "what scholarship programs are available for sports students",
            "Sports scholarships exist.",
            Language::En,
            FaqCategory::Scholarships,
            &[],
        )
        .await
        .unwrap();

        let found = search(&db, "scholarship", Intent::Scholarship, Language::En)
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
