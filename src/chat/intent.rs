use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Coarse topic label for a user message, from a fixed vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Greeting,
    Fees,
    Admission,
    Scholarship,
    Academic,
    Library,
    Hostel,
    Contact,
    Placement,
    Facilities,
    General,
    /// Produced only by the orchestrator's catch-all error path.
    Error,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::Greeting => "greeting",
            Intent::Fees => "fees",
            Intent::Admission => "admission",
            Intent::Scholarship => "scholarship",
            Intent::Academic => "academic",
            Intent::Library => "library",
            Intent::Hostel => "hostel",
            Intent::Contact => "contact",
            Intent::Placement => "placement",
            Intent::Facilities => "facilities",
            Intent::General => "general",
            Intent::Error => "error",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "greeting" => Some(Intent::Greeting),
            "fees" => Some(Intent::Fees),
            "admission" => Some(Intent::Admission),
            "scholarship" => Some(Intent::Scholarship),
            "academic" => Some(Intent::Academic),
            "library" => Some(Intent::Library),
            "hostel" => Some(Intent::Hostel),
            "contact" => Some(Intent::Contact),
            "placement" => Some(Intent::Placement),
            "facilities" => Some(Intent::Facilities),
            "general" => Some(Intent::General),
            "error" => Some(Intent::Error),
            _ => None,
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword bag per scorable intent, scanned in this order. Ties keep the
/// earlier entry.
const INTENT_KEYWORDS: [(Intent, &[&str]); 10] = [
    (
        Intent::Greeting,
        &["hello", "hey", "namaste", "namaskar", "khamma", "good morning", "good evening"],
    ),
    (
        Intent::Fees,
        &["fee", "fees", "payment", "due", "charge", "cost", "amount", "shulk", "फीस"],
    ),
    (
        Intent::Admission,
        &["admission", "apply", "eligibility", "entrance", "cutoff", "seat", "pravesh", "dakhla", "प्रवेश", "दाखला"],
    ),
    (
        Intent::Scholarship,
        &["scholarship", "waiver", "chhatravritti", "छात्रवृत्ति"],
    ),
    (
        Intent::Academic,
        &["marks", "grade", "result", "exam", "syllabus", "subject", "semester", "class"],
    ),
    (
        Intent::Library,
        &["library", "book", "journal", "reading", "लाइब्रेरी"],
    ),
    (
        Intent::Hostel,
        &["hostel", "accommodation", "mess", "warden", "हॉस्टल", "छात्रावास"],
    ),
    (
        Intent::Contact,
        &["contact", "phone", "email", "address", "helpline", "संपर्क"],
    ),
    (
        Intent::Placement,
        &["placement", "job", "career", "company", "recruit", "salary", "package", "नौकरी"],
    ),
    (
        Intent::Facilities,
        &["facility", "facilities", "lab", "campus", "infrastructure", "sports", "wifi", "transport", "सुविधा"],
    ),
];

/// What the classifier knows about a message.
#[derive(Debug, Clone)]
pub struct Classification {
    pub intent: Intent,
    pub confidence: f64,
    pub entities: Vec<String>,
}

/// Score a normalized message against the fixed intent vocabulary.
///
/// The intent with the most keyword substring hits wins; zero hits yield
/// `general`. Confidence is `min(0.9, hits * 0.3)`, or `0.1` with no hits.
/// Entities are the maximal digit runs found in the text.
pub fn classify(normalized: &str) -> Classification {
    let mut best: Option<(Intent, usize)> = None;

    for (intent, keywords) in INTENT_KEYWORDS.iter() {
        let hits = keywords.iter().filter(|k| normalized.contains(*k)).count();
        if hits > best.map_or(0, |(_, h)| h) {
            best = Some((*intent, hits));
        }
    }

    match best {
        Some((intent, hits)) => Classification {
            intent,
            confidence: f64::min(0.9, hits as f64 * 0.3),
            entities: extract_numbers(normalized),
        },
        None => Classification {
            intent: Intent::General,
            confidence: 0.1,
            entities: extract_numbers(normalized),
        },
    }
}

/// All maximal runs of ASCII digits in the text.
pub fn extract_numbers(text: &str) -> Vec<String> {
    let mut runs = Vec::new();
    let mut current = String::new();
    for c in text.chars() {
        if c.is_ascii_digit() {
            current.push(c);
        } else if !current.is_empty() {
            runs.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_hits_yields_general_at_point_one() {
        let c = classify("zzz qqq");
        assert_eq!(c.intent, Intent::General);
        assert!((c.confidence - 0.1).abs() < f64::EPSILON);
        assert!(c.entities.is_empty());
    }

    #[test]
    fn hostel_fees_resolves_by_hit_count() {
        // "fees" also contains "fee", so the fees bag scores two hits
        // against hostel's one.
        let c = classify("what are the hostel fees");
        assert_eq!(c.intent, Intent::Fees);
        assert!((c.confidence - 0.6).abs() < 1e-9);
    }

    #[test]
    fn confidence_caps_at_point_nine() {
        let c = classify("fee fees payment due charge cost amount");
        assert_eq!(c.intent, Intent::Fees);
        assert!((c.confidence - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn ties_keep_enumeration_order() {
        // One hit each for fees ("payment") and placement ("job"):
        // fees is enumerated first and wins.
        let c = classify("payment job");
        assert_eq!(c.intent, Intent::Fees);
    }

    #[test]
    fn digit_runs_become_entities() {
        let c = classify("semester 5 starts 2024 room 101");
        assert_eq!(c.entities, vec!["5", "2024", "101"]);
    }
}
