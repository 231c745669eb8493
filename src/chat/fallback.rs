use crate::chat::intent::Intent;
use crate::chat::{
    ResponderAnswer, ResponseSource, FALLBACK_DIRECT_CONFIDENCE, FALLBACK_TERMINAL_CONFIDENCE,
};
use crate::models::language::Language;

/// Last-ditch apology when even the per-language defaults are unavailable.
const HARDCODED_APOLOGY: &str =
    "I apologize, but I could not understand your question. Please try asking in a different way.";

/// Resolve the canned text for a language + intent with the full cascade:
/// intent entry in the requested language, then that language's default,
/// then the English default, then the hardcoded apology.
pub fn fallback_text(language: Language, intent: Intent) -> &'static str {
    intent_text(language, intent)
        .or_else(|| default_text(language))
        .or_else(|| default_text(Language::En))
        .unwrap_or(HARDCODED_APOLOGY)
}

/// Generic fallback as invoked directly by the knowledge responder.
pub fn direct(language: Language, intent: Intent) -> ResponderAnswer {
    ResponderAnswer {
        text: fallback_text(language, intent).to_string(),
        confidence: FALLBACK_DIRECT_CONFIDENCE,
        source: ResponseSource::FallbackResponse,
    }
}

/// Terminal fallback at the end of the orchestrator chain.
pub fn terminal(language: Language, intent: Intent) -> ResponderAnswer {
    ResponderAnswer {
        text: fallback_text(language, intent).to_string(),
        confidence: FALLBACK_TERMINAL_CONFIDENCE,
        source: ResponseSource::EnhancedFallback,
    }
}

fn intent_text(language: Language, intent: Intent) -> Option<&'static str> {
    let text = match (language, intent) {
        (Language::En, Intent::Greeting) => {
            "Hello! I'm here to help you with JECRC Foundation queries."
        }
        (Language::En, Intent::Admission) => {
            "For admission information, please check our admissions office or website."
        }
        (Language::En, Intent::Fees) => {
            "Fee structure varies by course. Please contact the accounts department."
        }
        (Language::En, Intent::Library) => {
            "Our library is open from 8 AM to 8 PM with extensive resources."
        }
        (Language::En, Intent::Hostel) => {
            "JECRC provides separate hostels for boys and girls with modern amenities. Facilities include furnished rooms, mess with vegetarian meals, Wi-Fi, common rooms, gym, and 24/7 security. Hostel fees range from ₹60,000 to ₹80,000 per year including meals. Medical facilities and recreational activities are also available."
        }
        (Language::En, Intent::Scholarship) => {
            "Multiple scholarship programs are available based on merit and need."
        }
        (Language::Hi, Intent::Greeting) => {
            "नमस्ते! मैं JECRC Foundation के प्रश्नों में आपकी सहायता के लिए यहाँ हूँ।"
        }
        (Language::Hi, Intent::Admission) => {
            "प्रवेश की जानकारी के लिए, कृपया हमारे प्रवेश कार्यालय या वेबसाइट देखें।"
        }
        (Language::Hi, Intent::Fees) => {
            "फीस संरचना कोर्स के अनुसार अलग है। कृपया खाता विभाग से संपर्क करें।"
        }
        (Language::Hi, Intent::Library) => {
            "हमारी लाइब्रेरी सुबह 8 बजे से रात 8 बजे तक व्यापक संसाधनों के साथ खुली है।"
        }
        (Language::Hi, Intent::Hostel) => {
            "JECRC लड़कों और लड़कियों के लिए आधुनिक सुविधाओं के साथ अलग हॉस्टल प्रदान करता है। सुविधाओं में सुसज्जित कमरे, शाकाहारी भोजन के साथ मेस, Wi-Fi, कॉमन रूम, जिम, और 24/7 सुरक्षा शामिल है। हॉस्टल फीस भोजन सहित ₹60,000 से ₹80,000 प्रति वर्ष है।"
        }
        (Language::Hi, Intent::Scholarship) => {
            "योग्यता और आवश्यकता के आधार पर कई छात्रवृत्ति कार्यक्रम उपलब्ध हैं।"
        }
        (Language::Raj, Intent::Greeting) => {
            "नमस्कार! म्हैं JECRC Foundation के सवालों में थारी मदद करने खातर यहाँ हूँ।"
        }
        (Language::Raj, Intent::Admission) => {
            "दाखले की जानकारी खातर, प्रवेश कार्यालय या वेबसाइट देखो।"
        }
        (Language::Raj, Intent::Fees) => {
            "फीस कोर्स के मुताबिक अलग सै। खाता विभाग तै संपर्क करो।"
        }
        (Language::Raj, Intent::Library) => {
            "म्हारी लाइब्रेरी सुबह 8 तै रात 8 बजे तक खुली रहवै सै।"
        }
        (Language::Raj, Intent::Hostel) => {
            "JECRC छोरों अर छोरियों खातर आधुनिक सुविधावां के साथ अलग हॉस्टल देवै सै। सुविधावां में सुसज्जित कमरे, शाकाहारी खाना के साथ मेस, Wi-Fi, कॉमन रूम, जिम, अर 24/7 सिक्योरिटी सै। हॉस्टल फीस खाना सहित ₹60,000 तै ₹80,000 प्रति साल सै।"
        }
        (Language::Raj, Intent::Scholarship) => {
            "योग्यता अर जरूरत के आधार पै कई छात्रवृत्ति कार्यक्रम सै।"
        }
        _ => return None,
    };
    Some(text)
}

fn default_text(language: Language) -> Option<&'static str> {
    Some(match language {
        Language::En => "I'd be happy to help! Could you please be more specific about your query?",
        Language::Hi => {
            "मुझे मदद करने में खुशी होगी! क्या आप अपने प्रश्न के बारे में और विस्तार से बता सकते हैं?"
        }
        Language::Raj => "म्हैं मदद करने में खुश हूँ! थारो सवाल और साफ करके बताओ।",
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn specific_intent_text_wins() {
        let text = fallback_text(Language::Hi, Intent::Fees);
        assert!(text.contains("फीस"));
    }

    #[test]
    fn unlisted_intent_cascades_to_language_default() {
        let text = fallback_text(Language::Raj, Intent::Placement);
        assert_eq!(text, default_text(Language::Raj).unwrap());
    }

    #[test]
    fn direct_and_terminal_confidences_differ() {
        let d = direct(Language::En, Intent::General);
        let t = terminal(Language::En, Intent::General);
        assert_eq!(d.text, t.text);
        assert!((d.confidence - 0.6).abs() < f64::EPSILON);
        assert!((t.confidence - 0.8).abs() < f64::EPSILON);
        assert_eq!(d.source, ResponseSource::FallbackResponse);
        assert_eq!(t.source, ResponseSource::EnhancedFallback);
    }

    #[test]
    fn every_language_has_a_default() {
        for lang in Language::all() {
            assert!(default_text(lang).is_some());
        }
    }
}
