use serde::Serialize;
use utoipa::ToSchema;

use crate::chat::fallback;
use crate::chat::intent::Intent;
use crate::chat::{ResponderAnswer, ResponseSource, KNOWLEDGE_PREFER_THRESHOLD};
use crate::models::language::Language;

/// Knowledge-base categories. A list distinct from, and partially
/// overlapping, the intent vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeCategory {
    Admission,
    Fees,
    Courses,
    Facilities,
    Hostel,
    Placement,
}

impl KnowledgeCategory {
    /// Scan order. Ties on confidence keep the earlier category.
    pub const ALL: [KnowledgeCategory; 6] = [
        KnowledgeCategory::Admission,
        KnowledgeCategory::Fees,
        KnowledgeCategory::Courses,
        KnowledgeCategory::Facilities,
        KnowledgeCategory::Hostel,
        KnowledgeCategory::Placement,
    ];

    pub fn weight(&self) -> f64 {
        match self {
            KnowledgeCategory::Admission => 0.9,
            KnowledgeCategory::Fees => 0.9,
            KnowledgeCategory::Courses => 0.8,
            KnowledgeCategory::Facilities => 0.8,
            KnowledgeCategory::Hostel => 0.9,
            KnowledgeCategory::Placement => 0.9,
        }
    }

    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            KnowledgeCategory::Admission => &[
                "admission", "pravesh", "dakhla", "join", "apply", "bharti", "प्रवेश", "दाखला",
                "entrance", "eligibility", "दाखले", "जानकारी",
            ],
            KnowledgeCategory::Fees => &[
                "fee", "fees", "cost", "price", "amount", "shulk", "फीस", "पैसा", "खर्च",
                "scholarship", "छात्रवृत्ति",
            ],
            KnowledgeCategory::Courses => &[
                "course", "program", "degree", "branch", "stream", "कोर्स", "पाठ्यक्रम", "cse",
                "mba", "engineering",
            ],
            KnowledgeCategory::Facilities => &[
                "facility", "lab", "library", "hostel", "campus", "सुविधा", "लाइब्रेरी", "हॉस्टल",
                "infrastructure", "छात्रावास", "accommodation", "room",
            ],
            KnowledgeCategory::Hostel => &[
                "hostel", "accommodation", "room", "mess", "boarding", "हॉस्टल", "छात्रावास",
                "कमरा", "मेस", "रहना",
            ],
            KnowledgeCategory::Placement => &[
                "placement", "job", "career", "company", "recruit", "नौकरी", "प्लेसमेंट",
                "कंपनी", "salary", "package",
            ],
        }
    }

    /// Canned answer block for this category in the requested language.
    /// The English variant doubles as the fallback arm for any variant that
    /// would be absent.
    pub fn answer(&self, language: Language) -> &'static str {
        match (self, language) {
            (KnowledgeCategory::Admission, Language::En) => {
                "🎓 JECRC Foundation Admissions:\n\n📋 Engineering: JEE Main/REAP required (Cutoff: 50k-150k rank)\n📋 Management: CAT/MAT/CMAT accepted (Percentile: 50+)\n📋 Application Period: March-July\n📞 Admissions Office: +91-141-2770000\n🌐 Apply online: admissions.jecrc.ac.in\n\n💡 Documents needed: 10th/12th certificates, entrance scores, category certificate (if applicable)"
            }
            (KnowledgeCategory::Admission, Language::Hi) => {
                "🎓 JECRC Foundation प्रवेश:\n\n📋 इंजीनियरिंग: JEE Main/REAP आवश्यक (कटऑफ: 50k-150k रैंक)\n📋 मैनेजमेंट: CAT/MAT/CMAT स्वीकार (प्रतिशत: 50+)\n📋 आवेदन अवधि: मार्च-जुलाई\n📞 प्रवेश कार्यालय: +91-141-2770000\n\n💡 आवश्यक दस्तावेज: 10वीं/12वीं प्रमाणपत्र, प्रवेश स्कोर, श्रेणी प्रमाणपत्र"
            }
            (KnowledgeCategory::Admission, Language::Raj) => {
                "🎓 JECRC Foundation प्रवेश:\n\n📋 इंजीनियरिंग: JEE Main/REAP चाहिए (कटऑफ: 50k-150k रैंक)\n📋 मैनेजमेंट: CAT/MAT/CMAT लेवै सै\n📋 आवेदन: मार्च तै जुलाई तक\n📞 दाखला ऑफिस: +91-141-2770000"
            }
            (KnowledgeCategory::Fees, Language::En) => {
                "💰 JECRC Fee Structure (2024-25):\n\n🔧 Engineering: ₹80,000-1,20,000/year\n💼 Management: ₹70,000-1,00,000/year\n💻 BCA/MCA: ₹60,000-80,000/year\n🎨 Design: ₹75,000-95,000/year\n\n🏆 Scholarships: Up to 100% for merit\n💳 Payment: EMI options available\n🏦 Education loans supported\n📞 Fees Office: +91-141-2770000 Ext: 234"
            }
            (KnowledgeCategory::Fees, Language::Hi) => {
                "💰 JECRC फीस संरचना (2024-25):\n\n🔧 इंजीनियरिंग: ₹80,000-1,20,000/वर्ष\n💼 मैनेजमेंट: ₹70,000-1,00,000/वर्ष\n💻 BCA/MCA: ₹60,000-80,000/वर्ष\n\n🏆 छात्रवृत्ति: मेरिट के लिए 100% तक\n💳 भुगतान: EMI विकल्प उपलब्ध\n🏦 शिक्षा ऋण समर्थित"
            }
            (KnowledgeCategory::Fees, Language::Raj) => {
                "💰 JECRC फीस (2024-25):\n\n🔧 इंजीनियरिंग: ₹80,000-1,20,000/साल\n💼 मैनेजमेंट: ₹70,000-1,00,000/साल\n\n🏆 स्कॉलरशिप: मेरिट के लिए 100% तक\n💳 EMI की सुविधा उपलब्ध"
            }
            (KnowledgeCategory::Courses, Language::En) => {
                "📚 JECRC Courses Offered:\n\n🔧 Engineering: CSE, ECE, ME, CE, EE, IT\n💼 Management: MBA, BBA, PGDM\n💻 Computer: BCA, MCA, B.Tech CSE\n🎨 Design: Fashion, Interior Design\n📊 Commerce: B.Com, M.Com\n📖 Arts: BA, MA in various streams\n\n⭐ Popular: CSE (500 seats), MBA (120 seats)\n🎯 Specializations: AI/ML, Data Science, Digital Marketing"
            }
            (KnowledgeCategory::Courses, Language::Hi) => {
                "📚 JECRC पाठ्यक्रम:\n\n🔧 इंजीनियरिंग: CSE, ECE, ME, CE, EE, IT\n💼 प्रबंधन: MBA, BBA, PGDM\n💻 कंप्यूटर: BCA, MCA, B.Tech CSE\n🎨 डिज़ाइन: फैशन, इंटीरियर डिज़ाइन\n\n⭐ लोकप्रिय: CSE (500 सीटें), MBA (120 सीटें)\n🎯 विशेषज्ञता: AI/ML, डेटा साइंस, डिजिटल मार्केटिंग"
            }
            (KnowledgeCategory::Courses, Language::Raj) => {
                "📚 JECRC कोर्स:\n\n🔧 इंजीनियरिंग: CSE, ECE, ME, CE, EE, IT\n💼 मैनेजमेंट: MBA, BBA, PGDM\n💻 कंप्यूटर: BCA, MCA\n\n⭐ लोकप्रिय: CSE, MBA\n🎯 स्पेशलाइजेशन: AI/ML, डेटा साइंस"
            }
            (KnowledgeCategory::Facilities, Language::En) => {
                "🏢 JECRC Campus Facilities:\n\n📚 Library: 50,000+ books, digital resources, 24/7 access\n🔬 Labs: Modern computer labs (500+ systems), engineering labs\n🏠 Hostel: Separate for boys/girls, AC rooms, WiFi, mess\n🍽️ Cafeteria: Multiple food courts, healthy options\n🏥 Medical: On-campus clinic, ambulance service\n🚌 Transport: College buses from major locations\n💪 Sports: Cricket ground, basketball, gym, indoor games\n🎭 Cultural: Auditorium (1000 capacity), music room\n📶 WiFi: High-speed internet throughout campus"
            }
            (KnowledgeCategory::Facilities, Language::Hi) => {
                "🏢 JECRC कैंपस सुविधाएं:\n\n📚 पुस्तकालय: 50,000+ पुस्तकें, डिजिटल संसाधन, 24/7 पहुंच\n🔬 लैब: आधुनिक कंप्यूटर लैब (500+ सिस्टम), इंजीनियरिंग लैब\n🏠 छात्रावास: लड़के/लड़कियों के लिए अलग, AC कमरे, WiFi, मेस\n🍽️ कैंटीन: कई फूड कोर्ट, स्वस्थ विकल्प\n🏥 चिकित्सा: कैंपस क्लिनिक, एम्बुलेंस सेवा"
            }
            (KnowledgeCategory::Facilities, Language::Raj) => {
                "🏢 JECRC कैंपस सुविधावां:\n\n📚 लाइब्रेरी: 50,000+ किताबां, डिजिटल रिसोर्स\n🔬 लैब: आधुनिक कंप्यूटर लैब, इंजीनियरिंग लैब\n🏠 हॉस्टल: छोरों/छोरियों खातर अलग, AC रूम, WiFi\n🍽️ कैंटीन: कई फूड कोर्ट\n🏥 मेडिकल: कैंपस क्लिनिक"
            }
            (KnowledgeCategory::Hostel, Language::En) => {
                "🏠 JECRC Hostel Facilities:\n\n🏢 Separate hostels for boys and girls\n🏠 Furnished AC/Non-AC rooms\n🍽️ Vegetarian mess with healthy meals\n📶 High-speed Wi-Fi throughout\n🛡️ 24/7 security with CCTV\n🏥 Medical facilities on campus\n💪 Gym and recreational facilities\n🚿 Hot water supply\n📚 Study rooms and common areas\n\n💰 Fees: ₹60,000-₹80,000/year (including meals)\n📞 Hostel Office: +91-141-2770000 Ext: 567"
            }
            (KnowledgeCategory::Hostel, Language::Hi) => {
                "🏠 JECRC हॉस्टल सुविधाएं:\n\n🏢 लड़कों और लड़कियों के लिए अलग हॉस्टल\n🏠 सुसज्जित AC/Non-AC कमरे\n🍽️ स्वस्थ भोजन के साथ शाकाहारी मेस\n📶 हाई-स्पीड Wi-Fi\n🛡️ CCTV के साथ 24/7 सुरक्षा\n🏥 कैंपस में चिकित्सा सुविधाएं\n💪 जिम और मनोरंजन सुविधाएं\n🚿 गर्म पानी की आपूर्ति\n📚 अध्ययन कक्ष और कॉमन एरिया\n\n💰 फीस: ₹60,000-₹80,000/वर्ष (भोजन सहित)"
            }
            (KnowledgeCategory::Hostel, Language::Raj) => {
                "🏠 JECRC हॉस्टल सुविधावां:\n\n🏢 छोरों अर छोरियों खातर अलग हॉस्टल\n🏠 सुसज्जित AC/Non-AC कमरे\n🍽️ स्वस्थ खाना के साथ शाकाहारी मेस\n📶 हाई-स्पीड Wi-Fi\n🛡️ CCTV के साथ 24/7 सिक्योरिटी\n🏥 कैंपस में मेडिकल सुविधा\n💪 जिम अर मनोरंजन सुविधा\n🚿 गर्म पानी\n📚 पढ़ाई के कमरे अर कॉमन एरिया\n\n💰 फीस: ₹60,000-₹80,000/साल (खाना सहित)"
            }
            (KnowledgeCategory::Placement, Language::En) => {
                "🎯 JECRC Placement Record (2023-24):\n\n📈 Success Rate: 85%+ students placed\n💰 Salary Packages:\n  • Average: ₹3.5-6 LPA\n  • Highest: ₹25 LPA (Amazon)\n  • Starting: ₹2.5 LPA minimum\n\n🏢 Top Recruiters:\n  • Tech: TCS, Infosys, Wipro, Amazon, Microsoft\n  • Consulting: Accenture, IBM, Capgemini\n  • Finance: ICICI, HDFC, Bajaj\n\n🎓 Training: Resume building, mock interviews, soft skills\n📞 Placement Cell: +91-141-2770000 Ext: 456"
            }
            (KnowledgeCategory::Placement, Language::Hi) => {
                "🎯 JECRC प्लेसमेंट रिकॉर्ड (2023-24):\n\n📈 सफलता दर: 85%+ छात्र प्लेस्ड\n💰 वेतन पैकेज:\n  • औसत: ₹3.5-6 LPA\n  • सर्वोच्च: ₹25 LPA (Amazon)\n  • न्यूनतम: ₹2.5 LPA\n\n🏢 शीर्ष नियोक्ता:\n  • टेक: TCS, Infosys, Wipro, Amazon\n  • कंसल्टिंग: Accenture, IBM, Capgemini\n\n🎓 प्रशिक्षण: रिज्यूमे निर्माण, मॉक इंटरव्यू"
            }
            (KnowledgeCategory::Placement, Language::Raj) => {
                "🎯 JECRC प्लेसमेंट (2023-24):\n\n📈 सफलता: 85%+ छात्रावां को जॉब\n💰 सैलरी:\n  • औसत: ₹3.5-6 LPA\n  • सबसूं ज्यादा: ₹25 LPA\n\n🏢 टॉप कंपनी: TCS, Infosys, Amazon\n🎓 ट्रेनिंग: रिज्यूमे, इंटरव्यू की तैयारी"
            }
        }
    }
}

/// One category's score against a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryMatch {
    pub category: KnowledgeCategory,
    pub confidence: f64,
}

/// Weighted keyword scan over all categories. Full scan, not
/// short-circuited; the strictly highest confidence wins, so ties keep the
/// first category in scan order. Categories with zero hits are never
/// returned.
pub fn best_match(message: &str) -> Option<CategoryMatch> {
    let normalized = message.to_lowercase();
    let mut best: Option<CategoryMatch> = None;

    for category in KnowledgeCategory::ALL {
        let hits = category
            .keywords()
            .iter()
            .filter(|k| normalized.contains(*k))
            .count();
        if hits == 0 {
            continue;
        }
        let confidence = category_confidence(hits, category.weight());
        if confidence > best.map_or(0.0, |b| b.confidence) {
            best = Some(CategoryMatch {
                category,
                confidence,
            });
        }
    }

    best
}

fn category_confidence(hits: usize, weight: f64) -> f64 {
    f64::min(0.95, hits as f64 * weight + 0.5)
}

/// Direct entry point preserving the component's standalone contract:
/// a category match above the internal preference bar yields the canned
/// block; otherwise the generic per-intent fallback at its lower fixed
/// confidence.
pub fn respond(message: &str, language: Language, intent: Intent) -> ResponderAnswer {
    match best_match(message) {
        Some(m) if m.confidence > KNOWLEDGE_PREFER_THRESHOLD => ResponderAnswer {
            text: m.category.answer(language).to_string(),
            confidence: m.confidence,
            source: ResponseSource::EnhancedKnowledge,
        },
        _ => fallback::direct(language, intent),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_hit_categories_are_never_returned() {
        assert_eq!(best_match("zzz qqq"), None);
    }

    #[test]
    fn hostel_fees_scores_above_accept_threshold() {
        let m = best_match("What are the hostel fees?").unwrap();
        assert!(m.confidence > 0.5);
        // Fees scores two hits ("fee" + "fees"); hostel one. Both cap at
        // 0.95, and the strictly-greater comparison keeps the earlier
        // category at equal confidence.
        assert_eq!(m.category, KnowledgeCategory::Fees);
        assert!((m.confidence - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn confidence_monotonic_in_hit_count() {
        for weight in [0.8, 0.9] {
            let mut previous = 0.0;
            for hits in 1..=5 {
                let c = category_confidence(hits, weight);
                assert!(c >= previous);
                assert!(c <= 0.95);
                previous = c;
            }
        }
        // The +0.5 base means a single hit already saturates the cap.
        assert!((category_confidence(1, 0.8) - 0.95).abs() < f64::EPSILON);
    }

    #[test]
    fn devanagari_keywords_hit() {
        let m = best_match("हॉस्टल के बारे में बताओ").unwrap();
        assert_eq!(m.category, KnowledgeCategory::Facilities);
    }

    #[test]
    fn unmatched_message_falls_back_at_point_six() {
        let answer = respond("zzz qqq", Language::En, Intent::General);
        assert_eq!(answer.source, ResponseSource::FallbackResponse);
        assert!((answer.confidence - 0.6).abs() < f64::EPSILON);
    }

    #[test]
    fn matched_message_reports_enhanced_knowledge() {
        let answer = respond("how do I apply for admission", Language::En, Intent::Admission);
        assert_eq!(answer.source, ResponseSource::EnhancedKnowledge);
        assert!(answer.confidence > 0.5);
        assert!(answer.text.contains("Admissions"));
    }
}
