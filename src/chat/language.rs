use crate::models::language::Language;

/// Rajasthani marker tokens in Devanagari script. Checked before the text
/// is classified as plain Hindi.
const RAJASTHANI_MARKERS: [&str; 6] = ["थारो", "म्हैं", "सूं", "करो", "माफ", "कोनी"];

/// Romanized Rajasthani tokens, checked before the romanized Hindi list.
const RAJASTHANI_ROMAN_MARKERS: [&str; 6] = ["tharo", "mhane", "sun", "karo", "maaf", "koni"];

const HINDI_ROMAN_MARKERS: [&str; 7] =
    ["aap", "hum", "kya", "hai", "nahin", "namaste", "dhanyawad"];

/// Heuristic language detection over the fixed three-language set.
///
/// Purely deterministic token membership: Devanagari script implies Hindi
/// unless a Rajasthani marker occurs; romanized marker lists are scanned
/// case-insensitively otherwise; English is the default.
pub fn detect(text: &str) -> Language {
    if text.chars().any(is_devanagari) {
        if RAJASTHANI_MARKERS.iter().any(|m| text.contains(m)) {
            return Language::Raj;
        }
        return Language::Hi;
    }

    let lower = text.to_lowercase();
    if RAJASTHANI_ROMAN_MARKERS.iter().any(|m| lower.contains(m)) {
        return Language::Raj;
    }
    if HINDI_ROMAN_MARKERS.iter().any(|m| lower.contains(m)) {
        return Language::Hi;
    }

    Language::En
}

fn is_devanagari(c: char) -> bool {
    ('\u{0900}'..='\u{097F}').contains(&c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devanagari_without_markers_is_hindi() {
        assert_eq!(detect("पुस्तकालय कब खुलता है"), Language::Hi);
    }

    #[test]
    fn rajasthani_marker_flips_devanagari_to_raj() {
        assert_eq!(detect("थारो नाम क्या है"), Language::Raj);
        assert_eq!(detect("म्हैं जाणकारी चाहूं"), Language::Raj);
    }

    #[test]
    fn roman_rajasthani_beats_roman_hindi() {
        // "karo" is in the Rajasthani list, which is checked first.
        assert_eq!(detect("karo please"), Language::Raj);
    }

    #[test]
    fn roman_hindi_detected() {
        assert_eq!(detect("namaste, library kab khulti"), Language::Hi);
    }

    #[test]
    fn plain_english_defaults_to_en() {
        assert_eq!(detect("when does the library open?"), Language::En);
        assert_eq!(detect(""), Language::En);
    }
}
