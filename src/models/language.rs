use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The three languages supported everywhere in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Hi,
    Raj,
}

impl Default for Language {
    fn default() -> Self {
        Language::En
    }
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Raj => "raj",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::En),
            "hi" => Some(Language::Hi),
            "raj" => Some(Language::Raj),
            _ => None,
        }
    }

    pub fn all() -> [Language; 3] {
        [Language::En, Language::Hi, Language::Raj]
    }

    pub fn info(&self) -> LanguageInfo {
        match self {
            Language::En => LanguageInfo {
                code: "en",
                name: "English",
                native_name: "English",
            },
            Language::Hi => LanguageInfo {
                code: "hi",
                name: "Hindi",
                native_name: "हिंदी",
            },
            Language::Raj => LanguageInfo {
                code: "raj",
                name: "Rajasthani",
                native_name: "राजस्थानी",
            },
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for lang in Language::all() {
            assert_eq!(Language::from_code(lang.as_str()), Some(lang));
        }
        assert_eq!(Language::from_code("fr"), None);
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        assert_eq!(serde_json::to_string(&Language::Raj).unwrap(), "\"raj\"");
        let parsed: Language = serde_json::from_str("\"hi\"").unwrap();
        assert_eq!(parsed, Language::Hi);
        assert!(serde_json::from_str::<Language>("\"de\"").is_err());
    }
}
