use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
    Fr,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::En, Language::Ar, Language::Fr];

    pub fn code(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
            Self::Fr => "fr",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::En => "English",
            Self::Ar => "العربية",
            Self::Fr => "Français",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.code() == code.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::Language;

    #[test]
    fn parses_supported_codes_only() {
        assert_eq!(Language::from_code("ar"), Some(Language::Ar));
        assert_eq!(Language::from_code(" fr\n"), Some(Language::Fr));
        assert_eq!(Language::from_code("de"), None);
        assert_eq!(Language::from_code("EN"), None);
    }

    #[test]
    fn serializes_as_code() {
        let raw = serde_json::to_string(&Language::Fr).expect("language should serialize");
        assert_eq!(raw, "\"fr\"");
    }
}
