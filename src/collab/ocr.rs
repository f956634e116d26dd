/// Recognition languages, identified by their Tesseract codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OcrLanguage {
    #[default]
    English,
    Korean,
    Chinese,
    Japanese,
    German,
    French,
    Spanish,
    Russian,
    Arabic,
    Thai,
    Greek,
    Hindi,
}

impl OcrLanguage {
    /// Code passed to the recognition service.
    pub const fn code(self) -> &'static str {
        match self {
            Self::English => "eng",
            Self::Korean => "kor",
            Self::Chinese => "chi_sim",
            Self::Japanese => "jpn",
            Self::German => "deu",
            Self::French => "fra",
            Self::Spanish => "spa",
            Self::Russian => "rus",
            Self::Arabic => "ara",
            Self::Thai => "tha",
            Self::Greek => "ell",
            Self::Hindi => "hin",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Korean => "Korean",
            Self::Chinese => "Chinese",
            Self::Japanese => "Japanese",
            Self::German => "German",
            Self::French => "French",
            Self::Spanish => "Spanish",
            Self::Russian => "Russian",
            Self::Arabic => "Arabic",
            Self::Thai => "Thai",
            Self::Greek => "Greek",
            Self::Hindi => "Hindi",
        }
    }
}

/// Parses a config value. Returns `None` for unrecognised values so the
/// caller can fall back to locale detection.
pub fn parse_ocr_language(value: &str) -> Option<OcrLanguage> {
    match value.trim().to_ascii_lowercase().as_str() {
        "eng" | "en" | "english" => Some(OcrLanguage::English),
        "kor" | "ko" | "korean" => Some(OcrLanguage::Korean),
        "chi_sim" | "zh" | "chinese" => Some(OcrLanguage::Chinese),
        "jpn" | "ja" | "japanese" => Some(OcrLanguage::Japanese),
        "deu" | "de" | "german" => Some(OcrLanguage::German),
        "fra" | "fr" | "french" => Some(OcrLanguage::French),
        "spa" | "es" | "spanish" => Some(OcrLanguage::Spanish),
        "rus" | "ru" | "russian" => Some(OcrLanguage::Russian),
        "ara" | "ar" | "arabic" => Some(OcrLanguage::Arabic),
        "tha" | "th" | "thai" => Some(OcrLanguage::Thai),
        "ell" | "el" | "greek" => Some(OcrLanguage::Greek),
        "hin" | "hi" | "hindi" => Some(OcrLanguage::Hindi),
        _ => None,
    }
}

/// Maps a POSIX locale such as `ko_KR.UTF-8` to a language; English otherwise.
pub fn detect_ocr_language(locale: Option<&str>) -> OcrLanguage {
    let prefix = locale
        .and_then(|value| value.split(['_', '.']).next())
        .unwrap_or("en");
    match prefix {
        "ko" => OcrLanguage::Korean,
        "zh" => OcrLanguage::Chinese,
        "ja" => OcrLanguage::Japanese,
        "de" => OcrLanguage::German,
        "fr" => OcrLanguage::French,
        "es" => OcrLanguage::Spanish,
        "ru" | "uk" | "be" => OcrLanguage::Russian,
        "ar" => OcrLanguage::Arabic,
        "th" => OcrLanguage::Thai,
        "el" => OcrLanguage::Greek,
        "hi" | "mr" | "ne" => OcrLanguage::Hindi,
        _ => OcrLanguage::English,
    }
}

/// Config value first, then the `LANG` locale.
pub fn resolve_ocr_language(config_value: Option<&str>) -> OcrLanguage {
    config_value.and_then(parse_ocr_language).unwrap_or_else(|| {
        let locale = std::env::var("LANG").ok();
        detect_ocr_language(locale.as_deref())
    })
}
