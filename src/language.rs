//! Recognition and synthesis locales offered by the language selector

use std::fmt;
use std::str::FromStr;

use crate::Error;

/// A locale the assistant can listen and speak in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Language {
    /// English (United States)
    #[default]
    EnUs,
    /// English (United Kingdom)
    EnGb,
    /// Spanish (Spain)
    EsEs,
    /// French (France)
    FrFr,
    /// German (Germany)
    DeDe,
    /// Hindi (India)
    HiIn,
    /// Japanese (Japan)
    JaJp,
}

impl Language {
    /// Every selectable language, in selector order
    pub const ALL: [Self; 7] = [
        Self::EnUs,
        Self::EnGb,
        Self::EsEs,
        Self::FrFr,
        Self::DeDe,
        Self::HiIn,
        Self::JaJp,
    ];

    /// BCP 47 tag (e.g. `en-US`)
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::EsEs => "es-ES",
            Self::FrFr => "fr-FR",
            Self::DeDe => "de-DE",
            Self::HiIn => "hi-IN",
            Self::JaJp => "ja-JP",
        }
    }

    /// Human-readable label in the language itself
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::EnUs => "English (US)",
            Self::EnGb => "English (UK)",
            Self::EsEs => "Español (España)",
            Self::FrFr => "Français",
            Self::DeDe => "Deutsch",
            Self::HiIn => "हिन्दी",
            Self::JaJp => "日本語",
        }
    }

    /// ISO 639-1 primary subtag, as expected by Whisper
    #[must_use]
    pub const fn primary_subtag(self) -> &'static str {
        match self {
            Self::EnUs | Self::EnGb => "en",
            Self::EsEs => "es",
            Self::FrFr => "fr",
            Self::DeDe => "de",
            Self::HiIn => "hi",
            Self::JaJp => "ja",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for Language {
    type Err = Error;

    /// Parse a locale tag, ignoring case and accepting `_` as separator
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|lang| lang.tag().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| Error::Language(s.trim().to_string()))
    }
}
