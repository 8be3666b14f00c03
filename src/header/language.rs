use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

/// Storage key holding the visitor's language preference
pub const LANGUAGE_STORAGE_KEY: &str = "site_lang";

/// Supported site languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageCode {
    Ar,
    En,
}

/// Writing direction applied to the document root
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Rtl,
    Ltr,
}

impl LanguageCode {
    /// Language used when nothing else is known
    pub const DEFAULT: LanguageCode = LanguageCode::Ar;

    /// Language dictionaries fall back to
    pub const FALLBACK: LanguageCode = LanguageCode::En;

    pub const ALL: [LanguageCode; 2] = [LanguageCode::Ar, LanguageCode::En];

    pub fn code(self) -> &'static str {
        match self {
            LanguageCode::Ar => "ar",
            LanguageCode::En => "en",
        }
    }

    /// Strict parse of a stored code. Anything but "ar" or "en" is rejected.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "ar" => Some(LanguageCode::Ar),
            "en" => Some(LanguageCode::En),
            _ => None,
        }
    }

    /// Map a platform locale ("ar_EG.UTF-8", "en-US", ...) by prefix.
    pub fn from_locale(locale: &str) -> Self {
        if locale.trim().to_lowercase().starts_with("ar") {
            LanguageCode::Ar
        } else {
            LanguageCode::En
        }
    }

    pub fn direction(self) -> TextDirection {
        match self {
            LanguageCode::Ar => TextDirection::Rtl,
            LanguageCode::En => TextDirection::Ltr,
        }
    }

    /// Name of the language written in that language
    pub fn native_name(self) -> &'static str {
        match self {
            LanguageCode::Ar => "العربية",
            LanguageCode::En => "English",
        }
    }

    /// Region code shown next to the native name in the language menu
    pub fn region_code(self) -> &'static str {
        match self {
            LanguageCode::Ar => "AE",
            LanguageCode::En => "GB",
        }
    }

    /// The other supported language
    pub fn other(self) -> Self {
        match self {
            LanguageCode::Ar => LanguageCode::En,
            LanguageCode::En => LanguageCode::Ar,
        }
    }

    /// Translation key describing a switch to this language
    pub fn switch_key(self) -> &'static str {
        match self {
            LanguageCode::Ar => "header.switchToArabic",
            LanguageCode::En => "header.switchToEnglish",
        }
    }

    /// Short label for the header chip
    pub fn chip_label(self) -> &'static str {
        match self {
            LanguageCode::Ar => "AR",
            LanguageCode::En => "EN",
        }
    }
}

impl fmt::Display for LanguageCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl TextDirection {
    pub fn attr(self) -> &'static str {
        match self {
            TextDirection::Rtl => "rtl",
            TextDirection::Ltr => "ltr",
        }
    }

    pub fn is_rtl(self) -> bool {
        self == TextDirection::Rtl
    }
}

/// Document-level side effects of a language change.
///
/// The header core never touches the document or storage directly; the
/// platform supplies an implementation of this capability set.
pub trait Environment {
    fn apply_direction(&mut self, direction: TextDirection);
    fn apply_lang_attr(&mut self, lang: LanguageCode);
    fn persist(&mut self, lang: LanguageCode) -> Result<()>;
    fn read_persisted(&self) -> Result<Option<String>>;
}

/// Owns the current language and keeps the environment in sync with it
pub struct LanguageController<E: Environment> {
    current: LanguageCode,
    env: E,
}

impl<E: Environment> LanguageController<E> {
    /// Resolve the initial language and apply it.
    ///
    /// Order: persisted value, then the platform locale, then `LanguageCode::DEFAULT`.
    pub fn new(env: E, platform_locale: Option<&str>) -> Self {
        let persisted = match env.read_persisted() {
            Ok(value) => value.as_deref().and_then(LanguageCode::from_code),
            Err(e) => {
                warn!("Could not read language preference, ignoring: {e:#}");
                None
            }
        };

        let current = match (persisted, platform_locale) {
            (Some(lang), _) => {
                debug!(%lang, "Using persisted language");
                lang
            }
            (None, Some(locale)) => {
                let lang = LanguageCode::from_locale(locale);
                debug!(%lang, locale, "Detected language from platform locale");
                lang
            }
            (None, None) => LanguageCode::DEFAULT,
        };

        let mut controller = Self { current, env };
        controller.apply();
        controller
    }

    pub fn current(&self) -> LanguageCode {
        self.current
    }

    pub fn direction(&self) -> TextDirection {
        self.current.direction()
    }

    /// Change language. Re-applying the current language is harmless.
    pub fn set(&mut self, lang: LanguageCode) {
        if lang != self.current {
            info!(from = %self.current, to = %lang, "Language changed");
        }
        self.current = lang;
        self.apply();
    }

    #[cfg(test)]
    pub fn env(&self) -> &E {
        &self.env
    }

    fn apply(&mut self) {
        self.env.apply_direction(self.current.direction());
        self.env.apply_lang_attr(self.current);
        if let Err(e) = self.env.persist(self.current) {
            warn!("Could not persist language preference: {e:#}");
        }
    }
}

/// Platform locale as reported by the environment variables, first match wins
pub fn detect_platform_locale() -> Option<String> {
    let lc_all = std::env::var("LC_ALL").ok();
    let lc_messages = std::env::var("LC_MESSAGES").ok();
    let lang = std::env::var("LANG").ok();
    first_locale([lc_all.as_deref(), lc_messages.as_deref(), lang.as_deref()])
}

fn first_locale(candidates: [Option<&str>; 3]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|value| !value.is_empty() && *value != "C" && *value != "POSIX")
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use anyhow::anyhow;

    /// In-memory environment recording every side effect
    #[derive(Debug, Default)]
    pub struct MemoryEnvironment {
        pub dir: Option<&'static str>,
        pub lang: Option<&'static str>,
        pub stored: Option<String>,
        pub writes: usize,
        pub fail_storage: bool,
    }

    impl MemoryEnvironment {
        pub fn with_stored(value: &str) -> Self {
            Self {
                stored: Some(value.to_string()),
                ..Default::default()
            }
        }

        pub fn broken_storage() -> Self {
            Self {
                fail_storage: true,
                ..Default::default()
            }
        }
    }

    impl Environment for MemoryEnvironment {
        fn apply_direction(&mut self, direction: TextDirection) {
            self.dir = Some(direction.attr());
        }

        fn apply_lang_attr(&mut self, lang: LanguageCode) {
            self.lang = Some(lang.code());
        }

        fn persist(&mut self, lang: LanguageCode) -> Result<()> {
            if self.fail_storage {
                return Err(anyhow!("storage disabled"));
            }
            self.stored = Some(lang.code().to_string());
            self.writes += 1;
            Ok(())
        }

        fn read_persisted(&self) -> Result<Option<String>> {
            if self.fail_storage {
                return Err(anyhow!("storage disabled"));
            }
            Ok(self.stored.clone())
        }
    }
}
