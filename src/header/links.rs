use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

use super::language::LanguageCode;

/// Icon drawn before a link label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NavIcon {
    Home,
    Dumbbell,
    User,
    Phone,
}

impl NavIcon {
    pub fn glyph(self) -> &'static str {
        match self {
            NavIcon::Home => "⌂",
            NavIcon::Dumbbell => "≡",
            NavIcon::User => "☺",
            NavIcon::Phone => "☏",
        }
    }
}

/// One in-page navigation target
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavLink {
    /// Id of the section this link scrolls to, without the leading '#'
    pub anchor_id: String,
    pub label: HashMap<LanguageCode, String>,
    #[serde(default)]
    pub icon: Option<NavIcon>,
}

impl NavLink {
    pub fn new(anchor_id: &str, ar: &str, en: &str, icon: NavIcon) -> Self {
        Self {
            anchor_id: anchor_id.to_string(),
            label: HashMap::from([
                (LanguageCode::Ar, ar.to_string()),
                (LanguageCode::En, en.to_string()),
            ]),
            icon: Some(icon),
        }
    }

    /// Label in `lang`, then English, then empty
    pub fn label(&self, lang: LanguageCode) -> &str {
        self.label
            .get(&lang)
            .or_else(|| self.label.get(&LanguageCode::FALLBACK))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn href(&self) -> String {
        format!("#{}", self.anchor_id)
    }
}

/// The site's navigation, in visual order
pub fn default_links() -> Vec<NavLink> {
    vec![
        NavLink::new("home", "الرئيسية", "Home", NavIcon::Home),
        NavLink::new("classes", "الحصص", "Classes", NavIcon::Dumbbell),
        NavLink::new("trainers", "المدربون", "Trainers", NavIcon::User),
        NavLink::new("contact", "تواصل", "Contact", NavIcon::Phone),
    ]
}

/// Extract the anchor id from a URL fragment ("#classes" -> "classes").
///
/// Returns `None` for empty fragments and anything that is not a plain id.
pub fn anchor_from_hash(hash: &str) -> Option<&str> {
    let id = hash.strip_prefix('#').unwrap_or(hash);
    if anchor_pattern().is_match(id) {
        Some(id)
    } else {
        None
    }
}

fn anchor_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_-]*$").expect("anchor pattern is valid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_links_order() {
        let ids: Vec<_> = default_links()
            .into_iter()
            .map(|link| link.anchor_id)
            .collect();
        assert_eq!(ids, vec!["home", "classes", "trainers", "contact"]);
    }

    #[test]
    fn test_label_falls_back_to_english_then_empty() {
        let mut link = NavLink::new("home", "الرئيسية", "Home", NavIcon::Home);
        assert_eq!(link.label(LanguageCode::Ar), "الرئيسية");

        link.label.remove(&LanguageCode::Ar);
        assert_eq!(link.label(LanguageCode::Ar), "Home");

        link.label.clear();
        assert_eq!(link.label(LanguageCode::Ar), "");
    }

    #[test]
    fn test_anchor_from_hash() {
        assert_eq!(anchor_from_hash("#contact"), Some("contact"));
        assert_eq!(anchor_from_hash("trainers"), Some("trainers"));
        assert_eq!(anchor_from_hash("#"), None);
        assert_eq!(anchor_from_hash(""), None);
        assert_eq!(anchor_from_hash("#bad id"), None);
        assert_eq!(anchor_from_hash("#/route"), None);
    }

    #[test]
    fn test_links_deserialize_from_config_shape() {
        let json = r#"[{"anchor_id":"pricing","label":{"ar":"الأسعار","en":"Pricing"}}]"#;
        let links: Vec<NavLink> = serde_json::from_str(json).unwrap();
        assert_eq!(links[0].href(), "#pricing");
        assert_eq!(links[0].label(LanguageCode::En), "Pricing");
        assert_eq!(links[0].icon, None);
    }
}
