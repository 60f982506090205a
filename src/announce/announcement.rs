use crate::common::Identity;
use chrono::{DateTime, Utc};
use rand::seq::IndexedRandom;

const NAME_PLACEHOLDER: &str = "{name}";
const FALLBACK_TEMPLATE: &str = "Welcome {name}!";

/// A greeting ready to be shown and spoken.
#[derive(Debug, Clone, PartialEq)]
pub struct Announcement {
    pub subject: String,
    pub text: String,
    pub announced_at: DateTime<Utc>,
}

/// Turns an identity into a greeting by picking one of the templates at random.
#[derive(Debug, Clone)]
pub struct GreetingComposer {
    templates: Vec<String>,
}

impl GreetingComposer {
    pub fn new(templates: Vec<String>) -> Self {
        Self { templates }
    }

    pub fn templates(&self) -> &[String] {
        &self.templates
    }

    pub fn compose(&self, identity: &Identity) -> Announcement {
        let template = self
            .templates
            .choose(&mut rand::rng())
            .map(String::as_str)
            .unwrap_or(FALLBACK_TEMPLATE);

        Announcement {
            subject: identity.display_name().to_string(),
            text: template.replace(NAME_PLACEHOLDER, identity.display_name()),
            announced_at: Utc::now(),
        }
    }
}

impl Default for GreetingComposer {
    fn default() -> Self {
        Self::new(crate::config::AnnounceSettings::default().templates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substitutes_display_name() {
        let composer = GreetingComposer::new(vec!["Hello {name}, {name}!".to_string()]);
        let announcement = composer.compose(&Identity::parse("erin-42").unwrap());
        assert_eq!(announcement.subject, "Erin");
        assert_eq!(announcement.text, "Hello Erin, Erin!");
    }

    #[test]
    fn picks_one_of_the_templates() {
        let composer = GreetingComposer::default();
        let identity = Identity::parse("frank").unwrap();
        for _ in 0..20 {
            let text = composer.compose(&identity).text;
            assert!(text.contains("Frank"));
            assert!(composer
                .templates()
                .iter()
                .any(|template| template.replace("{name}", "Frank") == text));
        }
    }

    #[test]
    fn empty_template_list_falls_back() {
        let composer = GreetingComposer::new(Vec::new());
        let announcement = composer.compose(&Identity::parse("gina").unwrap());
        assert_eq!(announcement.text, "Welcome Gina!");
    }
}
