//! Topic tagging by title keywords.

use crate::models::TagRule;

/// Derives topic tags from an announcement title.
#[derive(Debug, Clone)]
pub struct Classifier {
    rules: Vec<TagRule>,
}

impl Classifier {
    /// Create a classifier; keywords are lowercased once here.
    pub fn new(rules: Vec<TagRule>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| TagRule {
                tag: rule.tag,
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| k.trim().to_lowercase())
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { rules }
    }

    /// Tags whose keywords occur in `title`, case-insensitively.
    ///
    /// Tags come out in table order and at most once each.
    pub fn classify(&self, title: &str) -> Vec<String> {
        let title = title.to_lowercase();
        let mut tags: Vec<String> = Vec::new();
        for rule in &self.rules {
            if tags.contains(&rule.tag) {
                continue;
            }
            if rule.keywords.iter().any(|k| title.contains(k.as_str())) {
                tags.push(rule.tag.clone());
            }
        }
        tags
    }
}
