//! Keyword catalog of canned replies.
//!
//! Rules are checked in catalog order and the first rule with any keyword
//! contained in the lowercased input wins. Containment is plain substring
//! matching, so `"hi"` also matches `"this"`.

use std::collections::HashSet;
use std::path::Path;

use dvnc_core::error::DvncError;
use serde::Deserialize;

use crate::error::ChatError;

// =============================================================================
// ResponseRule
// =============================================================================

/// A set of trigger keywords mapped to one canned reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseRule {
    keywords: Vec<String>,
    reply: String,
}

impl ResponseRule {
    /// Build a rule. Keywords are lowercased; an empty keyword set, a blank
    /// keyword, a duplicate keyword or an empty reply is rejected.
    pub fn new<I, S>(keywords: I, reply: impl Into<String>) -> Result<Self, ChatError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().to_lowercase())
            .collect();
        let reply = reply.into();
        validate_rule(&keywords, &reply).map_err(ChatError::InvalidCatalog)?;
        Ok(Self { keywords, reply })
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn reply(&self) -> &str {
        &self.reply
    }

    /// `normalized` must already be lowercased.
    fn matches(&self, normalized: &str) -> bool {
        self.keywords.iter().any(|k| normalized.contains(k.as_str()))
    }
}

fn validate_rule(keywords: &[String], reply: &str) -> Result<(), String> {
    if keywords.is_empty() {
        return Err("rule has no keywords".to_string());
    }
    if reply.trim().is_empty() {
        return Err("rule reply is empty".to_string());
    }
    let mut seen = HashSet::new();
    for keyword in keywords {
        if keyword.trim().is_empty() {
            return Err("rule contains a blank keyword".to_string());
        }
        if !seen.insert(keyword.as_str()) {
            return Err(format!("duplicate keyword '{}'", keyword));
        }
    }
    Ok(())
}

// =============================================================================
// ResponseCatalog
// =============================================================================

/// Ordered keyword rules plus the reply used when none match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseCatalog {
    rules: Vec<ResponseRule>,
    default_reply: String,
}

/// On-disk catalog layout:
///
/// ```toml
/// default_reply = "..."
///
/// [[rules]]
/// keywords = ["hello", "hi"]
/// reply = "Greetings!"
/// ```
#[derive(Debug, Deserialize)]
struct CatalogFile {
    default_reply: String,
    #[serde(default)]
    rules: Vec<RuleFile>,
}

#[derive(Debug, Deserialize)]
struct RuleFile {
    keywords: Vec<String>,
    reply: String,
}

impl ResponseCatalog {
    /// Build a catalog from already-validated rules.
    pub fn new(
        rules: Vec<ResponseRule>,
        default_reply: impl Into<String>,
    ) -> Result<Self, ChatError> {
        let default_reply = default_reply.into();
        if default_reply.trim().is_empty() {
            return Err(ChatError::InvalidCatalog(
                "default reply is empty".to_string(),
            ));
        }
        Ok(Self {
            rules,
            default_reply,
        })
    }

    /// A catalog with no rules; every input gets `default_reply`.
    pub fn empty(default_reply: impl Into<String>) -> Result<Self, ChatError> {
        Self::new(Vec::new(), default_reply)
    }

    /// Parse a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ChatError> {
        let file: CatalogFile =
            toml::from_str(content).map_err(|e| ChatError::InvalidCatalog(e.to_string()))?;

        let rules = file
            .rules
            .into_iter()
            .enumerate()
            .map(|(i, rule)| {
                ResponseRule::new(rule.keywords, rule.reply).map_err(|e| match e {
                    ChatError::InvalidCatalog(msg) => {
                        ChatError::InvalidCatalog(format!("rule {}: {}", i + 1, msg))
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(rules, file.default_reply)
    }

    /// Load a catalog from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ChatError> {
        let content = std::fs::read_to_string(path).map_err(DvncError::from)?;
        let catalog = Self::from_toml_str(&content)?;
        tracing::info!(
            rules = catalog.len(),
            "Response catalog loaded from {}",
            path.display()
        );
        Ok(catalog)
    }

    /// The DVNC.AI catalog shipped with the widget.
    pub fn builtin() -> Self {
        let rule = |keywords: &[&'static str], reply: &'static str| ResponseRule {
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            reply: reply.to_string(),
        };

        Self {
            rules: vec![
                rule(
                    &["systems", "thinking", "complex", "problem"],
                    "Complex problems demand a systems-thinking approach. Leonardo understood that everything is interconnected - from the flow of water to the circulation of blood. Your challenge requires examining not just individual components but the relationships and feedback loops between them. What patterns do you observe across different domains?",
                ),
                rule(
                    &["innovation", "creative", "idea"],
                    "True innovation emerges at the intersection of disciplines. Leonardo didn't separate art from science - he used anatomical studies to perfect his paintings and artistic observation to advance engineering. Consider approaching your challenge from an unexpected angle. What would happen if you applied principles from nature to your problem?",
                ),
                rule(
                    &["hello", "hi", "hey"],
                    "Greetings! I am DVNC.AI - a liquid intelligence system that embodies Leonardo da Vinci's polymathic methodology. My neural pathways flow and adapt like water, finding connections between disparate fields. How can I help you think differently today?",
                ),
                rule(
                    &["who are you", "what are you", "dvnc"],
                    "I am DVNC.AI - an advanced liquid intelligence system inspired by Leonardo da Vinci's cross-domain genius. My architecture flows between disciplines like water finding its path, connecting art, science, and technology in ways that challenge conventional thinking.",
                ),
            ],
            default_reply: "Through Leonardo's polymathic lens, every question reveals hidden connections. Like water finding its path through stone, solutions emerge when we allow knowledge to flow between disciplines. What unexpected connections do you see in your challenge?".to_string(),
        }
    }

    /// Reply for `text`: the first matching rule's reply, else the default.
    pub fn match_reply(&self, text: &str) -> &str {
        match self.find_rule(text) {
            Some((_, rule)) => rule.reply(),
            None => &self.default_reply,
        }
    }

    /// The first rule matching `text` and its position in the catalog.
    pub fn find_rule(&self, text: &str) -> Option<(usize, &ResponseRule)> {
        let normalized = text.to_lowercase();
        self.rules
            .iter()
            .enumerate()
            .find(|(_, rule)| rule.matches(&normalized))
    }

    pub fn rules(&self) -> &[ResponseRule] {
        &self.rules
    }

    pub fn default_reply(&self) -> &str {
        &self.default_reply
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for ResponseCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

// =============================================================================
// Tests
// =============================================================================
