use trellis_core::types::Target;

/// One deterministic routing rule: if the originating message contains any of
/// the keywords, route to the target.
#[derive(Debug, Clone)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub target: Target,
}

impl KeywordRule {
    pub fn new(target: Target, keywords: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
            target,
        }
    }

    fn matches(&self, content_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| content_lower.contains(k.to_ascii_lowercase().as_str()))
    }
}

/// Deterministic backstop for an untrusted decision oracle.
///
/// When the oracle's token is outside the allowed set, rules are tried in
/// order against the originating message content (first match wins), then the
/// static default. Resolution never fails, so a noisy oracle alone can never
/// abort a run.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    rules: Vec<KeywordRule>,
    default: Target,
}

impl FallbackPolicy {
    pub fn new(default: Target) -> Self {
        Self {
            rules: Vec::new(),
            default,
        }
    }

    /// Append a keyword rule. Order of calls is priority order.
    pub fn with_rule(
        mut self,
        target: Target,
        keywords: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.rules.push(KeywordRule::new(target, keywords));
        self
    }

    pub fn rules(&self) -> &[KeywordRule] {
        &self.rules
    }

    pub fn default_target(&self) -> &Target {
        &self.default
    }

    /// Resolve a fallback target from the originating message content.
    pub fn resolve(&self, content: &str) -> Target {
        let lower = content.to_ascii_lowercase();
        for rule in &self.rules {
            if rule.matches(&lower) {
                return rule.target.clone();
            }
        }
        self.default.clone()
    }
}
