//! Prompt composition.
//!
//! Builders start from a base sentence and append optional clauses. A clause
//! is only added when its field holds a real value, so a form left on "Any"
//! never produces "in Any style".

/// Separator placed between the base sentence and each clause.
pub const SEPARATOR: &str = ", ";

/// Field values that mean "no preference".
const SENTINELS: &[&str] = &["any", "default", "none", "auto"];

/// True when `value` is non-empty and not a no-preference sentinel.
pub fn is_set(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !SENTINELS.iter().any(|s| value.eq_ignore_ascii_case(s))
}

/// Accumulates a base sentence and optional clauses.
#[derive(Debug, Clone)]
pub struct PromptComposer {
    parts: Vec<String>,
}

impl PromptComposer {
    /// Starts a prompt with its base sentence.
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            parts: vec![base.into()],
        }
    }

    /// Appends a clause unconditionally.
    pub fn clause(mut self, clause: impl Into<String>) -> Self {
        self.parts.push(clause.into());
        self
    }

    /// Appends `render(value)` when `value` is set.
    pub fn option(self, value: &str, render: impl FnOnce(&str) -> String) -> Self {
        if is_set(value) {
            let clause = render(value.trim());
            self.clause(clause)
        } else {
            self
        }
    }

    /// Joins everything with [`SEPARATOR`].
    pub fn build(self) -> String {
        self.parts.join(SEPARATOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels_are_skipped() {
        let prompt = PromptComposer::new("A portrait of a knight")
            .option("Any", |s| format!("in {s} style"))
            .option("", |s| format!("with a {s} background"))
            .option("  ", |s| format!("wearing {s}"))
            .build();
        assert_eq!(prompt, "A portrait of a knight");
    }

    #[test]
    fn test_set_values_are_joined() {
        let prompt = PromptComposer::new("A portrait of a knight")
            .option(" watercolor ", |s| format!("in {s} style"))
            .clause("highly detailed")
            .build();
        assert_eq!(prompt, "A portrait of a knight, in watercolor style, highly detailed");
    }

    #[test]
    fn test_is_set() {
        assert!(is_set("Jazz"));
        assert!(!is_set("ANY"));
        assert!(!is_set("default"));
        assert!(!is_set(""));
    }
}
