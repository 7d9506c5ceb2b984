//! Context window sizes of the chat models the summarizer talks to.

use std::collections::HashMap;

/// Built-in context windows, in tokens.
pub const KNOWN_MODEL_LIMITS: &[(&str, usize)] = &[
    ("deepseek-chat", 64_000),
    ("gpt-4o", 128_000),
    ("gpt-4o-mini", 128_000),
    ("gpt-3.5-turbo", 16_385),
];

/// Model name to context window, keyed by exact model name.
#[derive(Debug, Clone)]
pub struct ModelLimitsRegistry {
    windows: HashMap<String, usize>,
}

impl Default for ModelLimitsRegistry {
    fn default() -> Self {
        Self {
            windows: KNOWN_MODEL_LIMITS
                .iter()
                .map(|(model, tokens)| (model.to_string(), *tokens))
                .collect(),
        }
    }
}

impl ModelLimitsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace or add the window of one model.
    pub fn with_limit(mut self, model: impl Into<String>, tokens: usize) -> Self {
        self.windows.insert(model.into(), tokens);
        self
    }

    /// Context window of `model`; `None` for models the registry does not know.
    pub fn context_window(&self, model: &str) -> Option<usize> {
        self.windows.get(model).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_models_are_known() {
        let registry = ModelLimitsRegistry::new();
        assert_eq!(registry.context_window("deepseek-chat"), Some(64_000));
        assert_eq!(registry.context_window("gpt-3.5-turbo"), Some(16_385));
    }

    #[test]
    fn dated_model_names_are_not_guessed() {
        let registry = ModelLimitsRegistry::new();
        assert_eq!(registry.context_window("gpt-4o-mini-2024-07-18"), None);
        assert_eq!(registry.context_window("local-llama"), None);
    }

    #[test]
    fn added_limit_replaces_builtin() {
        let registry = ModelLimitsRegistry::new()
            .with_limit("deepseek-chat", 32_000)
            .with_limit("local-llama", 8_192);

        assert_eq!(registry.context_window("deepseek-chat"), Some(32_000));
        assert_eq!(registry.context_window("local-llama"), Some(8_192));
    }
}
