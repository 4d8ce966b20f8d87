//! Token generation utilities.

use uuid::Uuid;

/// Generator for opaque session tokens.
#[derive(Debug, Clone, Default)]
pub struct TokenGenerator {
    _private: (),
}

impl TokenGenerator {
    /// Create a new token generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a cryptographically random token.
    #[must_use]
    pub fn generate(&self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_token() {
        let token_gen = TokenGenerator::new();
        let a = token_gen.generate();
        let b = token_gen.generate();

        assert_eq!(a.len(), 32); // Simple UUID without hyphens
        assert_ne!(a, b);
    }
}
