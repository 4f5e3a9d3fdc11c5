//! Text normalization applied before feature extraction
//!
//! The same transform runs at training time and at request time; the
//! version tag is persisted with every model so the two cannot drift apart.

/// Contract version of [`TextNormalizer`], embedded in every persisted model
pub const NORMALIZER_VERSION: &str = "1";

/// Token substituted for `$`, `€`, `£` and `¥`
pub const CURRENCY_TOKEN: &str = "currency_token";

/// Token substituted for `!`
pub const EXCLAMATION_TOKEN: &str = "exclamation_token";

const CURRENCY_SYMBOLS: [char; 4] = ['$', '€', '£', '¥'];

/// Deterministic, stateless text cleaner
#[derive(Debug, Clone, Copy, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Normalize a single message.
    ///
    /// Lowercases, substitutes currency symbols and `!` with word tokens,
    /// strips ASCII punctuation (except `_`, which the tokens rely on) and
    /// collapses whitespace. Substitution happens before stripping so the
    /// signal survives.
    pub fn clean(&self, text: &str) -> String {
        let lowered = text.to_lowercase();

        let mut substituted = String::with_capacity(lowered.len() + 16);
        for c in lowered.chars() {
            if CURRENCY_SYMBOLS.contains(&c) {
                substituted.push(' ');
                substituted.push_str(CURRENCY_TOKEN);
                substituted.push(' ');
            } else if c == '!' {
                substituted.push(' ');
                substituted.push_str(EXCLAMATION_TOKEN);
                substituted.push(' ');
            } else if !is_stripped_punctuation(c) {
                substituted.push(c);
            }
        }

        substituted.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    /// Normalize a possibly missing field; absent text becomes the empty string
    pub fn clean_field(&self, text: Option<&str>) -> String {
        text.map(|t| self.clean(t)).unwrap_or_default()
    }

    /// Normalize every element, preserving order and length
    pub fn clean_batch<I, S>(&self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        texts
            .into_iter()
            .map(|t| self.clean_field(t.as_ref().map(<S as AsRef<str>>::as_ref)))
            .collect()
    }

    pub fn version(&self) -> &'static str {
        NORMALIZER_VERSION
    }
}

fn is_stripped_punctuation(c: char) -> bool {
    c.is_ascii_punctuation() && c != '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_and_exclamation_tokens() {
        let cleaned = TextNormalizer::new().clean("Pay $5 now!");
        assert_eq!(cleaned, "pay currency_token 5 now exclamation_token");
        assert!(!cleaned.contains('$'));
        assert!(!cleaned.contains('!'));
    }

    #[test]
    fn test_all_currency_symbols() {
        let cleaned = TextNormalizer::new().clean("€10 £20 ¥30");
        assert_eq!(
            cleaned,
            "currency_token 10 currency_token 20 currency_token 30"
        );
    }

    #[test]
    fn test_strips_punctuation_and_whitespace() {
        let cleaned = TextNormalizer::new().clean("  Hey,   lunch\ttoday?\n(ok)  ");
        assert_eq!(cleaned, "hey lunch today ok");
    }

    #[test]
    fn test_missing_field_is_empty() {
        let normalizer = TextNormalizer::new();
        assert_eq!(normalizer.clean_field(None), "");
        assert_eq!(normalizer.clean(""), "");
        assert_eq!(normalizer.clean("?!?"), "exclamation_token");
    }

    #[test]
    fn test_idempotent() {
        let normalizer = TextNormalizer::new();
        let samples = [
            "URGENT! You have WON a £1000 prize!!! Call 0800-123 now.",
            "Hey, are we still on for lunch today?",
            "currency_token already here _under_score_",
            "Ünïcödé — “quotes” … and ¥€$£",
            "   ",
            "a!b$c",
        ];
        for sample in samples {
            let once = normalizer.clean(sample);
            assert_eq!(normalizer.clean(&once), once, "not idempotent for {:?}", sample);
        }
    }

    #[test]
    fn test_batch_preserves_order_and_length() {
        let normalizer = TextNormalizer::new();
        let batch = normalizer.clean_batch(vec![Some("B!"), None, Some("a $")]);
        assert_eq!(
            batch,
            vec![
                "b exclamation_token".to_string(),
                String::new(),
                "a currency_token".to_string()
            ]
        );
    }
}
