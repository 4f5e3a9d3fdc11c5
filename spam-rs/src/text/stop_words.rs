//! Named stop-word lists, backed by the NLTK lists of the `stop-words` crate

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;
use stop_words::LANGUAGE;

use crate::error::SpamError;

/// Named stop-word list removed before n-grams are formed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopWords {
    English,
}

impl StopWords {
    pub fn contains(&self, token: &str) -> bool {
        match self {
            StopWords::English => english().contains(token),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StopWords::English => english().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromStr for StopWords {
    type Err = SpamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" => Ok(StopWords::English),
            other => Err(SpamError::Config(format!(
                "Unsupported stop word list '{}' (expected 'english')",
                other
            ))),
        }
    }
}

impl fmt::Display for StopWords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopWords::English => write!(f, "english"),
        }
    }
}

fn english() -> &'static HashSet<&'static str> {
    static SET: OnceLock<HashSet<&'static str>> = OnceLock::new();
    SET.get_or_init(|| stop_words::get(LANGUAGE::English).iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_contains_common_words() {
        let words = StopWords::English;
        assert!(words.contains("the"));
        assert!(words.contains("and"));
        assert!(!words.contains("prize"));
        assert!(!words.contains("currency_token"));
        assert!(words.contains("yourselves"));
        assert!(words.len() > 100);
    }

    #[test]
    fn test_parse_stop_words() {
        assert_eq!("english".parse::<StopWords>().unwrap(), StopWords::English);
        assert_eq!(" English ".parse::<StopWords>().unwrap(), StopWords::English);
        assert!("french".parse::<StopWords>().unwrap_err().is_config());
    }
}
