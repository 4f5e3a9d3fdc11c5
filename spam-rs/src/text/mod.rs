//! Text normalization and token filtering

pub mod normalizer;
pub mod stop_words;

pub use normalizer::{TextNormalizer, CURRENCY_TOKEN, EXCLAMATION_TOKEN, NORMALIZER_VERSION};
pub use stop_words::StopWords;
