#![allow(dead_code)]

use std::path::{Path, PathBuf};

const HAM_OPENERS: [&str; 10] = [
    "Hey", "Hi", "Morning", "Ok", "Sorry", "Thanks", "Yo", "Hello", "Cool", "Sure",
];

const HAM_BODIES: [&str; 10] = [
    "are we still on for lunch today?",
    "can you pick up milk on the way home",
    "see you at the meeting tomorrow",
    "I will call you later tonight",
    "running a bit late, be there soon",
    "did you finish the report for work",
    "lunch at the usual place at noon?",
    "mum says dinner is at seven",
    "what time does the movie start",
    "happy birthday, have a great day",
];

const SPAM_HOOKS: [&str; 4] = ["WINNER!", "URGENT!", "Congratulations!", "FREE entry!"];

const SPAM_BODIES: [&str; 5] = [
    "You have won a £1000 cash prize. Call 09061701461 now to claim",
    "Claim your free mobile phone upgrade, text WIN to 80086",
    "You are selected for a $500 reward, reply YES to claim now",
    "Free ringtones and prizes every week, txt STOP to opt out",
    "Your account won a guaranteed €2000 bonus, call now",
];

/// 100 ham + 20 spam messages as (label, text)
pub fn messages() -> Vec<(&'static str, String)> {
    let ham = (0..100).map(|i| ("ham", format!("{}, {}", HAM_OPENERS[i % 10], HAM_BODIES[i / 10])));
    let spam = (0..20).map(|i| ("spam", format!("{} {}", SPAM_HOOKS[i % 4], SPAM_BODIES[i / 4])));
    ham.chain(spam).collect()
}

/// Write the corpus as `v1,v2` CSV (label, text) and return its path
pub fn write_dataset(dir: &Path) -> PathBuf {
    let path = dir.join("spam.csv");
    let mut writer = csv::Writer::from_path(&path).unwrap();
    writer.write_record(["v1", "v2"]).unwrap();
    for (label, text) in messages() {
        writer.write_record([label, text.as_str()]).unwrap();
    }
    writer.flush().unwrap();
    path
}

/// YAML configuration rooted in `dir`
pub fn config_yaml(dir: &Path, model_type: &str) -> String {
    format!(
        r#"
data:
  raw_data_path: {data}
  text_column: v2
  label_column: v1
  test_size: 0.2
  random_state: 42
model:
  type: {model_type}
  tfidf:
    max_features: 500
paths:
  model_save_path: {model}
  vectorizer_save_path: {vocab}
"#,
        data = dir.join("spam.csv").display(),
        model_type = model_type,
        model = dir.join("models").join("spam_classifier.bin").display(),
        vocab = dir.join("models").join("vocabulary.json").display(),
    )
}

/// Write `config.yaml` into `dir` and return its path
pub fn write_config(dir: &Path, model_type: &str) -> PathBuf {
    let path = dir.join("config.yaml");
    std::fs::write(&path, config_yaml(dir, model_type)).unwrap();
    path
}
