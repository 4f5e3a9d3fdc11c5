//! Feature extraction + classification as one fit/predict unit
//!
//! The vectorizer and classifier are always fitted, persisted and loaded
//! together, so prediction always runs in the feature space the model was
//! trained in. Input texts must already be normalized with
//! [`crate::text::TextNormalizer`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::info;

use crate::classifier::{argmax, Classifier, Estimator, ModelKind, N_CLASSES};
use crate::error::{Result, SpamError};
use crate::features::TfidfVectorizer;

/// A single prediction with every class probability paired with its label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    /// Predicted label
    pub label: String,
    /// Highest class probability in the row; not necessarily P(spam)
    pub confidence: f64,
    /// `(label, probability)` in class order
    pub probabilities: Vec<(String, f64)>,
}

impl Prediction {
    /// Probability assigned to `label`, if it is a known class
    pub fn probability_of(&self, label: &str) -> Option<f64> {
        self.probabilities
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| *p)
    }
}

/// Fitted vocabulary + weighting + classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    vectorizer: TfidfVectorizer,
    classifier: Classifier,
    /// Sorted unique training labels; probability columns follow this order
    classes: Vec<String>,
}

impl Pipeline {
    pub fn new(vectorizer: TfidfVectorizer, classifier: Classifier) -> Self {
        Self {
            vectorizer,
            classifier,
            classes: Vec::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        !self.classes.is_empty()
    }

    /// Labels in probability-column order (sorted)
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model_kind(&self) -> ModelKind {
        self.classifier.kind()
    }

    /// Whether the fitted classifier can produce class probabilities
    pub fn supports_proba(&self) -> bool {
        self.is_fitted() && self.classifier.supports_proba()
    }

    /// Fit the vectorizer on `texts`, transform them, then fit the classifier
    pub fn fit<S: AsRef<str>, L: AsRef<str>>(&mut self, texts: &[S], labels: &[L]) -> Result<()> {
        if texts.len() != labels.len() {
            return Err(SpamError::Training(format!(
                "{} texts but {} labels",
                texts.len(),
                labels.len()
            )));
        }

        let classes: Vec<String> = labels
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if classes.len() != N_CLASSES {
            return Err(SpamError::Training(format!(
                "expected exactly {} classes, found {:?}",
                N_CLASSES, classes
            )));
        }

        let y: Vec<usize> = labels
            .iter()
            .map(|l| classes.iter().position(|c| c == l.as_ref()).unwrap_or(0))
            .collect();

        self.vectorizer.fit(texts)?;
        let x = self.vectorizer.transform(texts)?;
        self.classifier.fit(&x, &y)?;
        self.classes = classes;

        info!(
            "Pipeline fitted: {} classifier, {} features, classes {:?}",
            self.classifier.kind(),
            self.vectorizer.dim()?,
            self.classes
        );
        Ok(())
    }

    fn ensure_fitted(&self) -> Result<()> {
        if self.is_fitted() {
            Ok(())
        } else {
            Err(SpamError::NotFitted("Pipeline"))
        }
    }

    /// Predicted label per text
    pub fn predict<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<String>> {
        self.ensure_fitted()?;
        let x = self.vectorizer.transform(texts)?;
        Ok(self
            .classifier
            .predict(&x)?
            .into_iter()
            .map(|c| self.classes[c].clone())
            .collect())
    }

    /// Per-text probability rows ordered by [`Pipeline::classes`]
    pub fn predict_proba<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vec<f64>>> {
        self.ensure_fitted()?;
        let x = self.vectorizer.transform(texts)?;
        self.classifier.predict_proba(&x)
    }

    /// Label, confidence (max row probability) and labelled probabilities for one text
    pub fn predict_one(&self, text: &str) -> Result<Prediction> {
        self.ensure_fitted()?;
        let x = self.vectorizer.transform(&[text])?;
        let class = self
            .classifier
            .predict(&x)?
            .first()
            .copied()
            .ok_or_else(|| SpamError::Prediction("classifier returned no prediction".to_string()))?;
        let row = self
            .classifier
            .predict_proba(&x)?
            .into_iter()
            .next()
            .ok_or_else(|| SpamError::Prediction("classifier returned no probabilities".to_string()))?;

        let confidence = row[argmax(&row)];
        let probabilities = self.classes.iter().cloned().zip(row).collect();

        Ok(Prediction {
            label: self.classes[class].clone(),
            confidence,
            probabilities,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        LogisticRegressionParams, ModelConfig, NaiveBayesParams, SvmParams, TfidfConfig,
    };
    use crate::classifier::LinearSvm;
    use crate::features::VectorizerSettings;

    fn pipeline(kind: ModelKind) -> Pipeline {
        let config = ModelConfig {
            kind,
            tfidf: TfidfConfig::default(),
            naive_bayes: NaiveBayesParams::default(),
            svm: SvmParams::default(),
            logistic_regression: LogisticRegressionParams::default(),
        };
        Pipeline::new(
            TfidfVectorizer::new(VectorizerSettings::default()),
            Classifier::from_config(&config, 42),
        )
    }

    fn corpus() -> (Vec<&'static str>, Vec<&'static str>) {
        let texts = vec![
            "win a free prize now exclamation_token",
            "free entry claim your cash prize",
            "urgent you won currency_token 1000 call now",
            "claim free cash currency_token",
            "are we still on for lunch today",
            "can you pick up milk on the way home",
            "see you at the meeting tomorrow",
            "thanks for dinner last night",
            "lunch tomorrow at noon",
        ];
        let labels = vec!["spam", "spam", "spam", "spam", "ham", "ham", "ham", "ham", "ham"];
        (texts, labels)
    }

    #[test]
    fn test_predict_before_fit() {
        let p = pipeline(ModelKind::NaiveBayes);
        assert!(matches!(p.predict(&["hello"]).unwrap_err(), SpamError::NotFitted(_)));
        assert!(matches!(p.predict_one("hello").unwrap_err(), SpamError::NotFitted(_)));
    }

    #[test]
    fn test_classes_are_sorted() {
        let (texts, labels) = corpus();
        let mut p = pipeline(ModelKind::NaiveBayes);
        p.fit(&texts, &labels).unwrap();
        assert_eq!(p.classes(), &["ham".to_string(), "spam".to_string()]);
    }

    #[test]
    fn test_fit_and_predict_every_kind() {
        let (texts, labels) = corpus();
        for kind in [ModelKind::NaiveBayes, ModelKind::Svm, ModelKind::LogisticRegression] {
            let mut p = pipeline(kind);
            p.fit(&texts, &labels).unwrap();
            assert_eq!(p.model_kind(), kind);

            let predicted = p.predict(&["claim your free cash prize now", "lunch at noon"]).unwrap();
            assert_eq!(predicted, vec!["spam", "ham"], "{} mispredicts", kind);

            for row in p.predict_proba(&texts).unwrap() {
                assert!(row.iter().all(|v| (0.0..=1.0).contains(v)));
                assert!((row.iter().sum::<f64>() - 1.0).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_supports_proba() {
        let (texts, labels) = corpus();
        let mut uncalibrated = pipeline(ModelKind::Svm);
        uncalibrated.classifier = Classifier::Svm(LinearSvm::new(
            SvmParams {
                probability: false,
                ..SvmParams::default()
            },
            42,
        ));
        uncalibrated.fit(&texts, &labels).unwrap();
        assert!(!uncalibrated.supports_proba());
        assert_eq!(
            uncalibrated.predict(&["claim your free cash prize now"]).unwrap(),
            vec!["spam"]
        );
        assert!(matches!(
            uncalibrated.predict_one("claim your free cash prize now").unwrap_err(),
            SpamError::ProbabilityUnavailable(_)
        ));

        for kind in [ModelKind::NaiveBayes, ModelKind::Svm, ModelKind::LogisticRegression] {
            let mut p = pipeline(kind);
            assert!(!p.supports_proba());
            p.fit(&texts, &labels).unwrap();
            assert!(p.supports_proba(), "{}", kind);
        }
    }

    #[test]
    fn test_prediction_pairs_labels_with_probabilities() {
        let (texts, labels) = corpus();
        let mut p = pipeline(ModelKind::NaiveBayes);
        p.fit(&texts, &labels).unwrap();

        let prediction = p.predict_one("free cash prize").unwrap();
        assert_eq!(prediction.label, "spam");
        assert_eq!(prediction.probabilities.len(), 2);
        assert_eq!(prediction.probabilities[0].0, "ham");
        let spam = prediction.probability_of("spam").unwrap();
        assert_eq!(prediction.confidence, spam);
        assert!(prediction.confidence >= 0.5);
    }

    #[test]
    fn test_unseen_text_still_predicts() {
        let (texts, labels) = corpus();
        let mut p = pipeline(ModelKind::LogisticRegression);
        p.fit(&texts, &labels).unwrap();
        let prediction = p.predict_one("zzz qqq xyzzy").unwrap();
        assert!(p.classes().contains(&prediction.label));
        assert!((0.5..=1.0).contains(&prediction.confidence));
    }

    #[test]
    fn test_three_classes_rejected() {
        let mut p = pipeline(ModelKind::NaiveBayes);
        let err = p
            .fit(&["aa bb", "cc dd", "ee ff"], &["spam", "ham", "promo"])
            .unwrap_err();
        assert!(matches!(err, SpamError::Training(_)));
    }

    #[test]
    fn test_vectorizer_never_sees_predict_inputs() {
        let (texts, labels) = corpus();
        let mut p = pipeline(ModelKind::NaiveBayes);
        p.fit(&texts, &labels).unwrap();
        let before = p.vectorizer().clone();
        p.predict(&["brand new words here"]).unwrap();
        assert_eq!(p.vectorizer(), &before);
    }
}
