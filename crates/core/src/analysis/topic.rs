use crate::domain::risk::RiskCategory;
use crate::nlp::TopicClassifier;
use anyhow::Context;

/// Top-ranked category for `unit` among `categories`, as judged by the zero-shot classifier.
pub async fn classify(
    unit: &str,
    categories: &[RiskCategory],
    classifier: &dyn TopicClassifier,
) -> anyhow::Result<RiskCategory> {
    anyhow::ensure!(!categories.is_empty(), "risk taxonomy must be non-empty");

    let candidate_labels: Vec<&str> = categories.iter().map(|c| c.label()).collect();
    let ranked = classifier
        .classify_topic(unit, &candidate_labels)
        .await
        .context("topic classification failed")?;

    let top = ranked
        .first()
        .context("topic classifier returned no labels")?;
    RiskCategory::from_label(top)
        .filter(|c| categories.contains(c))
        .with_context(|| format!("topic classifier returned an unknown label: {top}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::fakes::FakeTopic;

    #[tokio::test]
    async fn returns_top_ranked_category() {
        let classifier = FakeTopic::fixed(RiskCategory::Regulatory.label());
        let category = classify("SEC sues AAPL.", &RiskCategory::ALL, &classifier)
            .await
            .unwrap();
        assert_eq!(category, RiskCategory::Regulatory);
    }

    #[tokio::test]
    async fn rejects_labels_outside_the_taxonomy() {
        let classifier = FakeTopic::fixed("WEATHER");
        assert!(classify("x", &RiskCategory::ALL, &classifier).await.is_err());

        let classifier = FakeTopic::fixed(RiskCategory::Macro.label());
        let narrowed = [RiskCategory::Finance];
        assert!(classify("x", &narrowed, &classifier).await.is_err());
    }

    #[tokio::test]
    async fn propagates_classifier_failure() {
        let err = classify("x", &RiskCategory::ALL, &FakeTopic::failing())
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("topic classification failed"));
    }
}
