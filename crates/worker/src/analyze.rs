use anyhow::Context;
use portwatch_core::analysis::merger::MergeOptions;
use portwatch_core::analysis::RiskPipeline;
use portwatch_core::config::Settings;
use portwatch_core::domain::portfolio::Portfolio;
use portwatch_core::nlp::Collaborators;
use portwatch_core::storage::report;
use portwatch_core::storage::session::{FileSessionStore, SessionStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub content_id: Option<String>,
    pub top: usize,
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalyzeOutcome {
    /// No transcript to analyze; nothing was written.
    NoSession,
    /// The transcript mentioned no portfolio asset or could not be loaded.
    NoFindings,
    Saved { path: PathBuf, records: usize },
}

pub async fn run(settings: &Settings, opts: AnalyzeOptions) -> anyhow::Result<()> {
    let portfolio = Portfolio::load(settings.portfolio_path.as_deref())?;

    // Models must be reachable before any work starts.
    let collaborators = Collaborators::hosted(settings).context("failed to set up nlp models")?;
    collaborators
        .warm_up()
        .await
        .context("failed to load required models")?;

    let store = FileSessionStore::new(&settings.data_dir);
    run_with(collaborators, &store, portfolio, &opts, &settings.data_dir).await?;
    Ok(())
}

/// Analyzes the selected session and writes the CSV report.
///
/// The CSV goes to `opts.output`, or to [`report::DEFAULT_OUTPUT_FILE`] under `output_dir`.
/// Nothing is written when there is no session or no finding.
pub async fn run_with(
    collaborators: Collaborators,
    store: &dyn SessionStore,
    portfolio: Portfolio,
    opts: &AnalyzeOptions,
    output_dir: &Path,
) -> anyhow::Result<AnalyzeOutcome> {
    let pointer = match opts.content_id.as_deref() {
        Some(id) => store.pointer_for(id),
        None => store.last_session().await,
    };
    let pointer = match pointer {
        Ok(pointer) => pointer,
        Err(err) => {
            eprintln!("Error: {err:#}");
            eprintln!("Please run `portwatch_worker fetch --content-id <ID>` first.");
            return Ok(AnalyzeOutcome::NoSession);
        }
    };

    println!(
        "Starting analysis on transcript: {}",
        pointer.transcript_path.display()
    );

    let pipeline = RiskPipeline::new(collaborators, Arc::new(portfolio))
        .with_merge_options(MergeOptions::from_env());
    let findings = pipeline
        .analyze_session(store, &pointer)
        .await
        .with_context(|| format!("analysis of {} failed", pointer.content_id))?;

    let banner = "=".repeat(50);
    println!("\n{banner}");
    println!(" FINANCIAL RISK ANALYSIS RESULTS (Top Findings) ");
    println!("{banner}");

    if findings.is_empty() {
        println!(
            "No relevant portfolio assets were mentioned or the transcript could not be loaded."
        );
        return Ok(AnalyzeOutcome::NoFindings);
    }

    println!("{}", report::to_markdown(&findings, opts.top));

    let output = opts
        .output
        .clone()
        .unwrap_or_else(|| output_dir.join(report::DEFAULT_OUTPUT_FILE));
    report::write_csv(&output, &findings).await?;

    println!("\n{banner}");
    println!(" Full results saved to {}", output.display());
    println!("{banner}");

    tracing::info!(
        content_id = %pointer.content_id,
        records = findings.len(),
        worst = findings.records()[0].portfolio_impact_score,
        "analysis finished"
    );
    Ok(AnalyzeOutcome::Saved {
        path: output,
        records: findings.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use portwatch_core::domain::risk::{RiskCategory, SentimentLabel};
    use portwatch_core::ingest::types::TranscriptFragment;
    use portwatch_core::nlp::fakes::{FakeEntities, FakeSentiment, FakeTopic};
    use portwatch_core::storage::session::LAST_SESSION_FILE;
    use tempfile::tempdir;

    fn collaborators() -> Collaborators {
        Collaborators {
            sentiment: Arc::new(
                FakeSentiment::constant(SentimentLabel::Neutral, 0.5)
                    .with_rule("soared", SentimentLabel::Positive, 0.8)
                    .with_rule("slipped", SentimentLabel::Negative, 0.9),
            ),
            topic: Arc::new(FakeTopic::fixed(RiskCategory::Finance.label())),
            entities: Arc::new(FakeEntities::none()),
        }
    }

    fn opts() -> AnalyzeOptions {
        AnalyzeOptions {
            content_id: None,
            top: 5,
            output: None,
        }
    }

    fn fragments(texts: &[&str]) -> Vec<TranscriptFragment> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TranscriptFragment {
                text: t.to_string(),
                start: i as f64,
                duration: 1.0,
            })
            .collect()
    }

    #[tokio::test]
    async fn missing_last_session_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());

        let outcome = run_with(collaborators(), &store, Portfolio::reference(), &opts(), dir.path())
            .await
            .unwrap();

        assert_eq!(outcome, AnalyzeOutcome::NoSession);
        assert!(!dir.path().join(LAST_SESSION_FILE).exists());
        assert!(!dir.path().join(report::DEFAULT_OUTPUT_FILE).exists());
    }

    #[tokio::test]
    async fn corrupt_transcript_writes_nothing() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        let pointer = store
            .save_transcript("vid", &fragments(&["AAPL slipped."]))
            .await
            .unwrap();
        std::fs::write(&pointer.transcript_path, "{not json").unwrap();

        let outcome = run_with(collaborators(), &store, Portfolio::reference(), &opts(), dir.path())
            .await
            .unwrap();

        assert_eq!(outcome, AnalyzeOutcome::NoFindings);
        assert!(!dir.path().join(report::DEFAULT_OUTPUT_FILE).exists());
    }

    #[tokio::test]
    async fn findings_are_saved_worst_first() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store
            .save_transcript(
                "vid",
                &fragments(&["MSFT soared.", "Nothing else.", "AAPL slipped.", "TESLA was flat."]),
            )
            .await
            .unwrap();

        let outcome = run_with(collaborators(), &store, Portfolio::reference(), &opts(), dir.path())
            .await
            .unwrap();

        let path = dir.path().join(report::DEFAULT_OUTPUT_FILE);
        assert_eq!(
            outcome,
            AnalyzeOutcome::Saved {
                path: path.clone(),
                records: 3
            }
        );

        let csv = std::fs::read_to_string(&path).unwrap();
        let assets: Vec<&str> = csv
            .lines()
            .skip(1)
            .map(|line| line.split(',').next().unwrap())
            .collect();
        assert_eq!(assets, vec!["AAPL", "TESLA", "MSFT"]);
        assert!(csv.lines().nth(1).unwrap().ends_with(",-3.15"));
    }

    #[tokio::test]
    async fn explicit_output_path_is_honored() {
        let dir = tempdir().unwrap();
        let store = FileSessionStore::new(dir.path());
        store
            .save_transcript("vid", &fragments(&["AAPL slipped."]))
            .await
            .unwrap();
        let custom = dir.path().join("custom.csv");
        let opts = AnalyzeOptions {
            content_id: Some("vid".to_string()),
            output: Some(custom.clone()),
            ..opts()
        };

        let outcome = run_with(collaborators(), &store, Portfolio::reference(), &opts, dir.path())
            .await
            .unwrap();

        assert!(matches!(outcome, AnalyzeOutcome::Saved { path, records: 1 } if path == custom));
        assert!(custom.exists());
        assert!(!dir.path().join(report::DEFAULT_OUTPUT_FILE).exists());
    }
}
