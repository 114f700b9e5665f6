use anyhow::Context;
use portwatch_core::config::Settings;
use portwatch_core::ingest::provider::{HttpJsonTranscriptSource, TranscriptSource};
use portwatch_core::storage::session::{FileSessionStore, SessionStore};

const PREVIEW_CHARS: usize = 10_000;

pub async fn run(settings: &Settings, content_id: &str) -> anyhow::Result<()> {
    let source = HttpJsonTranscriptSource::from_settings(settings)?;
    let store = FileSessionStore::new(&settings.data_dir);

    let fetched = source
        .fetch_transcript(content_id)
        .await
        .with_context(|| format!("could not fetch transcript for id {content_id}"))?;

    let item = fetched.content_item(source.source_name());
    item.validate()
        .with_context(|| format!("transcript for id {content_id} is unusable"))?;

    println!("--- Transcript Successfully Fetched ---");
    println!("Video ID: {content_id}");
    println!(
        "First {PREVIEW_CHARS} characters of text:\n{}...",
        item.preview(PREVIEW_CHARS)
    );

    let pointer = store.save_transcript(content_id, &fetched.fragments).await?;

    println!(
        "\nSaved {} fragments to {}",
        fetched.fragments.len(),
        pointer.transcript_path.display()
    );
    println!("Recorded {content_id} as the last processed video in {}", store.dir().display());

    tracing::info!(
        %content_id,
        source = source.source_name(),
        language = item.language.as_deref().unwrap_or("unknown"),
        "transcript fetched"
    );
    Ok(())
}
