//! Multilingual talking-head example.
//!
//! Run with: `cargo run --example global_avatar`
//!
//! Requires `GOOGLE_API_KEY` environment variable.

use genstudio::features::GlobalAvatar;
use genstudio::{shell, GeminiClient, InMemoryMediaRegistry, JobOrchestrator, JobState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = GeminiClient::builder().build()?;
    let media = InMemoryMediaRegistry::new();
    let orchestrator = JobOrchestrator::builder(Arc::new(client))
        .media_registry(Arc::new(media.clone()))
        .build();
    let mut updates = orchestrator.subscribe();

    let job = GlobalAvatar::new(
        "a cheerful lighthouse keeper with a grey beard",
        "Welcome to the coast. The storm has passed and the sea is calm again.",
    )
    .with_language("Spanish");

    println!("Generating talking head (this may take a few minutes)...");
    orchestrator.submit(job).await;

    let snapshot = match updates.wait_for(|s| s.state().is_terminal()).await {
        Ok(snapshot) => snapshot.clone(),
        Err(_) => return Ok(()),
    };
    print!("{}", shell::render(&snapshot));

    if snapshot.state() == JobState::Done {
        if let Some(video) = snapshot.artifacts().iter().find_map(|(_, a)| match a {
            genstudio::Artifact::Video { media } => Some(media.clone()),
            _ => None,
        }) {
            if let Some(bytes) = media.get(video.url()) {
                std::fs::write("global_avatar.mp4", bytes.as_slice())?;
                println!("Saved global_avatar.mp4 ({} bytes)", video.size());
            }
        }
    }

    Ok(())
}
