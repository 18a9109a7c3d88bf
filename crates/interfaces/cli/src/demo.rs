use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tutorloom_assignment::{Assignment, Mode, assign};
use tutorloom_config::{EngineConfig, StorageBackend};
use tutorloom_conversation::ConversationMachine;
use tutorloom_llm::{Embedder, Generator, HttpCollaborator, stub::StubEmbedder, stub::StubGenerator};
use tutorloom_segmenter::{SegmentConfig, SemanticUnit, segment};
use tutorloom_storage::{FileSessionStore, InMemorySessionStore, SessionStore};

fn segment_config(config: &EngineConfig) -> SegmentConfig {
    SegmentConfig {
        similarity_threshold: config.segmentation.similarity_threshold,
        max_group_size: config.segmentation.max_group_size,
        min_group_size: config.segmentation.min_group_size,
    }
}

fn build_embedder(config: &EngineConfig) -> Arc<dyn Embedder> {
    if config.collaborator.use_stub {
        Arc::new(StubEmbedder::default())
    } else {
        Arc::new(HttpCollaborator::new(
            config.collaborator.base_url.clone(),
            config.collaborator.chat_model.clone(),
            config.collaborator.embedding_model.clone(),
            config.collaborator.api_key(),
        ))
    }
}

fn build_generator(config: &EngineConfig) -> Arc<dyn Generator> {
    if config.collaborator.use_stub {
        Arc::new(StubGenerator::default())
    } else {
        Arc::new(HttpCollaborator::new(
            config.collaborator.base_url.clone(),
            config.collaborator.chat_model.clone(),
            config.collaborator.embedding_model.clone(),
            config.collaborator.api_key(),
        ))
    }
}

fn build_store(config: &EngineConfig) -> Arc<dyn SessionStore> {
    match config.storage.backend {
        StorageBackend::Memory => Arc::new(InMemorySessionStore::new()),
        StorageBackend::File => Arc::new(FileSessionStore::new(config.storage.root_dir.clone())),
    }
}

pub async fn segment_document(text: &str, config: &EngineConfig) -> Result<Vec<SemanticUnit>> {
    let embedder = build_embedder(config);
    segment(text, embedder.as_ref(), segment_config(config))
        .await
        .context("segmenting document")
}

/// Drives every unit of a document through a single conversation session,
/// printing each bot turn as it's produced and persisting the resulting
/// state after each unit advances.
pub async fn run_session(
    text: &str,
    session_id: &str,
    mode: Mode,
    config: &EngineConfig,
) -> Result<()> {
    let units = segment_document(text, config).await?;
    let assignment: Assignment = assign(&units, mode);
    let generator = build_generator(config);
    let store = build_store(config);
    let deadline = Duration::from_secs(config.collaborator.generator_deadline_seconds);

    let mut machine = ConversationMachine::initialize(session_id)
        .map_err(|err| anyhow::anyhow!("initializing session: {err}"))?;
    machine.load_document(units.len()).map_err(|err| anyhow::anyhow!("loading document: {err}"))?;
    machine
        .attach_assignment(&assignment)
        .map_err(|err| anyhow::anyhow!("attaching assignment: {err}"))?;
    machine.start_dialogue().map_err(|err| anyhow::anyhow!("starting dialogue: {err}"))?;

    for unit in &units {
        let text = machine
            .run_bot_turn(&unit.text, generator.as_ref(), deadline)
            .await
            .map_err(|err| anyhow::anyhow!("running bot turn for unit {}: {err}", unit.id))?;
        println!("[{}] {text}", unit.id);

        machine.advance_unit().map_err(|err| anyhow::anyhow!("advancing unit: {err}"))?;

        let blob = machine.save_state();
        store
            .put(session_id, blob)
            .await
            .map_err(|err| anyhow::anyhow!("persisting session state: {err}"))?;
    }

    println!("session {session_id} reached state: {:?}", machine.context().current_state);
    Ok(())
}
