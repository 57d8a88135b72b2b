//! Index command: embed solved reference questions.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::{credentials, Settings};
use crate::embedding::create_embedder;
use crate::retrieval::{load_reference_records, ReferenceIndexer};
use crate::vector_store::create_vector_store;
use anyhow::Result;

/// Run the index command.
pub async fn run_index(file: &str, settings: Settings) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Index, &settings, credentials::env_lookup) {
        Output::error(&format!("{}", e));
        Output::info("Run 'svar doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let path = Settings::expand_path(file);
    let records = load_reference_records(&path)?;
    Output::info(&format!("Loaded {} reference pairs from {}", records.len(), path.display()));

    let store = create_vector_store(&settings)?;
    let indexer = ReferenceIndexer::new(create_embedder(&settings)?, store.clone());

    let pb = Output::progress_bar(records.len() as u64, "embedding");
    let written = indexer.index(&records, |done| pb.set_position(done as u64)).await;
    pb.finish_and_clear();

    let written = written?;
    Output::success(&format!(
        "Indexed {} pairs ({} documents in store)",
        written,
        store.document_count().await?
    ));
    Ok(())
}
