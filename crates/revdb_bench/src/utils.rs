//! Benchmark utilities.

use rand::Rng;
use revdb_core::{Context, DocStore, Document, DocumentId, Driver, DriverConfig, SharedDriver};
use tempfile::TempDir;

/// Generate random content of the specified size.
pub fn random_content(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate a batch of random document IDs.
pub fn generate_ids(count: usize) -> Vec<DocumentId> {
    (0..count).map(|_| DocumentId::generate()).collect()
}

/// Generate new documents with the specified content size.
pub fn generate_documents(count: usize, content_size: usize) -> Vec<Document> {
    generate_ids(count)
        .into_iter()
        .map(|id| Document::new(id, random_content(content_size)))
        .collect()
}

/// Driver configuration for a store file inside `dir`.
pub fn bench_config(dir: &TempDir) -> DriverConfig {
    DriverConfig::new(dir.path().join("bench.redb"))
}

/// Creates a shared-driver store in `dir` holding `count` documents, and
/// returns it with the saved documents.
pub fn populated_store(
    dir: &TempDir,
    count: usize,
    content_size: usize,
) -> (DocStore<SharedDriver>, Vec<Document>) {
    let store = DocStore::new(SharedDriver::new(bench_config(dir)));
    let saved = populate(&store, count, content_size);
    (store, saved)
}

/// Saves `count` new documents into the `bench` namespace of `store`.
pub fn populate<D: Driver>(store: &DocStore<D>, count: usize, content_size: usize) -> Vec<Document> {
    store
        .save_many(
            &Context::background(),
            "bench",
            generate_documents(count, content_size),
        )
        .expect("Failed to populate store")
}
