use crate::chunking::TextChunker;
use crate::extractor::TextExtractor;
use crate::ingest::{IngestionReport, SkipReason, SkippedDocument};
use crate::models::{Chunk, ChunkMetadata};
use chrono::Utc;
use std::path::Path;
use tracing::{info, warn};

/// Append-only chunk texts with index-aligned metadata.
///
/// `chunks[i]` and `metadata[i]` always describe the same chunk; both vectors
/// only grow through [`DocumentStore::append`].
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    chunks: Vec<String>,
    metadata: Vec<ChunkMetadata>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn texts(&self) -> &[String] {
        &self.chunks
    }

    pub fn metadata(&self) -> &[ChunkMetadata] {
        &self.metadata
    }

    pub fn get(&self, index: usize) -> Option<Chunk> {
        let text = self.chunks.get(index)?;
        let metadata = self.metadata.get(index)?;
        Some(Chunk {
            text: text.clone(),
            metadata: metadata.clone(),
        })
    }

    pub fn append(&mut self, text: String, metadata: ChunkMetadata) {
        self.chunks.push(text);
        self.metadata.push(metadata);
    }

    /// Extracts, cleans and chunks every document, skipping the ones that
    /// are missing or yield no text.
    pub fn ingest<P, X>(
        &mut self,
        paths: &[P],
        extractor: &X,
        chunker: &TextChunker,
    ) -> IngestionReport
    where
        P: AsRef<Path>,
        X: TextExtractor + ?Sized,
    {
        info!(documents = paths.len(), "processing documents");
        let mut report = IngestionReport::default();

        for path in paths {
            let path = path.as_ref();
            let source = path.to_string_lossy().to_string();

            if !path.exists() {
                warn!(path = %source, "document not found");
                report.skipped.push(SkippedDocument {
                    path: path.to_path_buf(),
                    reason: SkipReason::Missing,
                });
                continue;
            }

            let text = match extractor.extract_text(path) {
                Ok(text) => text,
                Err(error) => {
                    warn!(path = %source, %error, "text extraction failed");
                    report.skipped.push(SkippedDocument {
                        path: path.to_path_buf(),
                        reason: SkipReason::ExtractionFailed(error.to_string()),
                    });
                    continue;
                }
            };

            let pieces = chunker.split(&text);
            if pieces.is_empty() {
                warn!(path = %source, "no text extracted");
                report.skipped.push(SkippedDocument {
                    path: path.to_path_buf(),
                    reason: SkipReason::EmptyText,
                });
                continue;
            }

            let created_at = Utc::now();
            report.chunk_count += pieces.len();
            report.documents_ingested += 1;

            for (sequence_index, text) in pieces.into_iter().enumerate() {
                let metadata = ChunkMetadata {
                    source_document: source.clone(),
                    sequence_index,
                    length: text.chars().count(),
                    created_at,
                };
                self.append(text, metadata);
            }
        }

        if report.is_empty() {
            warn!("no document chunks were produced");
        } else {
            info!(
                documents = report.documents_ingested,
                chunk_count = report.chunk_count,
                "documents chunked"
            );
        }

        report
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::chunking::ChunkingConfig;
    use crate::IngestError;
    use std::collections::HashMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::tempdir;

    /// Serves canned text per file name; anything else fails to parse.
    #[derive(Default)]
    pub(crate) struct FakeExtractor {
        pub(crate) texts: HashMap<String, String>,
    }

    impl FakeExtractor {
        pub(crate) fn with(name: &str, text: &str) -> Self {
            let mut texts = HashMap::new();
            texts.insert(name.to_string(), text.to_string());
            Self { texts }
        }
    }

    impl TextExtractor for FakeExtractor {
        fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
            let name = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            self.texts
                .get(name)
                .cloned()
                .ok_or_else(|| IngestError::PdfParse(format!("cannot parse {name}")))
        }
    }

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"%PDF-1.4").unwrap();
        path
    }

    #[test]
    fn ingest_appends_chunks_with_aligned_metadata() {
        let dir = tempdir().unwrap();
        let first = touch(dir.path(), "first.pdf");
        let second = touch(dir.path(), "second.pdf");

        let mut extractor = FakeExtractor::with("first.pdf", "one two three four five six");
        extractor
            .texts
            .insert("second.pdf".to_string(), "alpha beta".to_string());
        let chunker = TextChunker::new(ChunkingConfig {
            chunk_size: 4,
            overlap: 1,
        })
        .unwrap();

        let mut store = DocumentStore::new();
        let report = store.ingest(&[first.clone(), second.clone()], &extractor, &chunker);

        assert_eq!(report.documents_ingested, 2);
        assert_eq!(report.chunk_count, 3);
        assert_eq!(store.len(), store.metadata().len());
        assert_eq!(store.texts(), ["one two three four", "four five six", "alpha beta"]);

        let sequence = store
            .metadata()
            .iter()
            .map(|meta| meta.sequence_index)
            .collect::<Vec<_>>();
        assert_eq!(sequence, [0, 1, 0]);

        let last = store.get(2).unwrap();
        assert_eq!(last.metadata.source_document, second.to_string_lossy());
        assert_eq!(last.metadata.length, "alpha beta".len());
    }

    #[test]
    fn ingest_skips_missing_broken_and_empty_documents() {
        let dir = tempdir().unwrap();
        let good = touch(dir.path(), "good.pdf");
        let broken = touch(dir.path(), "broken.pdf");
        let blank = touch(dir.path(), "blank.pdf");
        let missing = dir.path().join("missing.pdf");

        let mut extractor = FakeExtractor::with("good.pdf", "KALIA Yojana supports farmers.");
        extractor
            .texts
            .insert("blank.pdf".to_string(), "  \n ".to_string());
        let chunker = TextChunker::new(ChunkingConfig::default()).unwrap();

        let mut store = DocumentStore::new();
        let report = store.ingest(&[missing, broken, blank, good], &extractor, &chunker);

        assert_eq!(report.documents_ingested, 1);
        assert_eq!(store.len(), 1);
        let reasons = report
            .skipped
            .iter()
            .map(|skipped| skipped.reason.clone())
            .collect::<Vec<_>>();
        assert_eq!(reasons[0], SkipReason::Missing);
        assert!(matches!(reasons[1], SkipReason::ExtractionFailed(_)));
        assert_eq!(reasons[2], SkipReason::EmptyText);
    }

    #[test]
    fn ingest_of_nothing_leaves_store_empty() {
        let chunker = TextChunker::new(ChunkingConfig::default()).unwrap();
        let mut store = DocumentStore::new();
        let report = store.ingest::<PathBuf, _>(&[], &FakeExtractor::default(), &chunker);
        assert!(report.is_empty());
        assert!(store.is_empty());
    }
}
