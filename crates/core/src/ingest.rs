use std::fmt;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

pub fn discover_pdf_files(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Missing,
    ExtractionFailed(String),
    EmptyText,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::Missing => f.write_str("document not found"),
            SkipReason::ExtractionFailed(reason) => write!(f, "text extraction failed: {reason}"),
            SkipReason::EmptyText => f.write_str("no text extracted"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default)]
pub struct IngestionReport {
    pub documents_ingested: usize,
    pub chunk_count: usize,
    pub skipped: Vec<SkippedDocument>,
}

impl IngestionReport {
    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }
}

#[cfg(test)]
mod tests {
    use super::discover_pdf_files;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn discover_pdf_files_is_recursive_and_sorted() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let base = dir.path();
        let nested = base.join("nested");
        fs::create_dir(&nested)?;

        File::create(base.join("b.PDF")).and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        File::create(nested.join("a.pdf"))
            .and_then(|mut file| file.write_all(b"%PDF-1.4\n%fake"))?;
        fs::write(base.join("notes.txt"), b"not a pdf")?;

        let files = discover_pdf_files(base);
        assert_eq!(files.len(), 2);
        assert_eq!(files[0], base.join("b.PDF"));
        assert_eq!(files[1], nested.join("a.pdf"));
        Ok(())
    }
}
