use crate::config::UNKNOWN_AUTHOR;
use crate::models::{Author, Book};
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Read side of the store, used while resolving work -> author references.
pub trait AuthorLookup {
    /// Stored display name for `id`, or `None` when no such author exists.
    fn find_name(&self, id: &str) -> Option<String>;

    /// Never fails: an unresolved id maps to the sentinel name.
    fn display_name(&self, id: &str) -> String {
        self.find_name(id)
            .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
    }
}

/// Write side of the store: insert-or-replace keyed by natural id.
pub trait RecordSink {
    fn upsert_author(&mut self, author: &Author) -> Result<()>;
    fn upsert_book(&mut self, book: &Book) -> Result<()>;
}

/// Document store keeping one JSON file per record under
/// `<root>/authors/` and `<root>/books/`.
pub struct JsonStore {
    root: PathBuf,
}

impl JsonStore {
    pub fn open(root: &Path) -> Result<Self> {
        for kind in ["authors", "books"] {
            let dir = root.join(kind);
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create store directory: {}", dir.display()))?;
        }
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    fn record_path(&self, kind: &str, id: &str) -> PathBuf {
        // Ids become file names; separators must not split them into
        // extra path components.
        let stem = id.replace(['/', '\\'], "_");
        self.root.join(kind).join(format!("{stem}.json"))
    }

    fn write_record<T: Serialize>(&self, path: &Path, record: &T) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create record file: {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, record)
            .with_context(|| format!("Failed to serialize record: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush record file: {}", path.display()))?;
        Ok(())
    }
}

impl RecordSink for JsonStore {
    fn upsert_author(&mut self, author: &Author) -> Result<()> {
        self.write_record(&self.record_path("authors", &author.id), author)
    }

    fn upsert_book(&mut self, book: &Book) -> Result<()> {
        self.write_record(&self.record_path("books", &book.id), book)
    }
}

impl AuthorLookup for JsonStore {
    fn find_name(&self, id: &str) -> Option<String> {
        let path = self.record_path("authors", id);
        let file = File::open(&path).ok()?;
        match serde_json::from_reader::<_, Author>(BufReader::new(file)) {
            Ok(author) => Some(author.name),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Stored author record is unreadable");
                None
            }
        }
    }
}

/// In-memory store backed by hash maps, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryStore {
    authors: HashMap<String, Author>,
    books: HashMap<String, Book>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn author(&self, id: &str) -> Option<&Author> {
        self.authors.get(id)
    }

    pub fn book(&self, id: &str) -> Option<&Book> {
        self.books.get(id)
    }

    pub fn author_count(&self) -> usize {
        self.authors.len()
    }

    pub fn book_count(&self) -> usize {
        self.books.len()
    }
}

impl RecordSink for MemoryStore {
    fn upsert_author(&mut self, author: &Author) -> Result<()> {
        self.authors.insert(author.id.clone(), author.clone());
        Ok(())
    }

    fn upsert_book(&mut self, book: &Book) -> Result<()> {
        self.books.insert(book.id.clone(), book.clone());
        Ok(())
    }
}

impl AuthorLookup for MemoryStore {
    fn find_name(&self, id: &str) -> Option<String> {
        self.authors.get(id).map(|a| a.name.clone())
    }
}
