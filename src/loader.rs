use crate::config::PROGRESS_INTERVAL;
use crate::extract;
use crate::source::DumpReader;
use crate::stats::PassStats;
use crate::store::{AuthorLookup, RecordSink};
use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::Path;
use tracing::{error, info};

/// Phases of a two-pass load. Within [`Loader::run`] the author phase always
/// precedes the work phase; the work pass reads author names back out of the
/// store the author pass just filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    NotStarted,
    AuthorsLoading,
    AuthorsDone,
    WorksLoading,
    Complete,
}

/// Outcome of [`Loader::run`]. A pass that aborted on an I/O fault is `None`;
/// everything below that level is caught per line and shows up in the stats.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub authors: Option<PassStats>,
    pub works: Option<PassStats>,
}

/// Drives the extraction passes over a bounded window of dump lines and
/// hands every parsed record to the store.
pub struct Loader<'a, S> {
    store: &'a mut S,
    limit: usize,
    phase: LoadPhase,
}

impl<'a, S: RecordSink + AuthorLookup> Loader<'a, S> {
    /// `limit` bounds how many lines of each dump are considered; lines
    /// beyond it are never read.
    pub fn new(store: &'a mut S, limit: usize) -> Self {
        Self {
            store,
            limit,
            phase: LoadPhase::NotStarted,
        }
    }

    pub fn phase(&self) -> LoadPhase {
        self.phase
    }

    /// Runs both passes strictly in order, never interleaved. A pass aborted
    /// by an I/O fault is logged and missing from the report; the other pass
    /// still runs. Running with an unreadable author dump therefore loads
    /// works whose author names all resolve to the sentinel.
    pub fn run(&mut self, author_dump: &Path, works_dump: &Path) -> LoadReport {
        let mut report = LoadReport::default();

        match self.load_authors(author_dump) {
            Ok(stats) => report.authors = Some(stats),
            Err(e) => error!(error = %e, "Author pass aborted"),
        }

        match self.load_works(works_dump) {
            Ok(stats) => report.works = Some(stats),
            Err(e) => error!(error = %e, "Work pass aborted"),
        }

        report
    }

    /// Author pass: parse up to `limit` lines and upsert each author.
    /// `Err` means the dump could not be opened or read; per-line faults
    /// are skipped and counted instead.
    pub fn load_authors(&mut self, path: &Path) -> Result<PassStats> {
        self.phase = LoadPhase::AuthorsLoading;
        let result = self.author_pass(path);
        self.phase = LoadPhase::AuthorsDone;
        result
    }

    /// Work pass: parse up to `limit` lines, resolve author references
    /// against the store, and upsert each book. Expects the author pass to
    /// have completed; without it every name resolves to the sentinel.
    pub fn load_works(&mut self, path: &Path) -> Result<PassStats> {
        self.phase = LoadPhase::WorksLoading;
        let result = self.work_pass(path);
        self.phase = LoadPhase::Complete;
        result
    }

    fn author_pass(&mut self, path: &Path) -> Result<PassStats> {
        info!(path = %path.display(), limit = self.limit, "Starting author pass");
        let reader = DumpReader::open(path)?;
        let pb = ProgressBar::new_spinner();
        let mut stats = PassStats::new();

        for line in reader.take(self.limit) {
            let line = line
                .with_context(|| format!("Failed to read from dump: {}", path.display()))?;
            stats.record_line();
            if stats.lines_seen % PROGRESS_INTERVAL == 0 {
                pb.tick();
            }

            let author = match extract::extract_author(&line) {
                Some(author) => author,
                None => {
                    stats.record_skipped();
                    continue;
                }
            };
            stats.record_parsed();

            match self.store.upsert_author(&author) {
                Ok(()) => {
                    info!(id = %author.id, name = %author.name, "Saved author");
                    stats.record_persisted();
                }
                Err(e) => {
                    error!(id = %author.id, error = %e, "Failed to persist author");
                    stats.record_store_failure();
                }
            }
        }

        pb.finish_and_clear();
        info!(
            seen = stats.lines_seen,
            parsed = stats.parsed,
            skipped = stats.skipped,
            persisted = stats.persisted,
            failures = stats.store_failures,
            "Author pass complete"
        );
        Ok(stats)
    }

    fn work_pass(&mut self, path: &Path) -> Result<PassStats> {
        info!(path = %path.display(), limit = self.limit, "Starting work pass");
        let reader = DumpReader::open(path)?;
        let pb = ProgressBar::new_spinner();
        let mut stats = PassStats::new();

        for line in reader.take(self.limit) {
            let line = line
                .with_context(|| format!("Failed to read from dump: {}", path.display()))?;
            stats.record_line();
            if stats.lines_seen % PROGRESS_INTERVAL == 0 {
                pb.tick();
            }

            let book = match extract::extract_book(&line, &*self.store) {
                Some(book) => book,
                None => {
                    stats.record_skipped();
                    continue;
                }
            };
            stats.record_parsed();

            match self.store.upsert_book(&book) {
                Ok(()) => {
                    info!(id = %book.id, name = %book.name, "Saved book");
                    stats.record_persisted();
                }
                Err(e) => {
                    error!(id = %book.id, error = %e, "Failed to persist book");
                    stats.record_store_failure();
                }
            }
        }

        pb.finish_and_clear();
        info!(
            seen = stats.lines_seen,
            parsed = stats.parsed,
            skipped = stats.skipped,
            persisted = stats.persisted,
            failures = stats.store_failures,
            "Work pass complete"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UNKNOWN_AUTHOR;
    use crate::models::{Author, Book};
    use crate::store::MemoryStore;
    use anyhow::bail;
    use std::io::Write;
    use std::path::PathBuf;
    use tempfile::NamedTempFile;

    fn dump_file(lines: &[String]) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(tmp, "{line}").unwrap();
        }
        tmp.flush().unwrap();
        tmp
    }

    fn author_line(id: &str, name: &str) -> String {
        format!(
            "/type/author\t/authors/{id}\t1\t2008-04-01T03:28:50.625462\t{}",
            serde_json::json!({
                "key": format!("/authors/{id}"),
                "name": name,
                "personal_name": name,
            })
        )
    }

    fn work_line(id: &str, title: &str, author_ids: &[&str]) -> String {
        let authors: Vec<_> = author_ids
            .iter()
            .map(|a| serde_json::json!({"author": {"key": format!("/authors/{a}")}}))
            .collect();
        format!(
            "/type/work\t/works/{id}\t1\t2009-12-11T01:57:19.964652\t{}",
            serde_json::json!({
                "key": format!("/works/{id}"),
                "title": title,
                "authors": authors,
            })
        )
    }

    #[test]
    fn author_pass_persists_records() {
        let dump = dump_file(&[
            author_line("OL1A", "Jane Doe"),
            author_line("OL2A", "John Roe"),
        ]);
        let mut store = MemoryStore::new();
        let mut loader = Loader::new(&mut store, 150);

        let stats = loader.load_authors(dump.path()).unwrap();
        assert_eq!(stats.lines_seen, 2);
        assert_eq!(stats.parsed, 2);
        assert_eq!(stats.persisted, 2);
        assert_eq!(stats.skipped, 0);
        assert_eq!(store.author("OL1A").unwrap().name, "Jane Doe");
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let dump = dump_file(&[
            author_line("OL1A", "Jane Doe"),
            "no json here".to_string(),
            "/type/author\t/authors/OL3A\t{\"key\":".to_string(),
            author_line("OL4A", "Kept Anyway"),
        ]);
        let mut store = MemoryStore::new();
        let mut loader = Loader::new(&mut store, 150);

        let stats = loader.load_authors(dump.path()).unwrap();
        assert_eq!(stats.lines_seen, 4);
        assert_eq!(stats.parsed, 2);
        assert_eq!(stats.skipped, 2);
        assert_eq!(store.author_count(), 2);
    }

    #[test]
    fn line_window_is_bounded() {
        let lines: Vec<String> = (0..10)
            .map(|i| author_line(&format!("OL{i}A"), "Someone"))
            .collect();
        let dump = dump_file(&lines);
        let mut store = MemoryStore::new();
        let mut loader = Loader::new(&mut store, 3);

        let stats = loader.load_authors(dump.path()).unwrap();
        assert_eq!(stats.lines_seen, 3);
        assert_eq!(stats.persisted, 3);
        assert_eq!(store.author_count(), 3);
    }

    #[test]
    fn work_pass_snapshots_author_names() {
        let authors = dump_file(&[author_line("OL1A", "Jane Doe")]);
        let works = dump_file(&[work_line("OL1W", "A Study", &["OL1A", "OL9A"])]);
        let mut store = MemoryStore::new();
        let mut loader = Loader::new(&mut store, 150);

        loader.load_authors(authors.path()).unwrap();
        assert_eq!(loader.phase(), LoadPhase::AuthorsDone);
        loader.load_works(works.path()).unwrap();
        assert_eq!(loader.phase(), LoadPhase::Complete);

        let book = store.book("OL1W").unwrap();
        assert_eq!(book.author_ids, vec!["OL1A", "OL9A"]);
        assert_eq!(book.author_names, vec!["Jane Doe", UNKNOWN_AUTHOR]);
    }

    #[test]
    fn works_without_author_pass_resolve_to_sentinel() {
        let works = dump_file(&[
            work_line("OL1W", "First", &["OL1A"]),
            work_line("OL2W", "Second", &["OL2A", "OL3A"]),
        ]);
        let mut store = MemoryStore::new();
        let mut loader = Loader::new(&mut store, 150);

        let stats = loader.load_works(works.path()).unwrap();
        assert_eq!(stats.persisted, 2);
        for id in ["OL1W", "OL2W"] {
            let book = store.book(id).unwrap();
            assert!(book.author_names.iter().all(|n| n == UNKNOWN_AUTHOR));
        }
    }

    #[test]
    fn run_orders_phases_and_reports_both_passes() {
        let authors = dump_file(&[author_line("OL1A", "Jane Doe")]);
        let works = dump_file(&[work_line("OL1W", "A Study", &["OL1A"])]);
        let mut store = MemoryStore::new();
        let mut loader = Loader::new(&mut store, 150);
        assert_eq!(loader.phase(), LoadPhase::NotStarted);

        let report = loader.run(authors.path(), works.path());
        assert_eq!(loader.phase(), LoadPhase::Complete);
        assert_eq!(report.authors.unwrap().persisted, 1);
        assert_eq!(report.works.unwrap().persisted, 1);
        assert_eq!(
            store.book("OL1W").unwrap().author_names,
            vec!["Jane Doe"]
        );
    }

    #[test]
    fn unreadable_author_dump_aborts_only_that_pass() {
        let works = dump_file(&[work_line("OL1W", "Orphan", &["OL1A"])]);
        let mut store = MemoryStore::new();
        let mut loader = Loader::new(&mut store, 150);

        let report = loader.run(&PathBuf::from("/nonexistent/authors.txt"), works.path());
        assert!(report.authors.is_none());
        let works_stats = report.works.unwrap();
        assert_eq!(works_stats.persisted, 1);
        assert_eq!(
            store.book("OL1W").unwrap().author_names,
            vec![UNKNOWN_AUTHOR]
        );
    }

    #[test]
    fn load_authors_errors_on_unreadable_path() {
        let mut store = MemoryStore::new();
        let mut loader = Loader::new(&mut store, 150);
        assert!(loader
            .load_authors(&PathBuf::from("/nonexistent/authors.txt"))
            .is_err());
    }

    /// Sink whose writes always fail, for exercising catch-log-continue.
    struct FailingStore;

    impl RecordSink for FailingStore {
        fn upsert_author(&mut self, _author: &Author) -> Result<()> {
            bail!("store unavailable")
        }

        fn upsert_book(&mut self, _book: &Book) -> Result<()> {
            bail!("store unavailable")
        }
    }

    impl AuthorLookup for FailingStore {
        fn find_name(&self, _id: &str) -> Option<String> {
            None
        }
    }

    #[test]
    fn store_failures_are_counted_and_do_not_abort() {
        let dump = dump_file(&[
            author_line("OL1A", "Jane Doe"),
            author_line("OL2A", "John Roe"),
        ]);
        let mut store = FailingStore;
        let mut loader = Loader::new(&mut store, 150);

        let stats = loader.load_authors(dump.path()).unwrap();
        assert_eq!(stats.parsed, 2);
        assert_eq!(stats.persisted, 0);
        assert_eq!(stats.store_failures, 2);
    }
}
