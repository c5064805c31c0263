use anyhow::{Context, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Lines};
use std::path::Path;

/// Forward-only reader over the physical lines of a dump file.
///
/// Lines keep their original content apart from the terminator; the leading
/// tab-separated key columns that precede the JSON payload are left intact
/// for the extractors to deal with. The file handle is released when the
/// reader is dropped; re-open to restart.
pub struct DumpReader {
    lines: Lines<BufReader<File>>,
}

impl std::fmt::Debug for DumpReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DumpReader").finish_non_exhaustive()
    }
}

impl DumpReader {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open dump file: {}", path.display()))?;
        Ok(Self {
            lines: BufReader::new(file).lines(),
        })
    }
}

impl Iterator for DumpReader {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.lines.next()
    }
}
