//! Loads the research-paper corpus: a mapping from paper file name to its
//! full text content.

use std::collections::BTreeMap;
use std::path::Path;

/// Name of the smoke-test paper; excluded from full runs, and the only paper
/// used when `sample_only` is set.
pub const SAMPLE_PAPER: &str = "sample_paper.txt";

/// Reads every `*.txt` file under `dir` into a name -> content map.
/// Unreadable files are reported and skipped; a missing directory yields an
/// empty corpus. With `sample_only`, only [SAMPLE_PAPER] is kept; otherwise
/// [SAMPLE_PAPER] is excluded.
pub fn load_papers(dir: &Path, sample_only: bool) -> BTreeMap<String, String> {
    let mut papers = BTreeMap::new();

    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Papers directory {dir:?} not readable: {e}");
            return papers;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("txt") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                papers.insert(name.to_string(), content);
            }
            Err(e) => eprintln!("Failed to load paper {name}: {e}"),
        }
    }

    if sample_only {
        papers.retain(|name, _| name == SAMPLE_PAPER);
    } else {
        papers.remove(SAMPLE_PAPER);
    }
    papers
}
