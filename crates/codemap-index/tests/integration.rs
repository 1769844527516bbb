//! Integration tests for codemap-index
//!
//! Tests the public API against the fixture files and small on-disk projects.

use std::fs;
use std::path::{Path, PathBuf};

use codemap_index::{
    FileEvent, Indexer, Language, ScoreConfig, SourceFile, SymbolCache, SymbolExtractor,
    SymbolKind, TokenScorer, classify, top_tokens,
};
use tempfile::tempdir;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn function_names(path: &Path) -> Vec<String> {
    let file = SourceFile::read(path).expect("Should read fixture");
    let mut extractor = SymbolExtractor::new();
    extractor
        .extract(&file, classify(path))
        .into_iter()
        .filter(|s| s.kind == SymbolKind::Function)
        .map(|s| s.name)
        .collect()
}

#[test]
fn classify_fixtures() {
    assert_eq!(classify(&fixture("test.c")), Language::C);
    assert_eq!(classify(&fixture("test.cpp")), Language::Cpp);
    assert_eq!(classify(Path::new("tests/fixtures/README")), Language::Unknown);
}

#[test]
fn c_fixture_has_greet_and_main() {
    assert_eq!(function_names(&fixture("test.c")), vec!["greet", "main"]);
}

#[test]
fn cpp_fixture_has_greet_and_main() {
    assert_eq!(function_names(&fixture("test.cpp")), vec!["greet", "main"]);
}

#[test]
fn extraction_is_idempotent() {
    for name in ["test.c", "test.cpp"] {
        let path = fixture(name);
        let file = SourceFile::read(&path).expect("Should read fixture");
        let mut extractor = SymbolExtractor::new();

        let first = extractor.extract(&file, file.language());
        let second = extractor.extract(&file, file.language());
        assert_eq!(first, second, "{name}");

        let mut fresh = SymbolExtractor::new();
        assert_eq!(first, fresh.extract(&file, file.language()), "{name}");
    }
}

#[test]
fn fixture_scans_record_calls_and_lines() {
    let mut extractor = SymbolExtractor::new();

    let c = extractor.scan(&SourceFile::read(&fixture("test.c")).unwrap());
    let c_calls: Vec<_> = c.calls.iter().map(|call| call.callee.as_str()).collect();
    assert_eq!(c_calls, vec!["printf", "greet"]);
    assert_eq!(c.line_count, 10);

    let cpp = extractor.scan(&SourceFile::read(&fixture("test.cpp")).unwrap());
    let cpp_calls: Vec<_> = cpp.calls.iter().map(|call| call.callee.as_str()).collect();
    assert_eq!(cpp_calls, vec!["greet"]);
}

#[test]
fn scan_serializes_to_json() {
    let mut extractor = SymbolExtractor::new();
    let scan = extractor.scan(&SourceFile::read(&fixture("test.c")).unwrap());

    let json = serde_json::to_value(&scan).expect("Should serialize");
    assert_eq!(json["language"], "c");
    assert_eq!(json["symbols"][0]["name"], "greet");
    assert_eq!(json["symbols"][0]["kind"], "function");
    assert!(json["symbols"][0].get("scope").is_none());
}

#[test]
fn cache_tracks_file_changes() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let path = temp_dir.path().join("greet.c");
    fs::copy(fixture("test.c"), &path).expect("Should copy fixture");

    let mut indexer = Indexer::new(SymbolCache::new());
    let first = indexer.index_file(&path).unwrap();
    assert_eq!(first.cache_hits, 0);
    assert_eq!(first.symbols_found, 2);

    let second = indexer.index_file(&path).unwrap();
    assert_eq!(second.cache_hits, 1);

    fs::write(&path, "void greet() {}\nvoid wave() {}\nint main() { return 0; }\n").unwrap();
    let third = indexer.index_file(&path).unwrap();
    assert_eq!(third.cache_hits, 0);
    assert_eq!(third.symbols_found, 3);

    indexer.remove_file(&path);
    let stats = indexer.cache().stats();
    assert_eq!(stats.entries, 0);
    assert_eq!(stats.hits, 1);
}

#[test]
fn index_and_score_project() {
    let temp_dir = tempdir().expect("Failed to create temp dir");
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src/util")).unwrap();
    fs::write(
        root.join("src/util/strings.c"),
        "int str_len(const char *s) { int n = 0; while (s[n]) n++; return n; }\n\
         int str_unused(void) { return 0; }\n",
    )
    .unwrap();
    fs::write(
        root.join("src/main.cpp"),
        "int main() {\n    return str_len(\"abc\");\n}\n",
    )
    .unwrap();
    fs::write(root.join("README.md"), "# project\n").unwrap();

    let mut indexer = Indexer::new(SymbolCache::new());
    let stats = indexer.index_directory(root).expect("Should index project");
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.files_skipped, 1);

    let scores = TokenScorer::new(ScoreConfig::default()).score(root, indexer.cache().iter());
    let strings = &scores[Path::new("src/util/strings.c")];
    assert!(strings["str_len"] > strings["str_unused"]);

    let ranked = top_tokens(&scores, 10);
    assert_eq!(ranked.len(), 3);
}

#[test]
fn file_event_paths() {
    let path = fixture("test.c");
    assert_eq!(FileEvent::Modified(path.clone()).path(), path.as_path());
    assert_eq!(FileEvent::Deleted(path.clone()).path(), path.as_path());
}
