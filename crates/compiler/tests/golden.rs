//! Golden-file regression tests.
//!
//! `.omni` sources under `testdata/tokens` pair with `.tok` snapshots of
//! the lexer dump; sources under `testdata/ast` pair with `.ast`
//! snapshots of the printer output. Comparison strips trailing spaces
//! and tabs from every line. Run with `UPDATE_GOLDENS=1` to rewrite the
//! snapshots from actual output.

use std::fs;
use std::path::{Path, PathBuf};

fn testdata(kind: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join(kind)
}

fn normalize(text: &str) -> Vec<String> {
    let mut lines: Vec<String> = text.lines().map(|l| l.trim_end().to_string()).collect();
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }
    lines
}

fn check_goldens(kind: &str, golden_ext: &str, produce: fn(&str, &str) -> Result<String, String>) {
    let dir = testdata(kind);
    let mut checked = 0;
    let mut entries: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|e| panic!("cannot read {}: {}", dir.display(), e))
        .map(|entry| entry.expect("directory entry").path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "omni"))
        .collect();
    entries.sort();

    for source_path in entries {
        let golden_path = source_path.with_extension(golden_ext);
        let source = fs::read_to_string(&source_path)
            .unwrap_or_else(|e| panic!("cannot read {}: {}", source_path.display(), e));
        let file_name = source_path.display().to_string();
        let actual = produce(&file_name, &source)
            .unwrap_or_else(|e| panic!("{} failed:\n{}", file_name, e));

        if std::env::var("UPDATE_GOLDENS").as_deref() == Ok("1") {
            fs::write(&golden_path, &actual)
                .unwrap_or_else(|e| panic!("cannot write {}: {}", golden_path.display(), e));
            checked += 1;
            continue;
        }

        let expected = fs::read_to_string(&golden_path)
            .unwrap_or_else(|e| panic!("cannot read {}: {}", golden_path.display(), e));
        assert_eq!(
            normalize(&actual),
            normalize(&expected),
            "golden mismatch for {} (set UPDATE_GOLDENS=1 to regenerate)",
            golden_path.display()
        );
        checked += 1;
    }
    assert!(checked > 0, "no .omni sources found under {}", dir.display());
}

#[test]
fn token_goldens() {
    check_goldens("tokens", "tok", omnic::tokens_dump);
}

#[test]
fn ast_goldens() {
    check_goldens("ast", "ast", omnic::ast_dump);
}
