//! Text-level optimizer for generated C.
//!
//! A line-rewriting post-filter, not a real compiler pass: every rewrite
//! is a word-boundary-anchored regex so substituting `v1` can never
//! mangle `v10`. All levels are idempotent — running a level over its
//! own output is a no-op.
//!
//! Levels: `O0` passthrough; `O1` unused-variable elision plus
//! arithmetic identities (`x±0`, `x*1`, `x/1`); `O2` adds strength
//! reduction (`*2/4/8` to shifts, `/2/4/8` to shifts); `O3` currently
//! no-ops beyond `O2`; `Os` is `O1` plus variable-name minimization and
//! `//`-comment removal.

use crate::config::OptLevel;
use regex::Regex;
use std::sync::LazyLock;

/// Optimize generated C text at the given level.
pub fn optimize(code: &str, level: OptLevel) -> String {
    match level {
        OptLevel::O0 => code.to_string(),
        OptLevel::O1 => identities(&elide_unused(code)),
        OptLevel::O2 | OptLevel::O3 => strength_reduce(&identities(&elide_unused(code))),
        OptLevel::Os => {
            let out = identities(&elide_unused(code));
            let out = strip_line_comments(&out);
            minimize_names(&out)
        }
    }
}

static DECL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    // A plain declaration, optionally initialized with a literal:
    //   int32_t v3;   const char* v4 = "x";   double v5 = 1.5;
    // Initializers containing calls are kept (side effects).
    Regex::new(
        r#"^\s*(?:const\s+)?[A-Za-z_][A-Za-z0-9_]*(?:\s*\*+|\s)\s*([A-Za-z_][A-Za-z0-9_]*)\s*(?:=\s*[^;()]*)?;\s*$"#,
    )
    .expect("declaration pattern compiles")
});

/// Drop declarations of variables whose name occurs nowhere else.
/// Runs to fixpoint so the pass is idempotent.
fn elide_unused(code: &str) -> String {
    let mut current = code.to_string();
    loop {
        let mut removed = false;
        let lines: Vec<&str> = current.lines().collect();
        let mut kept: Vec<&str> = Vec::with_capacity(lines.len());
        for line in &lines {
            if let Some(caps) = DECL_LINE.captures(line) {
                let name = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
                let uses = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
                    .expect("name pattern compiles")
                    .find_iter(&current)
                    .count();
                if uses <= 1 {
                    removed = true;
                    continue;
                }
            }
            kept.push(line);
        }
        let next = join_lines(&kept, current.ends_with('\n'));
        if !removed {
            return next;
        }
        current = next;
    }
}

static IDENTITY_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"= ([A-Za-z_][A-Za-z0-9_]*) \+ 0;", "= $1;"),
        (r"= ([A-Za-z_][A-Za-z0-9_]*) - 0;", "= $1;"),
        (r"= 0 \+ ([A-Za-z_][A-Za-z0-9_]*);", "= $1;"),
        (r"= ([A-Za-z_][A-Za-z0-9_]*) \* 1;", "= $1;"),
        (r"= 1 \* ([A-Za-z_][A-Za-z0-9_]*);", "= $1;"),
        (r"= ([A-Za-z_][A-Za-z0-9_]*) / 1;", "= $1;"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (Regex::new(pattern).expect("identity pattern compiles"), replacement)
    })
    .collect()
});

fn identities(code: &str) -> String {
    let mut out = code.to_string();
    for (pattern, replacement) in IDENTITY_RULES.iter() {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    out
}

static STRENGTH_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"= ([A-Za-z_][A-Za-z0-9_]*) \* 2;", "= $1 << 1;"),
        (r"= ([A-Za-z_][A-Za-z0-9_]*) \* 4;", "= $1 << 2;"),
        (r"= ([A-Za-z_][A-Za-z0-9_]*) \* 8;", "= $1 << 3;"),
        (r"= ([A-Za-z_][A-Za-z0-9_]*) / 2;", "= $1 >> 1;"),
        (r"= ([A-Za-z_][A-Za-z0-9_]*) / 4;", "= $1 >> 2;"),
        (r"= ([A-Za-z_][A-Za-z0-9_]*) / 8;", "= $1 >> 3;"),
    ]
    .into_iter()
    .map(|(pattern, replacement)| {
        (Regex::new(pattern).expect("strength pattern compiles"), replacement)
    })
    .collect()
});

fn strength_reduce(code: &str) -> String {
    let mut out = code.to_string();
    for (pattern, replacement) in STRENGTH_RULES.iter() {
        out = pattern.replace_all(&out, *replacement).into_owned();
    }
    out
}

/// Remove `//` comments, leaving string and char literals intact.
fn strip_line_comments(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    for line in code.lines() {
        let mut cut = line.len();
        let bytes = line.as_bytes();
        let mut in_string = false;
        let mut in_char = false;
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' if in_string || in_char => i += 1,
                b'"' if !in_char => in_string = !in_string,
                b'\'' if !in_string => in_char = !in_char,
                b'/' if !in_string && !in_char && i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                    cut = i;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        out.push_str(line[..cut].trim_end());
        out.push('\n');
    }
    if !code.ends_with('\n') {
        out.pop();
    }
    out
}

static GENERATED_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:v\d+|tmp\d+)\b").expect("name pattern compiles"));

/// Rename generated variables (`v<N>`, `tmp<N>`) to the shortest free
/// names, in order of first occurrence.
fn minimize_names(code: &str) -> String {
    let mut seen = Vec::new();
    for m in GENERATED_NAME.find_iter(code) {
        let name = m.as_str().to_string();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }

    let mut out = code.to_string();
    let mut next = 0usize;
    for name in seen {
        let short = loop {
            let candidate = short_name(next);
            next += 1;
            let taken = Regex::new(&format!(r"\b{}\b", candidate))
                .expect("candidate pattern compiles")
                .is_match(&out);
            if !taken {
                break candidate;
            }
        };
        out = Regex::new(&format!(r"\b{}\b", regex::escape(&name)))
            .expect("rename pattern compiles")
            .replace_all(&out, short.as_str())
            .into_owned();
    }
    out
}

/// 0 -> "a", 25 -> "z", 26 -> "aa", …
fn short_name(mut n: usize) -> String {
    let mut name = String::new();
    loop {
        name.insert(0, (b'a' + (n % 26) as u8) as char);
        if n < 26 {
            return name;
        }
        n = n / 26 - 1;
    }
}

fn join_lines(lines: &[&str], trailing_newline: bool) -> String {
    let mut out = lines.join("\n");
    if trailing_newline {
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_o0_is_passthrough() {
        let code = "int32_t v0;\nv0 = 1 + 0;\n";
        assert_eq!(optimize(code, OptLevel::O0), code);
    }

    #[test]
    fn test_identity_simplification() {
        let code = "    v1 = v0 + 0;\n    v2 = v0 * 1;\n    v3 = v0 / 1;\n";
        let out = optimize(code, OptLevel::O1);
        assert!(out.contains("v1 = v0;"));
        assert!(out.contains("v2 = v0;"));
        assert!(out.contains("v3 = v0;"));
    }

    #[test]
    fn test_unused_variable_elision() {
        let code = "int32_t v0;\nint32_t v1;\nv1 = 2;\nreturn v1;\n";
        let out = optimize(code, OptLevel::O1);
        assert!(!out.contains("int32_t v0;"));
        assert!(out.contains("int32_t v1;"));
    }

    #[test]
    fn test_elision_keeps_call_initializers() {
        let code = "int32_t v0 = omni_getpid();\nreturn 0;\n";
        let out = optimize(code, OptLevel::O1);
        assert!(out.contains("omni_getpid"));
    }

    #[test]
    fn test_strength_reduction_at_o2_only() {
        let code = "    v1 = v0 * 8;\n    v2 = v0 / 4;\n";
        let o1 = optimize(code, OptLevel::O1);
        assert!(o1.contains("v0 * 8"));
        let o2 = optimize(code, OptLevel::O2);
        assert!(o2.contains("v1 = v0 << 3;"));
        assert!(o2.contains("v2 = v0 >> 2;"));
    }

    #[test]
    fn test_word_boundaries_protect_similar_names() {
        // v1 is unused, v10 is not; eliding v1 must not touch v10.
        let code = "int32_t v1;\nint32_t v10;\nv10 = 5;\nreturn v10;\n";
        let out = optimize(code, OptLevel::O1);
        assert!(!out.contains("int32_t v1;\n"));
        assert!(out.contains("v10 = 5;"));
    }

    #[test]
    fn test_idempotence() {
        let code = "int32_t v0;\n    v1 = v2 + 0;\n    v3 = v2 * 8;\n// note\nreturn v1;\n";
        for level in [OptLevel::O0, OptLevel::O1, OptLevel::O2] {
            let once = optimize(code, level);
            let twice = optimize(&once, level);
            assert_eq!(once, twice, "level {:?} is not idempotent", level);
        }
    }

    #[test]
    fn test_os_minimizes_names_and_strips_comments() {
        let code = "int32_t v07;\nv07 = 1; // set it\nreturn v07;\n";
        let out = optimize(code, OptLevel::Os);
        assert!(!out.contains("v07"));
        assert!(out.contains("a = 1;"));
        assert!(!out.contains("// set it"));
    }

    #[test]
    fn test_os_preserves_string_contents() {
        let code = "printf(\"https://x// not a comment\");\n";
        let out = optimize(code, OptLevel::Os);
        assert!(out.contains("https://x// not a comment"));
    }
}
