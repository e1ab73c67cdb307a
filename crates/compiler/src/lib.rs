//! OmniLang Compiler Library
//!
//! Ahead-of-time compilation from .omni source to portable C that links
//! against the prebuilt `omni_rt` runtime library.
//!
//! The pipeline: source text is lexed into tokens, parsed into an AST,
//! lowered into an SSA mid-level IR, translated to C, and finally run
//! through a text-level optimizer. Each stage owns its output and hands
//! it to the next by value.
//!
//! ```rust,ignore
//! use omnic::{compile_source, CompilerConfig, OptLevel};
//!
//! let config = CompilerConfig::new().with_opt_level(OptLevel::O2);
//! let c_text = compile_source("demo.omni", source, &config)?;
//! ```

pub mod ast;
pub mod codegen;
pub mod config;
pub mod diag;
pub mod lexer;
pub mod lower;
pub mod mir;
pub mod optimizer;
pub mod parser;
pub mod printer;
pub mod resolver;
pub mod token;

pub use codegen::{Codegen, CodegenError};
pub use config::{CompilerConfig, OptLevel};
pub use diag::{Diagnostic, Position, Severity, Span};
pub use lexer::Lexer;
pub use parser::Parser;
pub use printer::print_module;
pub use resolver::Resolver;
pub use token::{dump_tokens, Token, TokenKind};

use std::fs;
use std::path::Path;

/// Compile source text to optimized C.
///
/// On any error, returns the diagnostics rendered in the canonical text
/// format, one per line group. The library itself never prints; the CLI
/// owns stderr.
pub fn compile_source(
    file: &str,
    source: &str,
    config: &CompilerConfig,
) -> Result<String, String> {
    let module = Parser::new(file, source)
        .parse()
        .map_err(|diag| diag.to_string())?;

    // Pull in imported modules, their declarations ahead of ours.
    let module = if module.imports.is_empty() {
        module
    } else {
        let mut roots = config.search_paths.clone();
        let mut resolver = if roots.is_empty() {
            Resolver::new()
        } else {
            if let Some(dir) = Path::new(file).parent() {
                roots.push(dir.to_path_buf());
            }
            Resolver::with_roots(roots)
        };
        let imported = resolver.expand(Path::new(file), &module)?;
        let mut merged = module;
        let mut decls = Vec::new();
        for import in imported {
            decls.extend(import.decls);
        }
        decls.extend(std::mem::take(&mut merged.decls));
        merged.decls = decls;
        merged
    };

    let mir = lower::lower_module(&module)?;
    let c_text = Codegen::new()
        .generate(&mir)
        .map_err(|e| e.to_string())?;
    Ok(optimizer::optimize(&c_text, config.opt_level))
}

/// Compile a .omni file to a .c file on disk.
pub fn compile_file(input: &Path, output: &Path, config: &CompilerConfig) -> Result<(), String> {
    let source = fs::read_to_string(input)
        .map_err(|e| format!("failed to read {}: {}", input.display(), e))?;
    let config = config
        .clone()
        .load_project_defaults(input.parent().unwrap_or(Path::new(".")))?;
    let c_text = compile_source(&input.display().to_string(), &source, &config)?;
    fs::write(output, c_text)
        .map_err(|e| format!("failed to write {}: {}", output.display(), e))?;
    Ok(())
}

/// Canonical token dump of a source file (the `.tok` golden format).
/// On a lex error the partial dump is discarded and the rendered
/// diagnostic is returned.
pub fn tokens_dump(file: &str, source: &str) -> Result<String, String> {
    let (tokens, error) = Lexer::new(file, source).lex_all();
    match error {
        Some(diag) => Err(diag.to_string()),
        None => Ok(dump_tokens(&tokens)),
    }
}

/// Printer rendering of a source file (the `.ast` golden format).
pub fn ast_dump(file: &str, source: &str) -> Result<String, String> {
    let module = Parser::new(file, source)
        .parse()
        .map_err(|diag| diag.to_string())?;
    Ok(print_module(&module))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(source: &str) -> String {
        compile_source("test.omni", source, &CompilerConfig::new())
            .unwrap_or_else(|e| panic!("compilation failed:\n{}", e))
    }

    #[test]
    fn test_hex_constant_and_arithmetic_end_to_end() {
        let c = compile("func main(): int { return 0xFF + 1 }");
        assert!(c.contains("= 255;"), "{}", c);
        assert!(c.contains("+ 1;"), "{}", c);
        assert!(c.contains("OmniLang program result: %d"), "{}", c);
    }

    #[test]
    fn test_string_concat_and_cleanup_end_to_end() {
        let c = compile("func main(): int { let s = \"a\" + \"b\"\n return 0 }");
        assert!(c.contains("omni_strcat(\"a\", \"b\");"), "{}", c);
        assert!(c.contains("free((void*)v0); v0 = NULL;"), "{}", c);
    }

    #[test]
    fn test_array_len_end_to_end() {
        let c = compile("func main(): int { let a = [10, 20, 30]\n return len(a) }");
        assert!(c.contains("int32_t v0[] = {10, 20, 30};"), "{}", c);
        assert!(c.contains("omni_len((void*)v0, sizeof(int32_t), 3);"), "{}", c);
    }

    #[test]
    fn test_async_await_end_to_end() {
        let c = compile(
            "async func g(): int { return 7 }\nfunc main(): int { return await g() }",
        );
        assert!(c.contains("omni_promise_t* g(void)"), "{}", c);
        assert!(c.contains("return omni_promise_create_int(7);"), "{}", c);
        assert!(c.contains("omni_await_int("), "{}", c);
        assert!(c.contains("g()"), "{}", c);
    }

    #[test]
    fn test_struct_range_for_end_to_end() {
        let source = "struct Point { x: int }\n\
                      func main(): int {\n\
                        let points = [Point{ x: 1 }, Point{ x: 2 }]\n\
                        for p in points { print(p.x) }\n\
                        return 0\n\
                      }";
        let c = compile(source);
        assert!(c.contains("omni_struct_t*"), "{}", c);
        assert!(c.contains("omni_struct_get_int_field("), "{}", c);
        assert!(c.contains("\"x\""), "{}", c);
    }

    #[test]
    fn test_parse_error_points_at_else() {
        let err = compile_source(
            "test.omni",
            "func f() { return 1 } else {}",
            &CompilerConfig::new(),
        )
        .unwrap_err();
        assert!(err.contains("unexpected"), "{}", err);
        assert!(err.contains("ELSE"), "{}", err);
        assert!(err.contains('^'), "{}", err);
    }

    #[test]
    fn test_optimizer_level_applies() {
        let config = CompilerConfig::new().with_opt_level(OptLevel::O2);
        let c = compile_source(
            "test.omni",
            "func f(x: int): int { return x * 8 }\nfunc main(): int { return f(1) }",
            &config,
        )
        .unwrap();
        assert!(c.contains("x << 3"), "{}", c);
    }

    #[test]
    fn test_tokens_dump_format() {
        let dump = tokens_dump("t.omni", "let x = 42").unwrap();
        assert_eq!(
            dump,
            "1:1\tLET\t\"let\"\n1:5\tIDENT\t\"x\"\n1:7\tASSIGN\t\"=\"\n1:9\tINT\t\"42\"\n1:11\tEOF\t\"\"\n"
        );
    }

    #[test]
    fn test_ast_dump_round_trip_stability() {
        let source = "func main(): int { return 0 }";
        assert_eq!(ast_dump("t", source).unwrap(), ast_dump("t", source).unwrap());
    }
}
