//! Module search-path resolution.
//!
//! Imports resolve against an ordered list of roots: the directory named
//! by `OMNI_STD_PATH` (when set), the compiler executable's directory
//! and its parent, then the current working directory. `import std.io`
//! maps to `std/io/print.omni`, any other `std.X` to `std/X/X.omni`,
//! and a local `import a.b` to `a/b.omni` under any root.

use crate::ast::Module;
use crate::parser::Parser;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

pub struct Resolver {
    roots: Vec<PathBuf>,
    /// Canonical paths already loaded, for cycle detection.
    visited: HashSet<PathBuf>,
}

impl Resolver {
    /// Build a resolver with the standard root order.
    pub fn new() -> Self {
        let mut roots = Vec::new();
        if let Ok(std_path) = std::env::var("OMNI_STD_PATH") {
            if !std_path.is_empty() {
                roots.push(PathBuf::from(std_path));
            }
        }
        if let Ok(exe) = std::env::current_exe() {
            if let Some(dir) = exe.parent() {
                roots.push(dir.to_path_buf());
                if let Some(parent) = dir.parent() {
                    roots.push(parent.to_path_buf());
                }
            }
        }
        if let Ok(cwd) = std::env::current_dir() {
            roots.push(cwd);
        }
        Resolver {
            roots,
            visited: HashSet::new(),
        }
    }

    /// Build a resolver over explicit roots (project configuration,
    /// tests).
    pub fn with_roots(roots: Vec<PathBuf>) -> Self {
        Resolver {
            roots,
            visited: HashSet::new(),
        }
    }

    /// Map a dotted import path to its relative file path.
    pub fn relative_path(import_path: &str) -> PathBuf {
        let segments: Vec<&str> = import_path.split('.').collect();
        match segments.as_slice() {
            ["std", "io"] => PathBuf::from("std/io/print.omni"),
            ["std", name, ..] => PathBuf::from(format!("std/{}/{}.omni", name, name)),
            _ => {
                let mut path = PathBuf::new();
                for segment in &segments {
                    path.push(segment);
                }
                path.set_extension("omni");
                path
            }
        }
    }

    /// Resolve a dotted import to the first existing file under the
    /// roots, or an error naming every root tried.
    pub fn resolve(&self, import_path: &str) -> Result<PathBuf, String> {
        let relative = Self::relative_path(import_path);
        for root in &self.roots {
            let candidate = root.join(&relative);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        let tried: Vec<String> = self
            .roots
            .iter()
            .map(|r| r.join(&relative).display().to_string())
            .collect();
        Err(format!(
            "cannot resolve import '{}'; tried: {}",
            import_path,
            tried.join(", ")
        ))
    }

    /// Load the modules a file imports, depth-first, imported modules
    /// first. Cycles are detected through the visited set.
    pub fn expand(&mut self, source_path: &Path, module: &Module) -> Result<Vec<Module>, String> {
        if let Ok(canonical) = source_path.canonicalize() {
            self.visited.insert(canonical);
        }
        let mut loaded = Vec::new();
        for import in &module.imports {
            let path = self.resolve(&import.dotted())?;
            let canonical = path
                .canonicalize()
                .map_err(|e| format!("cannot canonicalize {}: {}", path.display(), e))?;
            if self.visited.contains(&canonical) {
                // Already loaded somewhere up the chain; importing twice
                // is fine, importing cyclically resolves to a no-op.
                continue;
            }
            self.visited.insert(canonical);
            let text = fs::read_to_string(&path)
                .map_err(|e| format!("cannot read {}: {}", path.display(), e))?;
            let imported = Parser::new(path.display().to_string(), &text)
                .parse()
                .map_err(|d| d.to_string())?;
            let nested = self.expand(&path, &imported)?;
            loaded.extend(nested);
            loaded.push(imported);
        }
        Ok(loaded)
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_std_io_maps_to_print() {
        assert_eq!(
            Resolver::relative_path("std.io"),
            PathBuf::from("std/io/print.omni")
        );
    }

    #[test]
    fn test_std_module_maps_to_own_file() {
        assert_eq!(
            Resolver::relative_path("std.net"),
            PathBuf::from("std/net/net.omni")
        );
    }

    #[test]
    fn test_local_import_maps_to_omni_file() {
        assert_eq!(Resolver::relative_path("utils"), PathBuf::from("utils.omni"));
        assert_eq!(
            Resolver::relative_path("pkg.helpers"),
            PathBuf::from("pkg/helpers.omni")
        );
    }

    #[test]
    fn test_unresolvable_import_names_roots() {
        let resolver = Resolver::with_roots(vec![PathBuf::from("/nonexistent-root")]);
        let err = resolver.resolve("missing").unwrap_err();
        assert!(err.contains("missing"));
        assert!(err.contains("/nonexistent-root"));
    }
}
