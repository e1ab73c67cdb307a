//! Generator state and core types.
//!
//! The [`Codegen`] struct holds the module-level output buffers plus the
//! per-function tracking maps. Per-function state is reset at the start
//! of every function so nothing leaks between functions.

use crate::mir::ValueId;
use std::collections::{BTreeSet, HashMap, HashSet};

pub struct Codegen {
    /// Finished function definitions.
    pub(super) out: String,
    /// Body text of the function currently being emitted (statements
    /// only; hoisted declarations are assembled separately).
    pub(super) body: String,
    /// Hoisted declaration lines for the current function.
    pub(super) decls: String,

    // -------------------- per-function state --------------------
    /// ValueID -> C variable name (`v<id>`, or the parameter's name).
    pub(super) names: HashMap<ValueId, String>,
    /// Values that behave as loop-carried slots (φ).
    pub(super) phi_ids: HashSet<ValueId>,
    /// ValueID -> normalized map type string (`map<K, V>`).
    pub(super) map_types: HashMap<ValueId, String>,
    /// ValueID -> declared array length (bounds checks, `len()`).
    pub(super) array_lens: HashMap<ValueId, usize>,
    /// ValueID -> source-language type string.
    pub(super) value_types: HashMap<ValueId, String>,
    /// Heap strings owed a `free` in the epilogue, sorted for
    /// deterministic emission.
    pub(super) string_cleanup: BTreeSet<ValueId>,
    /// Promises owed an `omni_promise_free` in the epilogue.
    pub(super) promise_cleanup: BTreeSet<ValueId>,
    /// Temporaries from operand-to-string conversion, freed after the
    /// tracked strings in reverse creation order.
    pub(super) temp_strings: Vec<String>,
    /// String-const values initialized at their declaration.
    pub(super) string_consts: HashSet<ValueId>,
    /// Source return type of the function being emitted.
    pub(super) current_return: String,
    /// True while emitting `main` (renamed `omni_main`).
    pub(super) in_main: bool,
    pub(super) temp_counter: usize,

    /// Accumulated recoverable errors across the whole run.
    pub(super) errors: Vec<String>,
}

impl Default for Codegen {
    fn default() -> Self {
        Self::new()
    }
}

impl Codegen {
    pub fn new() -> Self {
        Codegen {
            out: String::new(),
            body: String::new(),
            decls: String::new(),
            names: HashMap::new(),
            phi_ids: HashSet::new(),
            map_types: HashMap::new(),
            array_lens: HashMap::new(),
            value_types: HashMap::new(),
            string_cleanup: BTreeSet::new(),
            promise_cleanup: BTreeSet::new(),
            temp_strings: Vec::new(),
            string_consts: HashSet::new(),
            current_return: String::new(),
            in_main: false,
            temp_counter: 0,
            errors: Vec::new(),
        }
    }

    /// Reset everything scoped to a single function.
    pub(super) fn reset_function_state(&mut self) {
        self.body.clear();
        self.decls.clear();
        self.names.clear();
        self.phi_ids.clear();
        self.map_types.clear();
        self.array_lens.clear();
        self.value_types.clear();
        self.string_cleanup.clear();
        self.promise_cleanup.clear();
        self.temp_strings.clear();
        self.string_consts.clear();
        self.current_return.clear();
        self.in_main = false;
        self.temp_counter = 0;
    }

    /// Record a recoverable problem and keep going.
    pub(super) fn warn(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    pub(super) fn fresh_temp(&mut self) -> String {
        let name = format!("tmp{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    /// C variable name for a value.
    pub(super) fn name_of(&self, id: ValueId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }
}

/// Turn a MIR block name into a valid C label (`loop.cond0` ->
/// `loop_cond0`).
pub(super) fn mangle_label(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mangle_label() {
        assert_eq!(mangle_label("entry"), "entry");
        assert_eq!(mangle_label("loop.cond0"), "loop_cond0");
        assert_eq!(mangle_label("then-1"), "then_1");
    }

    #[test]
    fn test_reset_clears_per_function_state() {
        let mut cg = Codegen::new();
        cg.names.insert(ValueId(1), "v1".to_string());
        cg.string_cleanup.insert(ValueId(1));
        cg.temp_counter = 5;
        cg.warn("kept across functions");
        cg.reset_function_state();
        assert!(cg.names.is_empty());
        assert!(cg.string_cleanup.is_empty());
        assert_eq!(cg.temp_counter, 0);
        assert_eq!(cg.errors.len(), 1);
    }
}
