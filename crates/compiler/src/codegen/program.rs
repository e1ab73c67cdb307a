//! Program and function emission.
//!
//! Output order: includes, function prototypes, function definitions in
//! module order, then the `main` trampoline. Within a function: hoisted
//! declarations first, then each block in order (non-entry blocks get C
//! labels), then per-return cleanup.

use super::runtime::{intrinsic, is_intrinsic, RetKind};
use super::state::mangle_label;
use super::types::{array_element, is_struct_type, promise_payload};
use super::{Codegen, CodegenError};
use crate::mir::{Inst, MirFunction, MirModule, ValueId, TYPE_INFER};
use std::fmt::Write as _;

impl Codegen {
    /// Generate the complete C translation unit for a module.
    ///
    /// Recoverable problems accumulate and come back as one aggregate
    /// error after the full module has been processed; hard errors
    /// return immediately.
    pub fn generate(&mut self, module: &MirModule) -> Result<String, CodegenError> {
        let (text, diagnostics) = self.generate_with_diagnostics(module)?;
        if diagnostics.is_empty() {
            Ok(text)
        } else {
            Err(CodegenError::Aggregate(diagnostics))
        }
    }

    /// Like [`Codegen::generate`], but hands back the emitted C together
    /// with the recoverable diagnostics, so unsafe-but-executable output
    /// (unknown array lengths, defaulted field types) stays usable for
    /// downstream pipeline testing.
    pub fn generate_with_diagnostics(
        &mut self,
        module: &MirModule,
    ) -> Result<(String, Vec<String>), CodegenError> {
        self.out.clear();
        self.errors.clear();

        let mut text = String::new();
        writeln!(text, "#include \"omni_rt.h\"")?;
        writeln!(text, "#include <stdio.h>")?;
        writeln!(text, "#include <stdlib.h>")?;
        writeln!(text, "#include <string.h>")?;
        writeln!(text)?;

        // Prototypes for everything we will define.
        let mut protos = String::new();
        for func in &module.functions {
            if is_intrinsic(&func.name) {
                continue;
            }
            writeln!(protos, "{};", self.signature(func))?;
        }
        if !protos.is_empty() {
            text.push_str(&protos);
            text.push('\n');
        }

        for func in &module.functions {
            if is_intrinsic(&func.name) {
                continue;
            }
            self.emit_function(func)?;
        }
        text.push_str(&self.out);

        if let Some(main) = module.functions.iter().find(|f| f.name == "main") {
            self.emit_trampoline(&mut text, main)?;
        }

        Ok((text, std::mem::take(&mut self.errors)))
    }

    /// C return type for a function: `main` is forced to `int32_t`
    /// (string/float mains keep their mapped type so the trampoline can
    /// report them), and `Promise<T>` returns become `omni_promise_t*`.
    fn return_c_type(&mut self, func: &MirFunction) -> String {
        if promise_payload(&func.return_type).is_some() {
            return "omni_promise_t*".to_string();
        }
        if func.name == "main" {
            return match func.return_type.as_str() {
                "string" => "const char*".to_string(),
                "float" | "double" => "double".to_string(),
                _ => "int32_t".to_string(),
            };
        }
        self.map_type(&func.return_type)
    }

    fn signature(&mut self, func: &MirFunction) -> String {
        let ret = self.return_c_type(func);
        let name = if func.name == "main" {
            "omni_main"
        } else {
            func.name.as_str()
        };
        let params: Vec<String> = func
            .params
            .iter()
            .map(|p| self.declaration(&p.ty, &p.name))
            .collect();
        let params = if params.is_empty() {
            "void".to_string()
        } else {
            params.join(", ")
        };
        format!("{} {}({})", ret, name, params)
    }

    fn emit_function(&mut self, func: &MirFunction) -> Result<(), CodegenError> {
        let signature = self.signature(func);

        self.reset_function_state();
        self.current_return = func.return_type.clone();
        self.in_main = func.name == "main";

        for param in &func.params {
            self.names.insert(param.id, param.name.clone());
            self.value_types.insert(param.id, param.ty.clone());
        }

        // Pre-scan: name every value, resolve its type, collect the φ
        // set, array lengths, map types, and cleanup obligations, and
        // hoist declarations so forward references across jumps work.
        for block in &func.blocks {
            for inst in &block.insts {
                self.prescan_inst(inst)?;
            }
        }

        for block in &func.blocks {
            for inst in &block.insts {
                self.hoist_declaration(inst)?;
            }
        }

        for (index, block) in func.blocks.iter().enumerate() {
            if index > 0 {
                writeln!(self.body, "{}:;", mangle_label(&block.name))?;
            }
            for inst in &block.insts {
                self.emit_inst(inst)?;
            }
            self.emit_terminator(&block.terminator)?;
        }

        writeln!(self.out, "{} {{", signature)?;
        self.out.push_str(&self.decls);
        if !self.decls.is_empty() {
            self.out.push('\n');
        }
        self.out.push_str(&self.body);
        writeln!(self.out, "}}")?;
        writeln!(self.out)?;
        Ok(())
    }

    fn prescan_inst(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        if inst.id.is_valid() {
            self.names.insert(inst.id, inst.id.to_string());
        }

        let ty = self.resolve_value_type(inst);
        if inst.id.is_valid() {
            self.value_types.insert(inst.id, ty.clone());
        }

        match inst.op.as_str() {
            "phi" => {
                self.phi_ids.insert(inst.id);
            }
            "const" => {
                // An all-zero int constant is potentially loop-mutable.
                if ty == "int" && inst.operands.first().and_then(|o| o.as_literal()) == Some("0") {
                    self.phi_ids.insert(inst.id);
                }
                if ty == "string" {
                    self.string_consts.insert(inst.id);
                }
            }
            "array.init" => {
                self.array_lens.insert(inst.id, inst.operands.len());
            }
            "map.init" => {
                self.map_types.insert(inst.id, ty.clone());
            }
            _ => {}
        }

        // Cleanup obligations: only the producing ops own heap strings.
        let produces_string = matches!(
            inst.op.as_str(),
            "strcat" | "await" | "call" | "call.string" | "file.read"
        );
        if inst.id.is_valid() && produces_string && ty == "string" {
            self.string_cleanup.insert(inst.id);
        }
        if inst.id.is_valid()
            && matches!(inst.op.as_str(), "call" | "call.void")
            && promise_payload(&ty).is_some()
        {
            self.promise_cleanup.insert(inst.id);
        }
        Ok(())
    }

    /// Resolve the source-language type a value will have in C, applying
    /// the backend's defaulting rules.
    fn resolve_value_type(&mut self, inst: &Inst) -> String {
        let declared = inst.ty.trim();
        let declared = if declared.is_empty() || declared == TYPE_INFER {
            None
        } else {
            Some(declared.to_string())
        };

        match inst.op.as_str() {
            "const" => declared
                .filter(|t| t != "hex" && t != "binary")
                .unwrap_or_else(|| {
                    let lit = inst
                        .operands
                        .first()
                        .and_then(|o| o.as_literal())
                        .unwrap_or("0");
                    constant_shape(lit).to_string()
                }),
            "call" | "call.string" => {
                if let Some(target) = inst.operands.first().and_then(|o| o.as_literal()) {
                    // read_line and friends produce heap strings.
                    if let Some(entry) = intrinsic(target) {
                        return ret_kind_type(entry.ret, declared);
                    }
                    // `foo_async` wraps its synchronous counterpart.
                    if let Some(base) = target.strip_suffix("_async") {
                        if let Some(entry) = intrinsic(base) {
                            if let Some(kind) = ret_kind_primitive(entry.ret) {
                                return format!("Promise<{}>", kind);
                            }
                        }
                    }
                }
                declared.unwrap_or_else(|| "int".to_string())
            }
            "await" => declared.unwrap_or_else(|| {
                // An un-annotated await is an I/O promise.
                "string".to_string()
            }),
            "index" | "phi" => declared.or_else(|| self.operand_element_type(inst)).unwrap_or_else(|| "int".to_string()),
            "cmp.eq" | "cmp.neq" | "cmp.lt" | "cmp.lte" | "cmp.gt" | "cmp.gte" | "and" | "or"
            | "not" => "bool".to_string(),
            "strcat" => "string".to_string(),
            _ => declared.unwrap_or_else(|| "int".to_string()),
        }
    }

    fn operand_element_type(&self, inst: &Inst) -> Option<String> {
        let target = inst.operands.first()?.as_value()?;
        let target_ty = self.value_types.get(&target)?;
        array_element(target_ty)
    }

    /// Emit one hoisted declaration per non-parameter value, with the
    /// special cases that initialize at declaration instead.
    fn hoist_declaration(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        if !inst.id.is_valid() {
            return Ok(());
        }
        let name = self.name_of(inst.id);
        let ty = self
            .value_types
            .get(&inst.id)
            .cloned()
            .unwrap_or_else(|| "int".to_string());
        // Calls whose resolved type is void produce no value to hold.
        if ty == "void" {
            return Ok(());
        }

        match inst.op.as_str() {
            // String constants embed their initializer to avoid a
            // separate assignment.
            "const" if self.string_consts.contains(&inst.id) => {
                let lit = inst
                    .operands
                    .first()
                    .and_then(|o| o.as_literal())
                    .unwrap_or("\"\"");
                writeln!(self.decls, "    const char* {} = {};", name, lit)?;
            }
            "array.init" => {
                let elem = array_element(&ty).unwrap_or_else(|| "int".to_string());
                if is_struct_type(&elem) {
                    // Struct arrays hoist the slot array; elements are
                    // assigned one by one at the init site.
                    writeln!(
                        self.decls,
                        "    omni_struct_t* {}[{}];",
                        name,
                        inst.operands.len().max(1)
                    )?;
                }
                // Primitive arrays are declared with their initializer
                // at the instruction site.
            }
            _ => {
                let decl = if promise_payload(&ty).is_some() {
                    format!("omni_promise_t* {}", name)
                } else {
                    self.declaration(&ty, &name)
                };
                writeln!(self.decls, "    {};", decl)?;
            }
        }
        Ok(())
    }

    /// Free everything still owed at a return point. Tracked strings go
    /// first in reverse ValueID order, then conversion temporaries in
    /// reverse creation order, then promises in ascending ValueID order.
    pub(super) fn emit_epilogue(&mut self, exclude: Option<ValueId>) -> Result<(), CodegenError> {
        let strings: Vec<ValueId> = self
            .string_cleanup
            .iter()
            .rev()
            .copied()
            .filter(|id| Some(*id) != exclude)
            .collect();
        for id in strings {
            let name = self.name_of(id);
            writeln!(
                self.body,
                "    if ({} != NULL) {{ free((void*){}); {} = NULL; }}",
                name, name, name
            )?;
        }
        let temps: Vec<String> = self.temp_strings.iter().rev().cloned().collect();
        for temp in temps {
            writeln!(
                self.body,
                "    if ({} != NULL) {{ free((void*){}); {} = NULL; }}",
                temp, temp, temp
            )?;
        }
        let promises: Vec<ValueId> = self
            .promise_cleanup
            .iter()
            .copied()
            .filter(|id| Some(*id) != exclude)
            .collect();
        for id in promises {
            let name = self.name_of(id);
            writeln!(self.body, "    omni_promise_free({});", name)?;
        }
        Ok(())
    }

    /// `int main(int argc, char** argv)`: init args, run `omni_main`,
    /// report the result in a form chosen by the source return type.
    fn emit_trampoline(&mut self, text: &mut String, main: &MirFunction) -> Result<(), CodegenError> {
        writeln!(text, "int main(int argc, char** argv) {{")?;
        writeln!(text, "    omni_args_init(argc, argv);")?;
        match main.return_type.as_str() {
            "void" => {
                writeln!(text, "    omni_main();")?;
                writeln!(text, "    printf(\"OmniLang program finished\\n\");")?;
                writeln!(text, "    return 0;")?;
            }
            "string" => {
                writeln!(text, "    const char* result = omni_main();")?;
                writeln!(text, "    printf(\"OmniLang program result: %s\\n\", result);")?;
                writeln!(text, "    return 0;")?;
            }
            "float" | "double" => {
                writeln!(text, "    double result = omni_main();")?;
                writeln!(text, "    printf(\"OmniLang program result: %f\\n\", result);")?;
                writeln!(text, "    return 0;")?;
            }
            _ => {
                writeln!(text, "    int32_t result = omni_main();")?;
                writeln!(text, "    printf(\"OmniLang program result: %d\\n\", result);")?;
                writeln!(text, "    return result;")?;
            }
        }
        writeln!(text, "}}")?;
        Ok(())
    }
}

/// Infer a constant's source type from its literal shape.
fn constant_shape(lit: &str) -> &'static str {
    if lit.starts_with('"') {
        "string"
    } else if lit == "true" || lit == "false" {
        "bool"
    } else if lit.contains('.') {
        "float"
    } else {
        "int"
    }
}

fn ret_kind_type(kind: RetKind, declared: Option<String>) -> String {
    match kind {
        RetKind::Void => "void".to_string(),
        RetKind::Int => "int".to_string(),
        RetKind::Float => "float".to_string(),
        RetKind::Bool => "bool".to_string(),
        RetKind::Str => "string".to_string(),
        RetKind::Ptr => declared.unwrap_or_else(|| "ptr".to_string()),
        RetKind::Struct => declared.filter(|t| is_struct_type(t)).unwrap_or_else(|| "omni_struct".to_string()),
        RetKind::Promise => declared.unwrap_or_else(|| "Promise<int>".to_string()),
    }
}

fn ret_kind_primitive(kind: RetKind) -> Option<&'static str> {
    match kind {
        RetKind::Int => Some("int"),
        RetKind::Float => Some("float"),
        RetKind::Bool => Some("bool"),
        RetKind::Str => Some("string"),
        _ => None,
    }
}
