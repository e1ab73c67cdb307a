//! Instruction dispatch.
//!
//! One arm per MIR operation. Recoverable issues record a warning and
//! keep emitting so a single run can report as many problems as
//! possible; unsupported operations (and every closure op) are hard
//! errors that stop generation immediately.

use super::types::{array_element, is_struct_type, kind_suffix, map_key_value};
use super::{Codegen, CodegenError};
use crate::mir::{Inst, Operand, ValueId};
use std::fmt::Write as _;

impl Codegen {
    pub(super) fn emit_inst(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        match inst.op.as_str() {
            "const" => self.emit_const(inst),
            "add" | "sub" | "mul" | "div" | "mod" => self.emit_arith(inst),
            "bitand" | "bitor" | "bitxor" | "lshift" | "rshift" => self.emit_bitwise(inst),
            "bitnot" => self.emit_simple(inst, |x| format!("~{}", x)),
            "neg" => self.emit_simple(inst, |x| format!("-{}", x)),
            "not" => self.emit_simple(inst, |x| format!("!{}", x)),
            "cast" => self.emit_cast(inst),
            "and" => self.emit_logic(inst, "&&"),
            "or" => self.emit_logic(inst, "||"),
            "strcat" => self.emit_strcat(inst),
            "cmp.eq" | "cmp.neq" | "cmp.lt" | "cmp.lte" | "cmp.gt" | "cmp.gte" => {
                self.emit_cmp(inst)
            }
            "throw" => self.emit_throw(inst),
            "call" | "call.void" | "call.int" | "call.string" | "call.bool" => {
                self.emit_call(inst)
            }
            "index" => self.emit_index(inst),
            "array.init" => self.emit_array_init(inst),
            "array.set" => self.emit_array_set(inst),
            "map.init" => self.emit_map_init(inst),
            "map.set" => self.emit_map_set(inst),
            "struct.init" => self.emit_struct_init(inst),
            "member" => self.emit_member(inst),
            "member.set" => self.emit_member_set(inst),
            "assign" => self.emit_assign(inst),
            "phi" => self.emit_phi(inst),
            "await" => self.emit_await(inst),
            "malloc" => self.emit_malloc(inst),
            "free" => self.emit_free(inst),
            "realloc" => self.emit_realloc(inst),
            op if op.starts_with("file.") => self.emit_file(inst),
            op if op.starts_with("test.") => self.emit_test(inst),
            "assert" | "assert.eq" | "assert.true" | "assert.false" => self.emit_assert(inst),
            op if op.starts_with("std.log.") => self.emit_log(inst),
            "func.ref" => self.emit_func_ref(inst),
            "func.assign" => self.emit_func_assign(inst),
            "func.call" => self.emit_func_call(inst),
            op if op.starts_with("closure.") => Err(CodegenError::Hard(format!(
                "closures are not supported in the C backend (op '{}')",
                op
            ))),
            op => Err(CodegenError::Hard(format!(
                "unsupported MIR op '{}' (value {})",
                op, inst.id
            ))),
        }
    }

    // ------------------------------------------------------------------
    // Operand rendering
    // ------------------------------------------------------------------

    /// C expression text for an operand.
    pub(super) fn operand_text(&self, operand: &Operand) -> String {
        match operand.as_value() {
            Some(id) => self.name_of(id),
            None => {
                let lit = operand.as_literal().unwrap_or("0");
                match lit {
                    "true" => "1".to_string(),
                    "false" => "0".to_string(),
                    other => other.to_string(),
                }
            }
        }
    }

    /// Source type of an operand: its annotation, the producing value's
    /// type, or the literal's shape.
    pub(super) fn operand_type(&self, operand: &Operand) -> Option<String> {
        if let Some(ty) = &operand.ty {
            return Some(ty.clone());
        }
        if let Some(id) = operand.as_value() {
            return self.value_types.get(&id).cloned();
        }
        operand.as_literal().map(|lit| {
            if lit.starts_with('"') {
                "string".to_string()
            } else if lit == "true" || lit == "false" {
                "bool".to_string()
            } else if lit.contains('.') {
                "float".to_string()
            } else {
                "int".to_string()
            }
        })
    }

    pub(super) fn is_string_operand(&self, operand: &Operand) -> bool {
        self.operand_type(operand).as_deref() == Some("string")
            || operand.as_literal().is_some_and(|l| l.starts_with('"'))
    }

    fn assign_to(&self, id: ValueId) -> String {
        format!("    {} = ", self.name_of(id))
    }

    // ------------------------------------------------------------------
    // Simple value producers
    // ------------------------------------------------------------------

    fn emit_const(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        // String constants were initialized at their declaration.
        if self.string_consts.contains(&inst.id) {
            return Ok(());
        }
        let text = match inst.operands.first() {
            Some(operand) => {
                let lit = operand.as_literal().unwrap_or_default();
                radix_to_decimal(lit).unwrap_or_else(|| self.operand_text(operand))
            }
            None => "0".to_string(),
        };
        writeln!(self.body, "{}{};", self.assign_to(inst.id), text)?;
        Ok(())
    }

    fn emit_arith(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let op = match inst.op.as_str() {
            "add" => "+",
            "sub" => "-",
            "mul" => "*",
            "div" => "/",
            _ => "%",
        };
        let rhs = self.operand_text(&inst.operands[1]);

        // Loop induction: update a φ slot in place instead of producing
        // a fresh value, and alias the result to the slot.
        if let Some(left) = inst.operands[0].as_value() {
            if self.phi_ids.contains(&left) {
                let name = self.name_of(left);
                writeln!(self.body, "    {} = {} {} {};", name, name, op, rhs)?;
                if inst.id.is_valid() {
                    self.names.insert(inst.id, name);
                    self.phi_ids.insert(inst.id);
                }
                return Ok(());
            }
        }

        let lhs = self.operand_text(&inst.operands[0]);
        writeln!(self.body, "{}{} {} {};", self.assign_to(inst.id), lhs, op, rhs)?;
        Ok(())
    }

    fn emit_bitwise(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let op = match inst.op.as_str() {
            "bitand" => "&",
            "bitor" => "|",
            "bitxor" => "^",
            "lshift" => "<<",
            _ => ">>",
        };
        let lhs = self.operand_text(&inst.operands[0]);
        let rhs = self.operand_text(&inst.operands[1]);
        writeln!(self.body, "{}{} {} {};", self.assign_to(inst.id), lhs, op, rhs)?;
        Ok(())
    }

    fn emit_simple(
        &mut self,
        inst: &Inst,
        render: impl Fn(String) -> String,
    ) -> Result<(), CodegenError> {
        let x = self.operand_text(&inst.operands[0]);
        writeln!(self.body, "{}{};", self.assign_to(inst.id), render(x))?;
        Ok(())
    }

    fn emit_cast(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = self.map_type(&inst.ty);
        let x = self.operand_text(&inst.operands[0]);
        writeln!(
            self.body,
            "{}({}){};",
            self.assign_to(inst.id),
            target,
            x
        )?;
        Ok(())
    }

    fn emit_logic(&mut self, inst: &Inst, op: &str) -> Result<(), CodegenError> {
        let lhs = self.operand_text(&inst.operands[0]);
        let rhs = self.operand_text(&inst.operands[1]);
        writeln!(self.body, "{}{} {} {};", self.assign_to(inst.id), lhs, op, rhs)?;
        Ok(())
    }

    fn emit_strcat(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let a = self.operand_text(&inst.operands[0]);
        let b = self.operand_text(&inst.operands[1]);
        writeln!(
            self.body,
            "{}omni_strcat({}, {});",
            self.assign_to(inst.id),
            a,
            b
        )?;
        Ok(())
    }

    /// String comparisons go through the runtime with the usual
    /// `<0 / ==0 / >0` convention; everything else is a C operator
    /// yielding 0/1.
    fn emit_cmp(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let a = self.operand_text(&inst.operands[0]);
        let b = self.operand_text(&inst.operands[1]);
        let any_string =
            self.is_string_operand(&inst.operands[0]) || self.is_string_operand(&inst.operands[1]);
        let expr = if any_string {
            match inst.op.as_str() {
                "cmp.eq" => format!("omni_string_equals({}, {})", a, b),
                "cmp.neq" => format!("!omni_string_equals({}, {})", a, b),
                "cmp.lt" => format!("omni_string_compare({}, {}) < 0", a, b),
                "cmp.lte" => format!("omni_string_compare({}, {}) <= 0", a, b),
                "cmp.gt" => format!("omni_string_compare({}, {}) > 0", a, b),
                _ => format!("omni_string_compare({}, {}) >= 0", a, b),
            }
        } else {
            let op = match inst.op.as_str() {
                "cmp.eq" => "==",
                "cmp.neq" => "!=",
                "cmp.lt" => "<",
                "cmp.lte" => "<=",
                "cmp.gt" => ">",
                _ => ">=",
            };
            format!("{} {} {}", a, op, b)
        };
        writeln!(self.body, "{}{};", self.assign_to(inst.id), expr)?;
        Ok(())
    }

    /// Current limitation: thrown exceptions print and execution
    /// continues.
    fn emit_throw(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let value = self.operand_text(&inst.operands[0]);
        if self.is_string_operand(&inst.operands[0]) {
            writeln!(self.body, "    printf(\"Exception: %s\\n\", {});", value)?;
        } else {
            writeln!(self.body, "    printf(\"Exception: %d\\n\", {});", value)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Indexing and collections
    // ------------------------------------------------------------------

    fn emit_index(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = &inst.operands[0];
        let idx = self.operand_text(&inst.operands[1]);
        let target_text = self.operand_text(target);
        let target_ty = self.operand_type(target).unwrap_or_default();

        if let Some((k, v)) = self.map_dispatch(target, &target_ty) {
            writeln!(
                self.body,
                "{}omni_map_get_{}_{}({}, {});",
                self.assign_to(inst.id),
                k,
                v,
                target_text,
                idx
            )?;
            return Ok(());
        }

        let elem = array_element(&target_ty).unwrap_or_else(|| "int".to_string());
        let len = target.as_value().and_then(|id| self.array_lens.get(&id)).copied();
        match (len, is_struct_type(&elem)) {
            (_, true) => {
                writeln!(
                    self.body,
                    "{}{}[{}];",
                    self.assign_to(inst.id),
                    target_text,
                    idx
                )?;
            }
            (Some(len), false) => {
                writeln!(
                    self.body,
                    "{}omni_array_get_int({}, {}, {});",
                    self.assign_to(inst.id),
                    target_text,
                    idx,
                    len
                )?;
            }
            (None, false) => {
                self.warn(format!(
                    "array length not known for {}; emitting unchecked index",
                    target_text
                ));
                writeln!(self.body, "    /* warning: array length not known */")?;
                writeln!(
                    self.body,
                    "{}{}[{}];",
                    self.assign_to(inst.id),
                    target_text,
                    idx
                )?;
            }
        }
        Ok(())
    }

    fn emit_array_init(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let name = self.name_of(inst.id);
        let ty = self
            .value_types
            .get(&inst.id)
            .cloned()
            .unwrap_or_default();
        let elem = array_element(&ty).unwrap_or_else(|| "int".to_string());

        if is_struct_type(&elem) {
            // Slot array was hoisted; fill element by element.
            for (i, operand) in inst.operands.iter().enumerate() {
                let value = self.operand_text(operand);
                writeln!(self.body, "    {}[{}] = {};", name, i, value)?;
            }
            return Ok(());
        }

        let elem_c = self.map_type(&elem);
        let values: Vec<String> = inst.operands.iter().map(|o| self.operand_text(o)).collect();
        // Stack-allocated; the backend has no heap arrays.
        writeln!(
            self.body,
            "    {} {}[] = {{{}}}; /* stack-allocated array */",
            elem_c,
            name,
            values.join(", ")
        )?;
        Ok(())
    }

    fn emit_array_set(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = &inst.operands[0];
        let target_text = self.operand_text(target);
        let idx = self.operand_text(&inst.operands[1]);
        let value = self.operand_text(&inst.operands[2]);
        let len = target.as_value().and_then(|id| self.array_lens.get(&id)).copied();
        match len {
            Some(len) => {
                writeln!(
                    self.body,
                    "    omni_array_set_int({}, {}, {}, {});",
                    target_text, idx, value, len
                )?;
            }
            None => {
                self.warn(format!(
                    "array length not known for {}; emitting unchecked store",
                    target_text
                ));
                writeln!(self.body, "    {}[{}] = {};", target_text, idx, value)?;
            }
        }
        Ok(())
    }

    /// Key/value kind suffixes for a map operation, or None when the
    /// target is not a map. Unsupported combinations warn and fall back
    /// to `string`/`int`.
    fn map_dispatch(&mut self, target: &Operand, target_ty: &str) -> Option<(String, String)> {
        let ty = target
            .as_value()
            .and_then(|id| self.map_types.get(&id).cloned())
            .or_else(|| {
                if target_ty.starts_with("map<") {
                    Some(target_ty.to_string())
                } else {
                    None
                }
            })?;
        let (k, v) = map_key_value(&ty).unwrap_or_default();
        // Keys are string/int only; values may be any primitive kind.
        match (kind_suffix(&k), kind_suffix(&v)) {
            (Some(k @ ("string" | "int")), Some(v)) => Some((k.to_string(), v.to_string())),
            _ => {
                self.warn(format!("unsupported map type combination '{}'", ty));
                Some(("string".to_string(), "int".to_string()))
            }
        }
    }

    fn emit_map_init(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let name = self.name_of(inst.id);
        writeln!(self.body, "    {} = omni_map_create();", name)?;
        let ty = self
            .map_types
            .get(&inst.id)
            .cloned()
            .unwrap_or_else(|| "map<string, int>".to_string());
        let (k, v) = map_key_value(&ty).unwrap_or_default();
        let (k, v) = match (kind_suffix(&k), kind_suffix(&v)) {
            (Some(k @ ("string" | "int")), Some(v)) => (k.to_string(), v.to_string()),
            _ => {
                self.warn(format!("unsupported map type combination '{}'", ty));
                ("string".to_string(), "int".to_string())
            }
        };
        for pair in inst.operands.chunks(2) {
            if pair.len() < 2 {
                break;
            }
            let key = self.operand_text(&pair[0]);
            let value = self.operand_text(&pair[1]);
            writeln!(
                self.body,
                "    omni_map_put_{}_{}({}, {}, {});",
                k, v, name, key, value
            )?;
        }
        Ok(())
    }

    fn emit_map_set(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = &inst.operands[0];
        let target_ty = self.operand_type(target).unwrap_or_default();
        let target_text = self.operand_text(target);
        let key = self.operand_text(&inst.operands[1]);
        let value = self.operand_text(&inst.operands[2]);
        let (k, v) = self
            .map_dispatch(target, &target_ty)
            .unwrap_or_else(|| ("string".to_string(), "int".to_string()));
        writeln!(
            self.body,
            "    omni_map_put_{}_{}({}, {}, {});",
            k, v, target_text, key, value
        )?;
        Ok(())
    }

    fn emit_struct_init(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let name = self.name_of(inst.id);
        writeln!(self.body, "    {} = omni_struct_create();", name)?;
        for pair in inst.operands.chunks(2) {
            if pair.len() < 2 {
                break;
            }
            let field = pair[0].as_literal().unwrap_or("field");
            let value_ty = self.operand_type(&pair[1]).unwrap_or_default();
            let kind = match kind_suffix(&value_ty) {
                Some(kind) => kind,
                None => {
                    self.warn(format!(
                        "could not infer type for field '{}'; defaulting to int",
                        field
                    ));
                    "int"
                }
            };
            let value = self.operand_text(&pair[1]);
            writeln!(
                self.body,
                "    omni_struct_set_{}_field({}, \"{}\", {});",
                kind, name, field, value
            )?;
        }
        Ok(())
    }

    fn emit_member(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = self.operand_text(&inst.operands[0]);
        let field = inst.operands[1].as_literal().unwrap_or("field");
        let result_ty = self
            .value_types
            .get(&inst.id)
            .cloned()
            .unwrap_or_default();
        let kind = match kind_suffix(&result_ty) {
            Some(kind) => kind,
            None => {
                self.warn(format!(
                    "could not infer type for field '{}'; defaulting to int",
                    field
                ));
                "int"
            }
        };
        writeln!(
            self.body,
            "{}omni_struct_get_{}_field({}, \"{}\");",
            self.assign_to(inst.id),
            kind,
            target,
            field
        )?;
        Ok(())
    }

    fn emit_member_set(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = self.operand_text(&inst.operands[0]);
        let field = inst.operands[1].as_literal().unwrap_or("field");
        let value_ty = self
            .operand_type(&inst.operands[2])
            .or_else(|| Some(inst.ty.clone()))
            .unwrap_or_default();
        let kind = match kind_suffix(&value_ty) {
            Some(kind) => kind,
            None => {
                self.warn(format!(
                    "could not infer type for field '{}'; defaulting to int",
                    field
                ));
                "int"
            }
        };
        let value = self.operand_text(&inst.operands[2]);
        writeln!(
            self.body,
            "    omni_struct_set_{}_field({}, \"{}\", {});",
            kind, target, field, value
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Assignment, phi, await, memory
    // ------------------------------------------------------------------

    fn emit_assign(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        if inst.operands.len() == 2 {
            // Store into an existing slot (loop-carried variable).
            let slot = self.operand_text(&inst.operands[0]);
            let value = self.operand_text(&inst.operands[1]);
            writeln!(self.body, "    {} = {};", slot, value)?;
        } else {
            let value = self.operand_text(&inst.operands[0]);
            writeln!(self.body, "{}{};", self.assign_to(inst.id), value)?;
        }
        Ok(())
    }

    /// `phi` with (array, index) operands is a loop-element load; with a
    /// single operand it is a merge copy; with none, the hoisted
    /// declaration is the whole story.
    fn emit_phi(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        match inst.operands.len() {
            0 => Ok(()),
            1 => {
                let value = self.operand_text(&inst.operands[0]);
                writeln!(self.body, "{}{};", self.assign_to(inst.id), value)?;
                Ok(())
            }
            _ => {
                let target = &inst.operands[0];
                let target_text = self.operand_text(target);
                let idx = self.operand_text(&inst.operands[1]);
                let elem_ty = self
                    .value_types
                    .get(&inst.id)
                    .cloned()
                    .unwrap_or_default();
                let len = target.as_value().and_then(|id| self.array_lens.get(&id)).copied();
                if !is_struct_type(&elem_ty) && len.is_some() {
                    writeln!(
                        self.body,
                        "{}omni_array_get_int({}, {}, {});",
                        self.assign_to(inst.id),
                        target_text,
                        idx,
                        len.unwrap()
                    )?;
                } else {
                    writeln!(
                        self.body,
                        "{}{}[{}];",
                        self.assign_to(inst.id),
                        target_text,
                        idx
                    )?;
                }
                Ok(())
            }
        }
    }

    fn emit_await(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let ty = self
            .value_types
            .get(&inst.id)
            .cloned()
            .unwrap_or_else(|| "string".to_string());
        let kind = kind_suffix(&ty).ok_or_else(|| {
            CodegenError::Hard(format!(
                "await of a promise of user-defined type '{}' is not supported",
                ty
            ))
        })?;
        let promise = self.operand_text(&inst.operands[0]);
        writeln!(
            self.body,
            "{}omni_await_{}({});",
            self.assign_to(inst.id),
            kind,
            promise
        )?;
        Ok(())
    }

    fn emit_malloc(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let ty = inst.ty.trim().trim_start_matches('*');
        if is_struct_type(ty) {
            writeln!(self.body, "{}omni_struct_create();", self.assign_to(inst.id))?;
        } else if let Some(size) = inst.operands.first() {
            let size = self.operand_text(size);
            writeln!(self.body, "{}malloc({});", self.assign_to(inst.id), size)?;
        } else {
            let c_ty = self.map_type(ty);
            writeln!(
                self.body,
                "{}malloc(sizeof({}));",
                self.assign_to(inst.id),
                c_ty
            )?;
        }
        Ok(())
    }

    fn emit_free(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = self.operand_text(&inst.operands[0]);
        writeln!(self.body, "    free((void*){});", target)?;
        if let Some(id) = inst.operands[0].as_value() {
            self.string_cleanup.remove(&id);
        }
        Ok(())
    }

    fn emit_realloc(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = self.operand_text(&inst.operands[0]);
        let size = self.operand_text(&inst.operands[1]);
        writeln!(
            self.body,
            "{}realloc((void*){}, {});",
            self.assign_to(inst.id),
            target,
            size
        )?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Files, tests, logging, function pointers
    // ------------------------------------------------------------------

    fn emit_file(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let suffix = inst.op.trim_start_matches("file.");
        let args: Vec<String> = inst.operands.iter().map(|o| self.operand_text(o)).collect();
        if inst.id.is_valid() {
            writeln!(
                self.body,
                "{}omni_file_{}({});",
                self.assign_to(inst.id),
                suffix,
                args.join(", ")
            )?;
        } else {
            writeln!(self.body, "    omni_file_{}({});", suffix, args.join(", "))?;
        }
        Ok(())
    }

    fn emit_test(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let suffix = inst.op.trim_start_matches("test.");
        let args: Vec<String> = inst.operands.iter().map(|o| self.operand_text(o)).collect();
        writeln!(self.body, "    omni_test_{}({});", suffix, args.join(", "))?;
        Ok(())
    }

    fn emit_assert(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let args: Vec<String> = inst.operands.iter().map(|o| self.operand_text(o)).collect();
        match inst.op.as_str() {
            "assert" => writeln!(self.body, "    omni_assert({});", args.join(", "))?,
            "assert.true" => writeln!(self.body, "    omni_assert_true({});", args.join(", "))?,
            "assert.false" => writeln!(self.body, "    omni_assert_false({});", args.join(", "))?,
            _ => {
                // assert.eq dispatches on operand type.
                let kind = inst
                    .operands
                    .iter()
                    .find_map(|o| self.operand_type(o))
                    .and_then(|t| kind_suffix(&t).map(str::to_string))
                    .unwrap_or_else(|| "int".to_string());
                let kind = if kind == "bool" { "int".to_string() } else { kind };
                writeln!(
                    self.body,
                    "    omni_assert_eq_{}({});",
                    kind,
                    args.join(", ")
                )?;
            }
        }
        Ok(())
    }

    fn emit_log(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let level = inst
            .op
            .rsplit('.')
            .next()
            .unwrap_or("info")
            .to_uppercase();
        match inst.operands.first() {
            Some(operand) => {
                let value = self.operand_text(operand);
                let format = match self.operand_type(operand).as_deref() {
                    Some("string") => "%s",
                    Some("float") | Some("double") => "%f",
                    _ => "%d",
                };
                writeln!(
                    self.body,
                    "    fprintf(stderr, \"[{}] {}\\n\", {});",
                    level, format, value
                )?;
            }
            None => {
                writeln!(self.body, "    fprintf(stderr, \"[{}]\\n\");", level)?;
            }
        }
        Ok(())
    }

    fn emit_func_ref(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let name = inst.operands[0].as_literal().unwrap_or("main");
        let c_name = match name {
            "main" => "omni_main",
            other => super::runtime::intrinsic(other)
                .map(|entry| entry.c_name)
                .unwrap_or(other),
        };
        writeln!(self.body, "{}{};", self.assign_to(inst.id), c_name)?;
        Ok(())
    }

    fn emit_func_assign(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let slot = self.operand_text(&inst.operands[0]);
        let value = self.operand_text(&inst.operands[1]);
        writeln!(self.body, "    {} = {};", slot, value)?;
        Ok(())
    }

    fn emit_func_call(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = self.operand_text(&inst.operands[0]);
        let args: Vec<String> = inst.operands[1..]
            .iter()
            .map(|o| self.operand_text(o))
            .collect();
        if inst.id.is_valid() {
            writeln!(
                self.body,
                "{}{}({});",
                self.assign_to(inst.id),
                target,
                args.join(", ")
            )?;
        } else {
            writeln!(self.body, "    {}({});", target, args.join(", "))?;
        }
        Ok(())
    }
}

/// Re-emit hex (`0x…`) and binary (`0b…`) literals as decimal.
fn radix_to_decimal(lit: &str) -> Option<String> {
    let lower = lit.to_ascii_lowercase();
    if let Some(digits) = lower.strip_prefix("0x") {
        return i64::from_str_radix(digits, 16).ok().map(|n| n.to_string());
    }
    if let Some(digits) = lower.strip_prefix("0b") {
        return i64::from_str_radix(digits, 2).ok().map(|n| n.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radix_to_decimal() {
        assert_eq!(radix_to_decimal("0xFF"), Some("255".to_string()));
        assert_eq!(radix_to_decimal("0XDEADBEEF"), Some("3735928559".to_string()));
        assert_eq!(radix_to_decimal("0b1010"), Some("10".to_string()));
        assert_eq!(radix_to_decimal("42"), None);
    }
}
