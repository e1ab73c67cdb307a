//! Call emission.
//!
//! The first operand of every `call*` instruction is the source function
//! name. Intrinsics resolve through the runtime table; anything else is
//! a user-defined function called by its own name (`main` becomes
//! `omni_main`). `len`, `print`/`println`, and the `*_async` family get
//! dedicated shapes.

use super::runtime::{intrinsic, RetKind};
use super::types::{array_element, kind_suffix, promise_payload};
use super::{Codegen, CodegenError};
use crate::mir::Inst;
use std::fmt::Write as _;

impl Codegen {
    pub(super) fn emit_call(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let name = inst
            .operands
            .first()
            .and_then(|o| o.as_literal())
            .ok_or_else(|| {
                CodegenError::Hard(format!(
                    "call without a target name (value {})",
                    inst.id
                ))
            })?
            .to_string();
        let args = &inst.operands[1..];

        match name.as_str() {
            "len" => return self.emit_len(inst),
            "print" | "println" | "std.io.print" | "std.io.println" => {
                return self.emit_print(inst, name.ends_with("println"));
            }
            _ => {}
        }

        // `foo_async` wraps the synchronous intrinsic into a promise.
        if let Some(base) = name.strip_suffix("_async") {
            if let Some(entry) = intrinsic(base) {
                if let Some(kind) = primitive_kind(entry.ret) {
                    let rendered: Vec<String> =
                        args.iter().map(|o| self.operand_text(o)).collect();
                    writeln!(
                        self.body,
                        "    {} = omni_promise_create_{}({}({}));",
                        self.name_of(inst.id),
                        kind,
                        entry.c_name,
                        rendered.join(", ")
                    )?;
                    return Ok(());
                }
            }
        }

        let c_name = match intrinsic(&name) {
            Some(entry) => entry.c_name.to_string(),
            None if name == "main" => "omni_main".to_string(),
            None => name.clone(),
        };

        let rendered: Vec<String> = args.iter().map(|o| self.operand_text(o)).collect();
        let call = format!("{}({})", c_name, rendered.join(", "));

        let produces = inst.id.is_valid()
            && inst.op != "call.void"
            && self
                .value_types
                .get(&inst.id)
                .is_none_or(|ty| ty != "void");
        if produces {
            // A user call declared `Promise<T>` already returns the
            // promise pointer; wrapping happens at the async function's
            // own return sites.
            writeln!(self.body, "    {} = {};", self.name_of(inst.id), call)?;
        } else {
            writeln!(self.body, "    {};", call)?;
        }
        Ok(())
    }

    /// `len(a)` becomes `omni_len(ptr, sizeof(element), length)` with
    /// `-1` standing in for an unknown length.
    fn emit_len(&mut self, inst: &Inst) -> Result<(), CodegenError> {
        let target = &inst.operands[1];
        let target_text = self.operand_text(target);
        let target_ty = self.operand_type(target).unwrap_or_default();
        let elem = array_element(&target_ty).unwrap_or_else(|| "int".to_string());
        let elem_c = self.map_type(&elem);
        let len = target
            .as_value()
            .and_then(|id| self.array_lens.get(&id).copied())
            .map(|n| n.to_string())
            .unwrap_or_else(|| "-1".to_string());
        writeln!(
            self.body,
            "    {} = omni_len((void*){}, sizeof({}), {});",
            self.name_of(inst.id),
            target_text,
            elem_c,
            len
        )?;
        Ok(())
    }

    /// print/println specialize on the argument type, converting
    /// non-strings through a tracked temporary.
    fn emit_print(&mut self, inst: &Inst, newline: bool) -> Result<(), CodegenError> {
        let f = if newline {
            "omni_println_string"
        } else {
            "omni_print_string"
        };
        let Some(arg) = inst.operands.get(1) else {
            writeln!(self.body, "    {}(\"\");", f)?;
            return Ok(());
        };
        let value = self.operand_text(arg);
        if self.is_string_operand(arg) {
            writeln!(self.body, "    {}({});", f, value)?;
            return Ok(());
        }
        let converter = match self.operand_type(arg).as_deref() {
            Some("float") | Some("double") => "omni_float_to_string",
            Some("bool") => "omni_bool_to_string",
            _ => "omni_int_to_string",
        };
        let temp = self.fresh_temp();
        writeln!(
            self.body,
            "    const char* {} = {}({});",
            temp, converter, value
        )?;
        writeln!(self.body, "    {}({});", f, temp)?;
        self.temp_strings.push(temp);
        Ok(())
    }
}

fn primitive_kind(kind: RetKind) -> Option<&'static str> {
    match kind {
        RetKind::Int => Some("int"),
        RetKind::Float => Some("float"),
        RetKind::Bool => Some("bool"),
        RetKind::Str => Some("string"),
        _ => None,
    }
}

impl Codegen {
    /// Kind suffix for the payload of the current function's `Promise<T>`
    /// return type, or a hard error for user-defined payloads.
    pub(super) fn return_promise_kind(&self) -> Result<Option<&'static str>, CodegenError> {
        let Some(payload) = promise_payload(&self.current_return) else {
            return Ok(None);
        };
        match kind_suffix(&payload) {
            Some(kind) => Ok(Some(kind)),
            None => Err(CodegenError::Hard(format!(
                "cannot create a promise of user-defined type '{}'",
                payload
            ))),
        }
    }
}
