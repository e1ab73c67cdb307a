//! Terminator emission.

use super::state::mangle_label;
use super::types::promise_payload;
use super::{Codegen, CodegenError};
use crate::mir::Terminator;
use std::fmt::Write as _;

impl Codegen {
    pub(super) fn emit_terminator(&mut self, term: &Terminator) -> Result<(), CodegenError> {
        match term.op.as_str() {
            "ret" => self.emit_ret(term),
            "jmp" | "br" => {
                let target = term
                    .operands
                    .first()
                    .and_then(|o| o.as_literal())
                    .ok_or_else(|| CodegenError::Hard("jump without a target block".to_string()))?;
                writeln!(self.body, "    goto {};", mangle_label(target))?;
                Ok(())
            }
            "cbr" => {
                let cond = self.operand_text(&term.operands[0]);
                let then_block = term.operands[1]
                    .as_literal()
                    .ok_or_else(|| CodegenError::Hard("cbr without a then block".to_string()))?;
                let else_block = term.operands[2]
                    .as_literal()
                    .ok_or_else(|| CodegenError::Hard("cbr without an else block".to_string()))?;
                writeln!(
                    self.body,
                    "    if ({}) goto {}; else goto {};",
                    cond,
                    mangle_label(then_block),
                    mangle_label(else_block)
                )?;
                Ok(())
            }
            op => Err(CodegenError::Hard(format!(
                "unsupported MIR terminator '{}'",
                op
            ))),
        }
    }

    fn emit_ret(&mut self, term: &Terminator) -> Result<(), CodegenError> {
        let Some(operand) = term.operands.first() else {
            self.emit_epilogue(None)?;
            if self.in_main {
                writeln!(self.body, "    return 0;")?;
            } else {
                writeln!(self.body, "    return;")?;
            }
            return Ok(());
        };

        let returned = operand.as_value();
        let value_ty = self.operand_type(operand).unwrap_or_default();
        let text = self.operand_text(operand);

        // Async functions construct the promise at the return site,
        // unless the value already is one (returning another async
        // call's result through).
        if let Some(kind) = self.return_promise_kind()? {
            if promise_payload(&value_ty).is_some() {
                self.emit_epilogue(returned)?;
                writeln!(self.body, "    return {};", text)?;
            } else {
                self.emit_epilogue(returned)?;
                writeln!(
                    self.body,
                    "    return omni_promise_create_{}({});",
                    kind, text
                )?;
            }
            return Ok(());
        }

        // A returned string transfers ownership to the caller.
        if self.current_return == "string" {
            if let Some(id) = returned {
                self.string_cleanup.remove(&id);
            }
        }

        self.emit_epilogue(returned)?;
        writeln!(self.body, "    return {};", text)?;
        Ok(())
    }
}
