//! AST to MIR lowering.
//!
//! Walks a parsed module and produces the SSA form the C backend
//! consumes. Lowering is deliberately modest: no optimization, no
//! dominance computation beyond emission order, and type knowledge
//! limited to const-literal classification plus declared types.
//!
//! Conventions shared with the backend:
//! - Hex and binary literals always materialize as `const` instructions
//!   (the backend re-emits them as decimal); other literals stay inline
//!   operands where an operand position allows it.
//! - A `const 0` int marks its value as loop-mutable; arithmetic whose
//!   left operand is such a value updates it in place.
//! - Range loops load their element through a `phi` instruction.
//! - Block names: `entry`, then `then<N>`/`else<N>`/`merge<N>` and
//!   `loop.cond<N>`/`loop.body<N>`/`loop.end<N>` in creation order.

use crate::ast::{
    BinaryOp, Block, Decl, Expr, FuncBody, FuncDecl, IncOp, InterpPart, LitKind, Module, Stmt,
    TypeExpr, UnaryOp,
};
use crate::mir::{
    BasicBlock, Inst, MirFunction, MirModule, MirParam, Operand, Terminator, ValueId, TYPE_INFER,
};
use std::collections::{HashMap, HashSet};

/// Lower a module to MIR. Returns the first lowering error encountered.
pub fn lower_module(module: &Module) -> Result<MirModule, String> {
    let mut ctx = ModuleCtx::default();
    for decl in &module.decls {
        match decl {
            Decl::Struct(s) => {
                let fields = s
                    .fields
                    .iter()
                    .map(|f| (f.name.clone(), f.ty.source_text()))
                    .collect();
                ctx.struct_fields.insert(s.name.clone(), fields);
            }
            Decl::Enum(e) => {
                for (index, variant) in e.variants.iter().enumerate() {
                    ctx.enum_consts
                        .insert(format!("{}.{}", e.name, variant), index as i64);
                }
            }
            Decl::Func(f) => {
                ctx.func_returns
                    .insert(f.name.clone(), function_return_type(f));
            }
            // Top-level bindings carry no code of their own; their types
            // feed classification when referenced.
            Decl::Let(b) | Decl::Var(b) => {
                if let Some(ty) = &b.ty {
                    ctx.global_types.insert(b.name.clone(), ty.source_text());
                }
            }
            Decl::TypeAlias(_) => {}
        }
    }

    let mut functions = Vec::new();
    for decl in &module.decls {
        if let Decl::Func(f) = decl {
            functions.push(FuncLowering::new(&ctx).lower(f)?);
        }
    }
    Ok(MirModule { functions })
}

fn function_return_type(f: &FuncDecl) -> String {
    let declared = f
        .return_type
        .as_ref()
        .map(TypeExpr::source_text)
        .unwrap_or_else(|| "void".to_string());
    if f.is_async {
        format!("Promise<{}>", declared)
    } else {
        declared
    }
}

#[derive(Default)]
struct ModuleCtx {
    /// struct name -> field name -> source type
    struct_fields: HashMap<String, HashMap<String, String>>,
    /// `Enum.Variant` -> ordinal
    enum_consts: HashMap<String, i64>,
    func_returns: HashMap<String, String>,
    global_types: HashMap<String, String>,
}

struct VarInfo {
    id: ValueId,
    ty: Option<String>,
}

struct BlockInProgress {
    name: String,
    insts: Vec<Inst>,
    terminator: Option<Terminator>,
}

struct FuncLowering<'a> {
    ctx: &'a ModuleCtx,
    blocks: Vec<BlockInProgress>,
    current: usize,
    next_id: u32,
    label_counter: u32,
    scopes: Vec<HashMap<String, VarInfo>>,
    /// Values the backend will treat as loop-mutable.
    phi_ids: HashSet<ValueId>,
    /// Known array lengths, mirrored by the backend for bounds checks.
    array_lens: HashMap<ValueId, usize>,
    value_types: HashMap<ValueId, String>,
    /// (continue target, break target) labels for enclosing loops.
    loop_stack: Vec<(String, String)>,
}

impl<'a> FuncLowering<'a> {
    fn new(ctx: &'a ModuleCtx) -> Self {
        FuncLowering {
            ctx,
            blocks: vec![BlockInProgress {
                name: "entry".to_string(),
                insts: Vec::new(),
                terminator: None,
            }],
            current: 0,
            next_id: 0,
            label_counter: 0,
            scopes: vec![HashMap::new()],
            phi_ids: HashSet::new(),
            array_lens: HashMap::new(),
            value_types: HashMap::new(),
            loop_stack: Vec::new(),
        }
    }

    fn lower(mut self, f: &FuncDecl) -> Result<MirFunction, String> {
        let mut params = Vec::new();
        for p in &f.params {
            let id = self.fresh();
            let ty = p
                .ty
                .as_ref()
                .map(TypeExpr::source_text)
                .unwrap_or_else(|| "int".to_string());
            self.value_types.insert(id, ty.clone());
            self.bind(&p.name, id, Some(ty.clone()));
            params.push(MirParam {
                id,
                name: p.name.clone(),
                ty,
            });
        }

        match &f.body {
            FuncBody::Block(block) => self.lower_stmts(&block.stmts)?,
            FuncBody::Expr(expr) => {
                let value = self.lower_to_value(expr)?;
                self.terminate(Terminator::ret(Some(value)));
            }
        }

        // Fall-through blocks return without a value.
        for block in &mut self.blocks {
            if block.terminator.is_none() {
                block.terminator = Some(Terminator::ret(None));
            }
        }

        Ok(MirFunction {
            name: f.name.clone(),
            return_type: function_return_type(f),
            params,
            blocks: self
                .blocks
                .into_iter()
                .map(|b| BasicBlock {
                    name: b.name,
                    insts: b.insts,
                    terminator: b.terminator.unwrap(),
                })
                .collect(),
        })
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn lower_stmts(&mut self, stmts: &[Stmt]) -> Result<(), String> {
        for stmt in stmts {
            if self.blocks[self.current].terminator.is_some() {
                // Unreachable code after return/break; nothing to emit.
                break;
            }
            self.lower_stmt(stmt)?;
        }
        Ok(())
    }

    fn lower_stmt(&mut self, stmt: &Stmt) -> Result<(), String> {
        match stmt {
            Stmt::Block(block) => {
                self.scopes.push(HashMap::new());
                let result = self.lower_stmts(&block.stmts);
                self.scopes.pop();
                result
            }
            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => Some(self.lower_to_value(expr)?),
                    None => None,
                };
                self.terminate(Terminator::ret(value));
                Ok(())
            }
            Stmt::Expr(expr) => {
                self.lower_expr(expr)?;
                Ok(())
            }
            Stmt::If {
                cond,
                then_block,
                else_branch,
                ..
            } => self.lower_if(cond, then_block, else_branch.as_deref()),
            Stmt::While { cond, body, .. } => self.lower_while(cond, body),
            Stmt::For(f) => {
                if f.is_range {
                    self.lower_range_for(f)
                } else {
                    self.lower_classic_for(f)
                }
            }
            Stmt::Break { .. } => {
                let target = self
                    .loop_stack
                    .last()
                    .map(|(_, end)| end.clone())
                    .ok_or_else(|| "'break' outside of a loop".to_string())?;
                self.terminate(Terminator::jmp(target));
                Ok(())
            }
            Stmt::Continue { .. } => {
                let target = self
                    .loop_stack
                    .last()
                    .map(|(cond, _)| cond.clone())
                    .ok_or_else(|| "'continue' outside of a loop".to_string())?;
                self.terminate(Terminator::jmp(target));
                Ok(())
            }
            // Thrown exceptions print and continue, so catch bodies are
            // unreachable; the try and finally bodies run in order.
            Stmt::Try {
                body, finally, ..
            } => {
                self.scopes.push(HashMap::new());
                let result = self.lower_stmts(&body.stmts);
                self.scopes.pop();
                result?;
                if let Some(finally) = finally {
                    self.scopes.push(HashMap::new());
                    let result = self.lower_stmts(&finally.stmts);
                    self.scopes.pop();
                    result?;
                }
                Ok(())
            }
            Stmt::Throw { value, .. } => {
                let operand = self.lower_expr(value)?;
                self.emit(Inst::new(ValueId::INVALID, "throw", "", vec![operand.0]));
                Ok(())
            }
            Stmt::Binding {
                name, ty, value, ..
            } => {
                let declared = ty.as_ref().map(TypeExpr::source_text);
                match value {
                    Some(expr) => {
                        let (id, inferred) = self.lower_binding_value(expr, declared.as_deref())?;
                        let final_ty = declared.or(inferred);
                        if let Some(t) = &final_ty {
                            self.value_types.insert(id, t.clone());
                        }
                        self.bind(name, id, final_ty);
                    }
                    None => {
                        let id = self.emit_const_zero();
                        if let Some(t) = &declared {
                            self.value_types.insert(id, t.clone());
                        }
                        self.bind(name, id, declared);
                    }
                }
                Ok(())
            }
            Stmt::ShortVarDecl { name, value, .. } => {
                let (id, inferred) = self.lower_binding_value(value, None)?;
                if let Some(t) = &inferred {
                    self.value_types.insert(id, t.clone());
                }
                self.bind(name, id, inferred);
                Ok(())
            }
            Stmt::Assignment { target, value, .. } => self.lower_assignment(target, value),
            Stmt::Increment { target, op, .. } => self.lower_increment(target, *op),
        }
    }

    /// Lower a binding initializer to a definite value, materializing
    /// plain literals as `const` so the variable has a home.
    fn lower_binding_value(
        &mut self,
        expr: &Expr,
        declared: Option<&str>,
    ) -> Result<(ValueId, Option<String>), String> {
        let (operand, inferred) = self.lower_expr(expr)?;
        let ty = declared
            .map(str::to_string)
            .or(inferred)
            .unwrap_or_else(|| TYPE_INFER.to_string());
        match operand.as_value() {
            Some(id) => Ok((id, Some(ty))),
            None => {
                let id = self.fresh();
                // `const 0` doubles as the loop-induction marker.
                if operand.as_literal() == Some("0") && ty == "int" {
                    self.phi_ids.insert(id);
                }
                self.emit(Inst::new(id, "const", ty.clone(), vec![operand]));
                Ok((id, Some(ty)))
            }
        }
    }

    fn lower_assignment(&mut self, target: &Expr, value: &Expr) -> Result<(), String> {
        match target {
            Expr::Identifier { name, .. } => {
                let (operand, ty) = self.lower_expr(value)?;
                if let Some(info) = self.lookup(name) {
                    if self.phi_ids.contains(&info.id) {
                        // Store into the loop-carried slot; no rebind.
                        let slot = info.id;
                        self.emit(Inst::new(
                            ValueId::INVALID,
                            "assign",
                            "",
                            vec![Operand::value(slot), operand],
                        ));
                        return Ok(());
                    }
                }
                let id = self.fresh();
                self.emit(Inst::new(
                    id,
                    "assign",
                    ty.clone().unwrap_or_else(|| TYPE_INFER.to_string()),
                    vec![operand],
                ));
                if let Some(t) = &ty {
                    self.value_types.insert(id, t.clone());
                }
                self.bind_existing(name, id, ty);
                Ok(())
            }
            Expr::Index {
                target: base,
                index,
                ..
            } => {
                let base_ty = self.classify(base);
                let base_val = self.lower_to_value(base)?;
                let (idx, _) = self.lower_expr(index)?;
                let (val, _) = self.lower_expr(value)?;
                let op = if base_ty.as_deref().is_some_and(|t| t.starts_with("map<")) {
                    "map.set"
                } else {
                    "array.set"
                };
                self.emit(Inst::new(
                    ValueId::INVALID,
                    op,
                    "",
                    vec![Operand::value(base_val), idx, val],
                ));
                Ok(())
            }
            Expr::Member {
                target: base, name, ..
            } => {
                let field_ty = self.member_type(base, name);
                let base_val = self.lower_to_value(base)?;
                let (val, val_ty) = self.lower_expr(value)?;
                let ty = field_ty.or(val_ty).unwrap_or_else(|| TYPE_INFER.to_string());
                self.emit(Inst::new(
                    ValueId::INVALID,
                    "member.set",
                    ty,
                    vec![
                        Operand::value(base_val),
                        Operand::literal(name.clone()),
                        val,
                    ],
                ));
                Ok(())
            }
            other => Err(format!(
                "cannot assign to this expression (at {}:{})",
                other.span().start.line,
                other.span().start.column
            )),
        }
    }

    fn lower_increment(&mut self, target: &Expr, op: IncOp) -> Result<(), String> {
        let Expr::Identifier { name, .. } = target else {
            return Err("'++'/'--' target must be a variable".to_string());
        };
        let info = self
            .lookup(name)
            .ok_or_else(|| format!("unknown variable '{}'", name))?;
        let target_id = info.id;
        let mir_op = match op {
            IncOp::Inc => "add",
            IncOp::Dec => "sub",
        };
        let id = self.fresh();
        self.emit(Inst::new(
            id,
            mir_op,
            "int",
            vec![Operand::value(target_id), Operand::literal("1").with_ty("int")],
        ));
        // When the target is loop-mutable the backend updates it in
        // place, so keep the name bound to the φ slot.
        if !self.phi_ids.contains(&target_id) {
            self.bind_existing(name, id, Some("int".to_string()));
        }
        Ok(())
    }

    fn lower_if(
        &mut self,
        cond: &Expr,
        then_block: &Block,
        else_branch: Option<&Stmt>,
    ) -> Result<(), String> {
        let n = self.next_label();
        let then_label = format!("then{}", n);
        let else_label = format!("else{}", n);
        let merge_label = format!("merge{}", n);

        let cond_val = self.lower_to_value(cond)?;
        let false_target = if else_branch.is_some() {
            else_label.clone()
        } else {
            merge_label.clone()
        };
        self.terminate(Terminator::cbr(cond_val, then_label.clone(), false_target));

        let then_idx = self.new_block(then_label);
        self.current = then_idx;
        self.scopes.push(HashMap::new());
        let result = self.lower_stmts(&then_block.stmts);
        self.scopes.pop();
        result?;
        self.terminate(Terminator::jmp(merge_label.clone()));

        if let Some(else_stmt) = else_branch {
            let else_idx = self.new_block(else_label);
            self.current = else_idx;
            self.scopes.push(HashMap::new());
            let result = self.lower_stmt(else_stmt);
            self.scopes.pop();
            result?;
            self.terminate(Terminator::jmp(merge_label.clone()));
        }

        let merge_idx = self.new_block(merge_label);
        self.current = merge_idx;
        Ok(())
    }

    fn lower_while(&mut self, cond: &Expr, body: &Block) -> Result<(), String> {
        let n = self.next_label();
        let cond_label = format!("loop.cond{}", n);
        let body_label = format!("loop.body{}", n);
        let end_label = format!("loop.end{}", n);

        self.terminate(Terminator::jmp(cond_label.clone()));
        let cond_idx = self.new_block(cond_label.clone());
        self.current = cond_idx;
        let cond_val = self.lower_to_value(cond)?;
        self.terminate(Terminator::cbr(cond_val, body_label.clone(), end_label.clone()));

        let body_idx = self.new_block(body_label);
        self.current = body_idx;
        self.loop_stack.push((cond_label.clone(), end_label.clone()));
        self.scopes.push(HashMap::new());
        let result = self.lower_stmts(&body.stmts);
        self.scopes.pop();
        self.loop_stack.pop();
        result?;
        self.terminate(Terminator::jmp(cond_label));

        let end_idx = self.new_block(end_label);
        self.current = end_idx;
        Ok(())
    }

    fn lower_classic_for(&mut self, f: &crate::ast::ForStmt) -> Result<(), String> {
        self.scopes.push(HashMap::new());
        let result: Result<(), String> = (|| {
            if let Some(init) = &f.init {
                self.lower_stmt(init)?;
            }

            let n = self.next_label();
            let cond_label = format!("loop.cond{}", n);
            let body_label = format!("loop.body{}", n);
            let end_label = format!("loop.end{}", n);

            self.terminate(Terminator::jmp(cond_label.clone()));
            let cond_idx = self.new_block(cond_label.clone());
            self.current = cond_idx;
            match &f.condition {
                Some(cond) => {
                    let cond_val = self.lower_to_value(cond)?;
                    self.terminate(Terminator::cbr(
                        cond_val,
                        body_label.clone(),
                        end_label.clone(),
                    ));
                }
                None => self.terminate(Terminator::jmp(body_label.clone())),
            }

            let body_idx = self.new_block(body_label);
            self.current = body_idx;
            self.loop_stack.push((cond_label.clone(), end_label.clone()));
            let body_result = self.lower_stmts(&f.body.stmts);
            self.loop_stack.pop();
            body_result?;
            if let Some(post) = &f.post {
                if self.blocks[self.current].terminator.is_none() {
                    self.lower_stmt(post)?;
                }
            }
            self.terminate(Terminator::jmp(cond_label));

            let end_idx = self.new_block(end_label);
            self.current = end_idx;
            Ok(())
        })();
        self.scopes.pop();
        result
    }

    /// `for x in xs { … }` lowers to an index-driven loop whose element
    /// load is a `phi` instruction over (array, index).
    fn lower_range_for(&mut self, f: &crate::ast::ForStmt) -> Result<(), String> {
        let target = f.target.as_ref().expect("range form has a target");
        let iterable = f.iterable.as_ref().expect("range form has an iterable");

        let iter_ty = self.classify(iterable);
        let array_val = self.lower_to_value(iterable)?;
        let elem_ty = iter_ty
            .as_deref()
            .and_then(element_type)
            .unwrap_or_else(|| TYPE_INFER.to_string());

        // Induction index, marked loop-mutable by the zero-const rule.
        let idx = self.fresh();
        self.phi_ids.insert(idx);
        self.emit(Inst::new(
            idx,
            "const",
            "int",
            vec![Operand::literal("0").with_ty("int")],
        ));

        let len_operand = match self.array_lens.get(&array_val) {
            Some(len) => Operand::literal(len.to_string()).with_ty("int"),
            None => {
                let len_id = self.fresh();
                self.value_types.insert(len_id, "int".to_string());
                self.emit(Inst::new(
                    len_id,
                    "call.int",
                    "int",
                    vec![Operand::literal("len"), Operand::value(array_val)],
                ));
                Operand::value(len_id)
            }
        };

        let n = self.next_label();
        let cond_label = format!("loop.cond{}", n);
        let body_label = format!("loop.body{}", n);
        let end_label = format!("loop.end{}", n);

        self.terminate(Terminator::jmp(cond_label.clone()));
        let cond_idx = self.new_block(cond_label.clone());
        self.current = cond_idx;
        let cond_id = self.fresh();
        self.emit(Inst::new(
            cond_id,
            "cmp.lt",
            "bool",
            vec![Operand::value(idx), len_operand],
        ));
        self.terminate(Terminator::cbr(cond_id, body_label.clone(), end_label.clone()));

        let body_idx = self.new_block(body_label);
        self.current = body_idx;
        self.scopes.push(HashMap::new());
        self.loop_stack.push((cond_label.clone(), end_label.clone()));
        let result: Result<(), String> = (|| {
            let elem = self.fresh();
            self.phi_ids.insert(elem);
            self.emit(Inst::new(
                elem,
                "phi",
                elem_ty.clone(),
                vec![Operand::value(array_val), Operand::value(idx)],
            ));
            self.value_types.insert(elem, elem_ty.clone());
            self.bind(target, elem, Some(elem_ty.clone()));

            self.lower_stmts(&f.body.stmts)?;

            if self.blocks[self.current].terminator.is_none() {
                let step = self.fresh();
                self.emit(Inst::new(
                    step,
                    "add",
                    "int",
                    vec![Operand::value(idx), Operand::literal("1").with_ty("int")],
                ));
            }
            Ok(())
        })();
        self.loop_stack.pop();
        self.scopes.pop();
        result?;
        self.terminate(Terminator::jmp(cond_label));

        let end_idx = self.new_block(end_label);
        self.current = end_idx;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// Lower an expression to an operand plus its classified type.
    /// Literals come back as inline literal operands except hex/binary,
    /// which always materialize.
    fn lower_expr(&mut self, expr: &Expr) -> Result<(Operand, Option<String>), String> {
        match expr {
            Expr::Literal { kind, raw, .. } => match kind {
                LitKind::Hex | LitKind::Binary => {
                    let id = self.fresh();
                    let lit_ty = if *kind == LitKind::Hex { "hex" } else { "binary" };
                    self.emit(Inst::new(
                        id,
                        "const",
                        "int",
                        vec![Operand::literal(raw.clone()).with_ty(lit_ty)],
                    ));
                    self.value_types.insert(id, "int".to_string());
                    Ok((Operand::value(id), Some("int".to_string())))
                }
                _ => {
                    let (text, ty) = literal_operand(*kind, raw);
                    Ok((Operand::literal(text).with_ty(ty), Some(ty.to_string())))
                }
            },
            Expr::Identifier { name, .. } => {
                if let Some(info) = self.lookup(name) {
                    let id = info.id;
                    let ty = info.ty.clone();
                    return Ok((Operand::value(id), ty));
                }
                if self.ctx.func_returns.contains_key(name) {
                    let id = self.fresh();
                    self.emit(Inst::new(
                        id,
                        "func.ref",
                        TYPE_INFER,
                        vec![Operand::literal(name.clone())],
                    ));
                    return Ok((Operand::value(id), None));
                }
                if let Some(ty) = self.ctx.global_types.get(name) {
                    return Err(format!(
                        "global '{}' (of type {}) is not materialized in this context",
                        name, ty
                    ));
                }
                Err(format!("unknown identifier '{}'", name))
            }
            Expr::StringInterp { parts, .. } => self.lower_interpolation(parts),
            Expr::Unary { op, operand, .. } => {
                let (inner, ty) = self.lower_expr(operand)?;
                let mir_op = match op {
                    UnaryOp::Neg => "neg",
                    UnaryOp::Not => "not",
                    UnaryOp::BitNot => "bitnot",
                };
                let id = self.fresh();
                let ty_text = ty.clone().unwrap_or_else(|| "int".to_string());
                self.emit(Inst::new(id, mir_op, ty_text, vec![inner]));
                Ok((Operand::value(id), ty))
            }
            Expr::Binary { op, left, right, .. } => self.lower_binary(*op, left, right),
            Expr::Call { .. } => self.lower_call(expr),
            Expr::Index { target, index, .. } => {
                let target_ty = self.classify(target);
                let target_val = self.lower_to_value(target)?;
                let (idx, _) = self.lower_expr(index)?;
                let result_ty = target_ty
                    .as_deref()
                    .and_then(element_type)
                    .unwrap_or_else(|| TYPE_INFER.to_string());
                let id = self.fresh();
                self.emit(Inst::new(
                    id,
                    "index",
                    result_ty.clone(),
                    vec![Operand::value(target_val), idx],
                ));
                self.value_types.insert(id, result_ty.clone());
                Ok((Operand::value(id), Some(result_ty)))
            }
            Expr::Member { target, name, .. } => {
                // Enum constant reference: `Color.Red`.
                if let Some(value) = self.enum_const(target, name) {
                    return Ok((
                        Operand::literal(value.to_string()).with_ty("int"),
                        Some("int".to_string()),
                    ));
                }
                let field_ty = self
                    .member_type(target, name)
                    .unwrap_or_else(|| TYPE_INFER.to_string());
                let target_val = self.lower_to_value(target)?;
                let id = self.fresh();
                self.emit(Inst::new(
                    id,
                    "member",
                    field_ty.clone(),
                    vec![Operand::value(target_val), Operand::literal(name.clone())],
                ));
                self.value_types.insert(id, field_ty.clone());
                Ok((Operand::value(id), Some(field_ty)))
            }
            Expr::ArrayLiteral { elements, .. } => {
                let mut operands = Vec::new();
                let mut elem_ty: Option<String> = None;
                for element in elements {
                    let (operand, ty) = self.lower_expr(element)?;
                    if elem_ty.is_none() {
                        elem_ty = ty;
                    }
                    operands.push(operand);
                }
                let elem_ty = elem_ty.unwrap_or_else(|| "int".to_string());
                let array_ty = format!("array<{}>", elem_ty);
                let id = self.fresh();
                self.emit(Inst::new(id, "array.init", array_ty.clone(), operands));
                self.array_lens.insert(id, elements.len());
                self.value_types.insert(id, array_ty.clone());
                Ok((Operand::value(id), Some(array_ty)))
            }
            Expr::MapLiteral { entries, .. } => {
                let mut operands = Vec::new();
                let mut key_ty: Option<String> = None;
                let mut val_ty: Option<String> = None;
                for (key, value) in entries {
                    let (k, kt) = self.lower_expr(key)?;
                    let (v, vt) = self.lower_expr(value)?;
                    if key_ty.is_none() {
                        key_ty = kt;
                    }
                    if val_ty.is_none() {
                        val_ty = vt;
                    }
                    operands.push(k);
                    operands.push(v);
                }
                let map_ty = format!(
                    "map<{}, {}>",
                    key_ty.unwrap_or_else(|| "string".to_string()),
                    val_ty.unwrap_or_else(|| "int".to_string())
                );
                let id = self.fresh();
                self.emit(Inst::new(id, "map.init", map_ty.clone(), operands));
                self.value_types.insert(id, map_ty.clone());
                Ok((Operand::value(id), Some(map_ty)))
            }
            Expr::StructLiteral {
                type_name, fields, ..
            } => {
                let struct_ty = type_name.source_text();
                let mut operands = Vec::new();
                for (fname, fvalue) in fields {
                    let (operand, ty) = self.lower_expr(fvalue)?;
                    let operand = match ty {
                        Some(t) if operand.ty.is_none() => operand.with_ty(t),
                        _ => operand,
                    };
                    operands.push(Operand::literal(fname.clone()));
                    operands.push(operand);
                }
                let id = self.fresh();
                self.emit(Inst::new(id, "struct.init", struct_ty.clone(), operands));
                self.value_types.insert(id, struct_ty.clone());
                Ok((Operand::value(id), Some(struct_ty)))
            }
            Expr::Assignment { target, value, .. } => {
                self.lower_assignment(target, value)?;
                self.lower_expr(target)
            }
            Expr::Increment { target, op, .. } => {
                self.lower_increment(target, *op)?;
                self.lower_expr(target)
            }
            Expr::New { ty, .. } => {
                let ty_text = ty.source_text();
                let id = self.fresh();
                self.emit(Inst::new(id, "malloc", ty_text.clone(), vec![]));
                self.value_types.insert(id, ty_text.clone());
                Ok((Operand::value(id), Some(ty_text)))
            }
            Expr::Delete { target, .. } => {
                let value = self.lower_to_value(target)?;
                self.emit(Inst::new(
                    ValueId::INVALID,
                    "free",
                    "",
                    vec![Operand::value(value)],
                ));
                Ok((Operand::literal("0").with_ty("int"), Some("int".to_string())))
            }
            Expr::Lambda { .. } => {
                // Reaches the backend only to produce its closure error.
                let id = self.fresh();
                self.emit(Inst::new(id, "closure.create", TYPE_INFER, vec![]));
                Ok((Operand::value(id), None))
            }
            Expr::Cast { ty, expr, .. } => {
                let (inner, _) = self.lower_expr(expr)?;
                let ty_text = ty.source_text();
                let id = self.fresh();
                self.emit(Inst::new(id, "cast", ty_text.clone(), vec![inner]));
                self.value_types.insert(id, ty_text.clone());
                Ok((Operand::value(id), Some(ty_text)))
            }
            Expr::Await { expr, .. } => {
                let inner_ty = self.classify(expr);
                let value = self.lower_to_value(expr)?;
                let result_ty = inner_ty
                    .as_deref()
                    .and_then(promise_payload)
                    .unwrap_or_else(|| TYPE_INFER.to_string());
                let id = self.fresh();
                self.emit(Inst::new(
                    id,
                    "await",
                    result_ty.clone(),
                    vec![Operand::value(value)],
                ));
                self.value_types.insert(id, result_ty.clone());
                Ok((Operand::value(id), Some(result_ty)))
            }
        }
    }

    /// Names the lowering recognizes as dedicated MIR operations rather
    /// than plain calls.
    fn builtin_stmt_op(name: &str) -> Option<&'static str> {
        let op = match name {
            "assert" => "assert",
            "assert_eq" => "assert.eq",
            "assert_true" => "assert.true",
            "assert_false" => "assert.false",
            "test.start" => "test.start",
            "test.end" => "test.end",
            "test.summary" => "test.summary",
            "std.log.debug" => "std.log.debug",
            "std.log.info" => "std.log.info",
            "std.log.warn" => "std.log.warn",
            "std.log.error" => "std.log.error",
            "file.open" => "file.open",
            "file.close" => "file.close",
            "file.read" => "file.read",
            "file.write" => "file.write",
            "file.seek" => "file.seek",
            "file.tell" => "file.tell",
            "file.exists" => "file.exists",
            "file.size" => "file.size",
            _ => return None,
        };
        Some(op)
    }

    fn lower_call(&mut self, expr: &Expr) -> Result<(Operand, Option<String>), String> {
        let Expr::Call { callee, args, .. } = expr else {
            unreachable!("lower_call takes a call expression");
        };

        // Call through a function-pointer variable.
        if let Expr::Identifier { name, .. } = callee.as_ref() {
            let local_fn = self
                .lookup(name)
                .map(|info| (info.id, info.ty.clone()))
                .filter(|_| !self.ctx.func_returns.contains_key(name));
            if let Some((target, ty)) = local_fn {
                if ty.as_deref().is_some_and(|t| t.contains("->")) {
                    let mut operands = vec![Operand::value(target)];
                    for arg in args {
                        operands.push(self.lower_annotated_arg(arg)?);
                    }
                    let ret_ty = ty
                        .as_deref()
                        .and_then(|t| t.rsplit("->").next())
                        .map(str::trim)
                        .unwrap_or("int")
                        .to_string();
                    let id = self.fresh();
                    self.emit(Inst::new(id, "func.call", ret_ty.clone(), operands));
                    self.value_types.insert(id, ret_ty.clone());
                    return Ok((Operand::value(id), Some(ret_ty)));
                }
            }
        }

        let name = callee_name(callee)
            .ok_or_else(|| "call target must be a (possibly dotted) name".to_string())?;

        // Builtins with dedicated MIR operations.
        if let Some(op) = Self::builtin_stmt_op(&name) {
            let mut operands = Vec::new();
            for arg in args {
                operands.push(self.lower_annotated_arg(arg)?);
            }
            let produces = matches!(
                op,
                "file.open" | "file.read" | "file.tell" | "file.exists" | "file.size"
            );
            let id = if produces { self.fresh() } else { ValueId::INVALID };
            let ty = if produces { "int" } else { "" };
            self.emit(Inst::new(id, op, ty, operands));
            if produces {
                self.value_types.insert(id, "int".to_string());
                return Ok((Operand::value(id), Some("int".to_string())));
            }
            return Ok((Operand::literal("0").with_ty("int"), Some("int".to_string())));
        }

        let ret_ty = self
            .ctx
            .func_returns
            .get(&name)
            .cloned()
            .or_else(|| intrinsic_return_type(&name).map(str::to_string));

        let op = match ret_ty.as_deref() {
            Some("void") => "call.void",
            Some("int") => "call.int",
            Some("string") => "call.string",
            Some("bool") => "call.bool",
            _ => "call",
        };

        let mut operands = vec![Operand::literal(name.clone())];
        for arg in args {
            operands.push(self.lower_annotated_arg(arg)?);
        }

        let id = if ret_ty.as_deref() == Some("void") {
            ValueId::INVALID
        } else {
            self.fresh()
        };
        let inst_ty = ret_ty.clone().unwrap_or_else(|| TYPE_INFER.to_string());
        self.emit(Inst::new(id, op, inst_ty, operands));
        if id.is_valid() {
            if let Some(t) = &ret_ty {
                self.value_types.insert(id, t.clone());
            }
            Ok((Operand::value(id), ret_ty))
        } else {
            Ok((Operand::literal("0").with_ty("int"), Some("int".to_string())))
        }
    }

    /// Lower a call argument, annotating the operand with its classified
    /// type so the backend can specialize (print, map dispatch, …).
    fn lower_annotated_arg(&mut self, arg: &Expr) -> Result<Operand, String> {
        let (operand, ty) = self.lower_expr(arg)?;
        Ok(match ty {
            Some(t) if operand.ty.is_none() => operand.with_ty(t),
            _ => operand,
        })
    }

    fn lower_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
    ) -> Result<(Operand, Option<String>), String> {
        let left_ty = self.classify(left);
        let right_ty = self.classify(right);
        let is_string = left_ty.as_deref() == Some("string") || right_ty.as_deref() == Some("string");

        let (lhs, _) = self.lower_expr(left)?;
        let (rhs, _) = self.lower_expr(right)?;
        let lhs = annotate(lhs, &left_ty);
        let rhs = annotate(rhs, &right_ty);

        let (mir_op, result_ty): (&str, String) = match op {
            BinaryOp::Add if is_string => ("strcat", "string".to_string()),
            BinaryOp::Add => ("add", numeric_result(&left_ty, &right_ty)),
            BinaryOp::Sub => ("sub", numeric_result(&left_ty, &right_ty)),
            BinaryOp::Mul => ("mul", numeric_result(&left_ty, &right_ty)),
            BinaryOp::Div => ("div", numeric_result(&left_ty, &right_ty)),
            BinaryOp::Mod => ("mod", "int".to_string()),
            BinaryOp::Eq => ("cmp.eq", "bool".to_string()),
            BinaryOp::Neq => ("cmp.neq", "bool".to_string()),
            BinaryOp::Lt => ("cmp.lt", "bool".to_string()),
            BinaryOp::Lte => ("cmp.lte", "bool".to_string()),
            BinaryOp::Gt => ("cmp.gt", "bool".to_string()),
            BinaryOp::Gte => ("cmp.gte", "bool".to_string()),
            BinaryOp::And => ("and", "bool".to_string()),
            BinaryOp::Or => ("or", "bool".to_string()),
            BinaryOp::BitAnd => ("bitand", "int".to_string()),
            BinaryOp::BitOr => ("bitor", "int".to_string()),
            BinaryOp::BitXor => ("bitxor", "int".to_string()),
            BinaryOp::Shl => ("lshift", "int".to_string()),
            BinaryOp::Shr => ("rshift", "int".to_string()),
        };

        let id = self.fresh();
        self.emit(Inst::new(id, mir_op, result_ty.clone(), vec![lhs, rhs]));
        self.value_types.insert(id, result_ty.clone());
        Ok((Operand::value(id), Some(result_ty)))
    }

    /// Interpolation folds left-to-right into `strcat` calls, stringifying
    /// non-string parts with the conversion intrinsics.
    fn lower_interpolation(
        &mut self,
        parts: &[InterpPart],
    ) -> Result<(Operand, Option<String>), String> {
        let mut acc: Option<Operand> = None;
        for part in parts {
            let piece = match part {
                InterpPart::Literal { text, .. } => {
                    Operand::literal(format!("\"{}\"", text)).with_ty("string")
                }
                InterpPart::Expr(expr) => {
                    let ty = self.classify(expr);
                    let (operand, _) = self.lower_expr(expr)?;
                    match ty.as_deref() {
                        Some("string") => operand,
                        Some("float") | Some("double") => self.convert_call("float_to_string", operand),
                        Some("bool") => self.convert_call("bool_to_string", operand),
                        _ => self.convert_call("int_to_string", operand),
                    }
                }
            };
            acc = Some(match acc {
                None => piece,
                Some(prev) => {
                    let id = self.fresh();
                    self.emit(Inst::new(id, "strcat", "string", vec![prev, piece]));
                    self.value_types.insert(id, "string".to_string());
                    Operand::value(id)
                }
            });
        }
        let operand = acc.unwrap_or_else(|| Operand::literal("\"\"").with_ty("string"));
        Ok((operand, Some("string".to_string())))
    }

    fn convert_call(&mut self, name: &str, operand: Operand) -> Operand {
        let id = self.fresh();
        self.emit(Inst::new(
            id,
            "call.string",
            "string",
            vec![Operand::literal(name), operand],
        ));
        self.value_types.insert(id, "string".to_string());
        Operand::value(id)
    }

    /// Lower an expression and force it into a ValueId, materializing
    /// inline literals through `const`.
    fn lower_to_value(&mut self, expr: &Expr) -> Result<ValueId, String> {
        let (operand, ty) = self.lower_expr(expr)?;
        match operand.as_value() {
            Some(id) => Ok(id),
            None => {
                let id = self.fresh();
                let ty = ty.unwrap_or_else(|| TYPE_INFER.to_string());
                if operand.as_literal() == Some("0") && ty == "int" {
                    self.phi_ids.insert(id);
                }
                self.value_types.insert(id, ty.clone());
                self.emit(Inst::new(id, "const", ty, vec![operand]));
                Ok(id)
            }
        }
    }

    // ------------------------------------------------------------------
    // Classification (const-literal level only)
    // ------------------------------------------------------------------

    fn classify(&self, expr: &Expr) -> Option<String> {
        match expr {
            Expr::Literal { kind, .. } => Some(
                match kind {
                    LitKind::Int | LitKind::Hex | LitKind::Binary | LitKind::Char => "int",
                    LitKind::Float => "float",
                    LitKind::String => "string",
                    LitKind::Bool => "bool",
                    LitKind::Null => "ptr",
                }
                .to_string(),
            ),
            Expr::StringInterp { .. } => Some("string".to_string()),
            Expr::Identifier { name, .. } => self
                .lookup(name)
                .and_then(|info| info.ty.clone())
                .or_else(|| self.ctx.global_types.get(name).cloned()),
            Expr::Binary { op, left, right, .. } => match op {
                BinaryOp::Add => {
                    let l = self.classify(left);
                    let r = self.classify(right);
                    if l.as_deref() == Some("string") || r.as_deref() == Some("string") {
                        Some("string".to_string())
                    } else {
                        Some(numeric_result(&l, &r))
                    }
                }
                BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                    Some(numeric_result(&self.classify(left), &self.classify(right)))
                }
                BinaryOp::Mod
                | BinaryOp::BitAnd
                | BinaryOp::BitOr
                | BinaryOp::BitXor
                | BinaryOp::Shl
                | BinaryOp::Shr => Some("int".to_string()),
                _ => Some("bool".to_string()),
            },
            Expr::Unary { op, operand, .. } => match op {
                UnaryOp::Not => Some("bool".to_string()),
                _ => self.classify(operand),
            },
            Expr::Call { callee, .. } => {
                let name = callee_name(callee)?;
                self.ctx
                    .func_returns
                    .get(&name)
                    .cloned()
                    .or_else(|| intrinsic_return_type(&name).map(str::to_string))
            }
            Expr::Await { expr, .. } => self
                .classify(expr)
                .as_deref()
                .and_then(promise_payload),
            Expr::Member { target, name, .. } => self.member_type(target, name),
            Expr::Index { target, .. } => {
                self.classify(target).as_deref().and_then(element_type)
            }
            Expr::Cast { ty, .. } => Some(ty.source_text()),
            Expr::New { ty, .. } => Some(ty.source_text()),
            Expr::ArrayLiteral { elements, .. } => {
                let elem = elements
                    .first()
                    .and_then(|e| self.classify(e))
                    .unwrap_or_else(|| "int".to_string());
                Some(format!("array<{}>", elem))
            }
            Expr::MapLiteral { entries, .. } => {
                let (k, v) = entries
                    .first()
                    .map(|(k, v)| {
                        (
                            self.classify(k).unwrap_or_else(|| "string".to_string()),
                            self.classify(v).unwrap_or_else(|| "int".to_string()),
                        )
                    })
                    .unwrap_or_else(|| ("string".to_string(), "int".to_string()));
                Some(format!("map<{}, {}>", k, v))
            }
            Expr::StructLiteral { type_name, .. } => Some(type_name.source_text()),
            _ => None,
        }
    }

    fn member_type(&self, target: &Expr, field: &str) -> Option<String> {
        let target_ty = self.classify(target)?;
        let base = target_ty.trim_start_matches('*');
        let base = base.split('<').next().unwrap_or(base);
        self.ctx
            .struct_fields
            .get(base)
            .and_then(|fields| fields.get(field))
            .cloned()
    }

    fn enum_const(&self, target: &Expr, variant: &str) -> Option<i64> {
        let Expr::Identifier { name, .. } = target else {
            return None;
        };
        self.ctx
            .enum_consts
            .get(&format!("{}.{}", name, variant))
            .copied()
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    fn fresh(&mut self) -> ValueId {
        let id = ValueId(self.next_id);
        self.next_id += 1;
        id
    }

    fn next_label(&mut self) -> u32 {
        let n = self.label_counter;
        self.label_counter += 1;
        n
    }

    fn emit(&mut self, inst: Inst) {
        self.blocks[self.current].insts.push(inst);
    }

    fn emit_const_zero(&mut self) -> ValueId {
        let id = self.fresh();
        self.phi_ids.insert(id);
        self.value_types.insert(id, "int".to_string());
        self.emit(Inst::new(
            id,
            "const",
            "int",
            vec![Operand::literal("0").with_ty("int")],
        ));
        id
    }

    fn terminate(&mut self, terminator: Terminator) {
        let block = &mut self.blocks[self.current];
        if block.terminator.is_none() {
            block.terminator = Some(terminator);
        }
    }

    fn new_block(&mut self, name: String) -> usize {
        self.blocks.push(BlockInProgress {
            name,
            insts: Vec::new(),
            terminator: None,
        });
        self.blocks.len() - 1
    }

    fn bind(&mut self, name: &str, id: ValueId, ty: Option<String>) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), VarInfo { id, ty });
    }

    /// Rebind in whichever scope currently holds the name.
    fn bind_existing(&mut self, name: &str, id: ValueId, ty: Option<String>) {
        for scope in self.scopes.iter_mut().rev() {
            if let Some(info) = scope.get_mut(name) {
                info.id = id;
                if ty.is_some() {
                    info.ty = ty;
                }
                return;
            }
        }
        self.bind(name, id, ty);
    }

    fn lookup(&self, name: &str) -> Option<&VarInfo> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }
}

fn annotate(operand: Operand, ty: &Option<String>) -> Operand {
    match ty {
        Some(t) if operand.ty.is_none() => operand.with_ty(t.clone()),
        _ => operand,
    }
}

fn numeric_result(left: &Option<String>, right: &Option<String>) -> String {
    if left.as_deref() == Some("float")
        || left.as_deref() == Some("double")
        || right.as_deref() == Some("float")
        || right.as_deref() == Some("double")
    {
        "float".to_string()
    } else {
        "int".to_string()
    }
}

fn literal_operand(kind: LitKind, raw: &str) -> (String, &'static str) {
    match kind {
        LitKind::Int => (raw.to_string(), "int"),
        LitKind::Float => (raw.to_string(), "float"),
        LitKind::String => (format!("\"{}\"", raw), "string"),
        LitKind::Char => (format!("'{}'", raw), "int"),
        LitKind::Bool => ((if raw == "true" { "1" } else { "0" }).to_string(), "bool"),
        LitKind::Null => ("NULL".to_string(), "ptr"),
        LitKind::Hex | LitKind::Binary => (raw.to_string(), "int"),
    }
}

fn callee_name(callee: &Expr) -> Option<String> {
    match callee {
        Expr::Identifier { name, .. } => Some(name.clone()),
        Expr::Member { target, name, .. } => {
            callee_name(target).map(|base| format!("{}.{}", base, name))
        }
        _ => None,
    }
}

fn element_type(ty: &str) -> Option<String> {
    let ty = ty.trim();
    if let Some(rest) = ty.strip_prefix("array<").and_then(|r| r.strip_suffix('>')) {
        return Some(rest.trim().to_string());
    }
    if let Some(rest) = ty.strip_prefix("[]") {
        return Some(rest.trim_start_matches('<').trim_end_matches('>').to_string());
    }
    if let Some(rest) = ty.strip_prefix("map<").and_then(|r| r.strip_suffix('>')) {
        return rest.split(',').nth(1).map(|v| v.trim().to_string());
    }
    None
}

fn promise_payload(ty: &str) -> Option<String> {
    ty.strip_prefix("Promise<")
        .and_then(|r| r.strip_suffix('>'))
        .map(|t| t.trim().to_string())
}

/// Return types of the intrinsics the lowering itself needs to classify.
/// The backend owns the full name-mapping table.
fn intrinsic_return_type(name: &str) -> Option<&'static str> {
    let ty = match name {
        "len" | "strlen" | "string_to_int" | "abs" | "max" | "min" | "gcd" | "lcm"
        | "factorial" | "time.now_unix" | "getpid" => "int",
        "read_line" | "substring" | "trim" | "to_upper" | "to_lower" | "int_to_string"
        | "float_to_string" | "bool_to_string" | "getenv" | "read_file" => "string",
        "sqrt" | "pow" | "floor" | "ceil" | "round" | "sin" | "cos" | "tan" | "exp" | "log"
        | "string_to_float" => "float",
        "contains" | "starts_with" | "ends_with" | "string_to_bool" | "exists" | "is_file"
        | "is_dir" => "bool",
        "print" | "println" | "sleep_seconds" | "sleep_milliseconds" | "exit" | "write_file"
        | "append_file" => "void",
        _ => return None,
    };
    Some(ty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn lower(source: &str) -> MirModule {
        let module = Parser::new("test.omni", source)
            .parse()
            .expect("source should parse");
        lower_module(&module).expect("lowering should succeed")
    }

    fn find<'m>(mir: &'m MirModule, name: &str) -> &'m MirFunction {
        mir.functions
            .iter()
            .find(|f| f.name == name)
            .unwrap_or_else(|| panic!("no function '{}'", name))
    }

    #[test]
    fn test_hex_constant_materializes() {
        let mir = lower("func main(): int { return 0xFF + 1 }");
        let main = find(&mir, "main");
        let entry = &main.blocks[0];
        assert_eq!(entry.insts[0].op, "const");
        assert_eq!(entry.insts[0].operands[0].as_literal(), Some("0xFF"));
        assert_eq!(entry.insts[1].op, "add");
        assert_eq!(entry.insts[1].operands[1].as_literal(), Some("1"));
        assert_eq!(entry.terminator.op, "ret");
    }

    #[test]
    fn test_string_concat_lowering() {
        let mir = lower(r#"func main(): int { let s = "a" + "b"
 return 0 }"#);
        let main = find(&mir, "main");
        let strcat = &main.blocks[0].insts[0];
        assert_eq!(strcat.op, "strcat");
        assert_eq!(strcat.operands[0].as_literal(), Some("\"a\""));
        assert_eq!(strcat.operands[1].as_literal(), Some("\"b\""));
    }

    #[test]
    fn test_array_len_call() {
        let mir = lower("func main(): int { let a = [10, 20, 30]\n return len(a) }");
        let main = find(&mir, "main");
        let insts = &main.blocks[0].insts;
        assert_eq!(insts[0].op, "array.init");
        assert_eq!(insts[0].operands.len(), 3);
        assert_eq!(insts[1].op, "call.int");
        assert_eq!(insts[1].operands[0].as_literal(), Some("len"));
    }

    #[test]
    fn test_async_function_wraps_return_type() {
        let mir = lower("async func g(): int { return 7 }\nfunc main(): int { return await g() }");
        assert_eq!(find(&mir, "g").return_type, "Promise<int>");
        let main = find(&mir, "main");
        let insts = &main.blocks[0].insts;
        assert_eq!(insts[0].op, "call");
        assert_eq!(insts[0].ty, "Promise<int>");
        assert_eq!(insts[1].op, "await");
        assert_eq!(insts[1].ty, "int");
    }

    #[test]
    fn test_range_for_uses_phi_element() {
        let source = "struct Point { x: int }\n\
                      func show(points: array<Point>) { for p in points { print(p.x) } }";
        let mir = lower(source);
        let show = find(&mir, "show");
        let body = show
            .blocks
            .iter()
            .find(|b| b.name.starts_with("loop.body"))
            .expect("loop body block");
        let phi = body.insts.iter().find(|i| i.op == "phi").expect("phi inst");
        assert_eq!(phi.ty, "Point");
        let member = body
            .insts
            .iter()
            .find(|i| i.op == "member")
            .expect("member inst");
        assert_eq!(member.ty, "int");
    }

    #[test]
    fn test_while_loop_block_structure() {
        let mir = lower("func f(n: int) { var i = 0\n while i < n { i++ } }");
        let f = find(&mir, "f");
        let names: Vec<&str> = f.blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["entry", "loop.cond0", "loop.body0", "loop.end0"]);
        assert_eq!(f.blocks[1].terminator.op, "cbr");
    }

    #[test]
    fn test_if_else_block_structure() {
        let mir = lower("func f(x: int): int { if x > 0 { return 1 } else { return 2 } }");
        let f = find(&mir, "f");
        let names: Vec<&str> = f.blocks.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["entry", "then0", "else0", "merge0"]);
    }

    #[test]
    fn test_break_and_continue_targets() {
        let mir = lower("func f() { while true { break } }");
        let f = find(&mir, "f");
        let body = f
            .blocks
            .iter()
            .find(|b| b.name == "loop.body0")
            .expect("body block");
        assert_eq!(body.terminator.op, "jmp");
        assert_eq!(body.terminator.operands[0].as_literal(), Some("loop.end0"));
    }

    #[test]
    fn test_interpolation_folds_to_strcat() {
        let mir = lower(r#"func f(n: int): string { return "n is ${n}!" }"#);
        let f = find(&mir, "f");
        let insts = &f.blocks[0].insts;
        assert!(insts.iter().any(|i| i.op == "call.string"
            && i.operands[0].as_literal() == Some("int_to_string")));
        assert_eq!(insts.iter().filter(|i| i.op == "strcat").count(), 2);
    }

    #[test]
    fn test_lambda_lowers_to_closure_create() {
        let mir = lower("func f() { let g = x => x }");
        let f = find(&mir, "f");
        assert!(f.blocks[0].insts.iter().any(|i| i.op == "closure.create"));
    }

    #[test]
    fn test_enum_constant_inlines() {
        let mir = lower("enum Color { Red, Green }\nfunc f(): int { return Color.Green }");
        let f = find(&mir, "f");
        assert_eq!(f.blocks[0].terminator.op, "ret");
        // Green inlines as ordinal 1, materialized by the return.
        let const_inst = &f.blocks[0].insts[0];
        assert_eq!(const_inst.op, "const");
        assert_eq!(const_inst.operands[0].as_literal(), Some("1"));
    }

    #[test]
    fn test_unknown_identifier_is_an_error() {
        let module = Parser::new("t", "func f(): int { return nope }")
            .parse()
            .unwrap();
        let err = lower_module(&module).unwrap_err();
        assert!(err.contains("nope"));
    }

    #[test]
    fn test_ssa_values_defined_before_use() {
        let mir = lower(
            "func f(n: int): int { var s = 0\n for i := 0; i < n; i++ { s = s + i }\n return s }",
        );
        let f = find(&mir, "f");
        let mut defined: std::collections::HashSet<ValueId> =
            f.params.iter().map(|p| p.id).collect();
        for block in &f.blocks {
            for inst in &block.insts {
                for operand in &inst.operands {
                    if let Some(id) = operand.as_value() {
                        assert!(defined.contains(&id), "use of {} before definition", id);
                    }
                }
                if inst.id.is_valid() {
                    defined.insert(inst.id);
                }
            }
        }
    }
}
