//! Deterministic AST printer.
//!
//! Produces the indented text form compared against `.ast` golden files.
//! Two-space indent per level; opening `{`/`[` on the header line; the
//! closing delimiter on its own line at the originating indent. Output is
//! byte-stable across runs and platforms: the only place source order is
//! not followed is map literals, whose entries are ordered by the source
//! column of their key span. Malformed node shapes print `<unknown …>`
//! rather than panicking.

use crate::ast::{
    Block, CatchClause, Decl, Expr, ForStmt, FuncBody, FuncDecl, InterpPart, Module, Param, Stmt,
};

/// Render a module in the golden `.ast` format.
pub fn print_module(module: &Module) -> String {
    let mut printer = Printer::new();
    printer.module(module);
    printer.out
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Printer {
            out: String::new(),
            indent: 0,
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    /// Emit `header {`, run `body`, emit the closing delimiter.
    fn block(&mut self, header: &str, close: &str, body: impl FnOnce(&mut Self)) {
        self.line(header);
        self.indent += 1;
        body(self);
        self.indent -= 1;
        self.line(close);
    }

    // ------------------------------------------------------------------
    // Module and declarations
    // ------------------------------------------------------------------

    fn module(&mut self, module: &Module) {
        self.block("module {", "}", |p| {
            for import in &module.imports {
                match &import.alias {
                    Some(alias) => p.line(&format!("import {} as {}", import.dotted(), alias)),
                    None => p.line(&format!("import {}", import.dotted())),
                }
            }
            for decl in &module.decls {
                p.decl(decl);
            }
        });
    }

    fn decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Let(b) | Decl::Var(b) => {
                let kw = if matches!(decl, Decl::Let(_)) { "let" } else { "var" };
                let mut head = format!("{} {}", kw, b.name);
                if let Some(ty) = &b.ty {
                    head.push_str(&format!(": {}", ty.source_text()));
                }
                match &b.value {
                    Some(value) => {
                        self.block(&format!("{} = {{", head), "}", |p| p.expr(value));
                    }
                    None => self.line(&head),
                }
            }
            Decl::Struct(s) => {
                let head = format!("struct {}{} {{", s.name, type_params(&s.type_params));
                self.block(&head, "}", |p| {
                    for field in &s.fields {
                        p.line(&format!("{}: {}", field.name, field.ty.source_text()));
                    }
                });
            }
            Decl::Enum(e) => {
                self.block(&format!("enum {} {{", e.name), "}", |p| {
                    for variant in &e.variants {
                        p.line(variant);
                    }
                });
            }
            Decl::Func(f) => self.func(f),
            Decl::TypeAlias(t) => {
                self.line(&format!(
                    "type {}{} = {}",
                    t.name,
                    type_params(&t.type_params),
                    t.ty.source_text()
                ));
            }
        }
    }

    fn func(&mut self, f: &FuncDecl) {
        let mut head = String::new();
        if f.is_async {
            head.push_str("async ");
        }
        head.push_str("func ");
        head.push_str(&f.name);
        head.push_str(&type_params(&f.type_params));
        head.push('(');
        head.push_str(&params(&f.params));
        head.push(')');
        if let Some(ret) = &f.return_type {
            head.push_str(&format!(": {}", ret.source_text()));
        }
        match &f.body {
            FuncBody::Block(block) => {
                self.block(&format!("{} {{", head), "}", |p| p.stmts(block));
            }
            FuncBody::Expr(expr) => {
                self.block(&format!("{} => {{", head), "}", |p| p.expr(expr));
            }
        }
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn stmts(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(block) => self.block("block {", "}", |p| p.stmts(block)),
            Stmt::Return { value: None, .. } => self.line("return"),
            Stmt::Return {
                value: Some(value), ..
            } => self.block("return {", "}", |p| p.expr(value)),
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::If {
                cond,
                then_block,
                else_branch,
                ..
            } => {
                self.block("if {", "}", |p| {
                    p.block("cond {", "}", |p| p.expr(cond));
                    p.block("then {", "}", |p| p.stmts(then_block));
                    if let Some(else_branch) = else_branch {
                        p.block("else {", "}", |p| p.stmt(else_branch));
                    }
                });
            }
            Stmt::While { cond, body, .. } => {
                self.block("while {", "}", |p| {
                    p.block("cond {", "}", |p| p.expr(cond));
                    p.block("body {", "}", |p| p.stmts(body));
                });
            }
            Stmt::For(f) => self.for_stmt(f),
            Stmt::Break { .. } => self.line("break"),
            Stmt::Continue { .. } => self.line("continue"),
            Stmt::Try {
                body,
                catches,
                finally,
                ..
            } => {
                self.block("try {", "}", |p| {
                    p.block("body {", "}", |p| p.stmts(body));
                    for catch in catches {
                        p.catch(catch);
                    }
                    if let Some(finally) = finally {
                        p.block("finally {", "}", |p| p.stmts(finally));
                    }
                });
            }
            Stmt::Throw { value, .. } => self.block("throw {", "}", |p| p.expr(value)),
            Stmt::Binding {
                mutable,
                name,
                ty,
                value,
                ..
            } => {
                let kw = if *mutable { "var" } else { "let" };
                let mut head = format!("{} {}", kw, name);
                if let Some(ty) = ty {
                    head.push_str(&format!(": {}", ty.source_text()));
                }
                match value {
                    Some(value) => self.block(&format!("{} = {{", head), "}", |p| p.expr(value)),
                    None => self.line(&head),
                }
            }
            Stmt::ShortVarDecl { name, value, .. } => {
                self.block(&format!("shortvar {} = {{", name), "}", |p| p.expr(value));
            }
            Stmt::Assignment { target, value, .. } => {
                self.block("assign {", "}", |p| {
                    p.expr(target);
                    p.expr(value);
                });
            }
            Stmt::Increment { target, op, .. } => {
                self.block(&format!("increment {} {{", op.as_str()), "}", |p| {
                    p.expr(target)
                });
            }
        }
    }

    fn for_stmt(&mut self, f: &ForStmt) {
        if f.is_range {
            let (target, iterable) = match (&f.target, &f.iterable) {
                (Some(t), Some(i)) => (t, i),
                _ => {
                    self.line("<unknown for>");
                    return;
                }
            };
            self.block(&format!("for range {} {{", target), "}", |p| {
                p.block("in {", "}", |p| p.expr(iterable));
                p.block("body {", "}", |p| p.stmts(&f.body));
            });
        } else {
            if f.target.is_some() || f.iterable.is_some() {
                self.line("<unknown for>");
                return;
            }
            self.block("for classic {", "}", |p| {
                if let Some(init) = &f.init {
                    p.block("init {", "}", |p| p.stmt(init));
                }
                if let Some(cond) = &f.condition {
                    p.block("cond {", "}", |p| p.expr(cond));
                }
                if let Some(post) = &f.post {
                    p.block("post {", "}", |p| p.stmt(post));
                }
                p.block("body {", "}", |p| p.stmts(&f.body));
            });
        }
    }

    fn catch(&mut self, catch: &CatchClause) {
        let head = match (&catch.binder, &catch.binder_type) {
            (Some(name), Some(ty)) => format!("catch {}: {} {{", name, ty.source_text()),
            (Some(name), None) => format!("catch {} {{", name),
            _ => "catch {".to_string(),
        };
        self.block(&head, "}", |p| p.stmts(&catch.body));
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Identifier { name, .. } => self.line(&format!("ident {}", name)),
            Expr::Literal { kind, raw, .. } => {
                self.line(&format!("lit {} \"{}\"", kind.name(), raw));
            }
            Expr::StringInterp { parts, .. } => {
                self.block("interp {", "}", |p| {
                    for part in parts {
                        match part {
                            InterpPart::Literal { text, .. } => {
                                p.line(&format!("text \"{}\"", text));
                            }
                            InterpPart::Expr(expr) => p.block("expr {", "}", |p| p.expr(expr)),
                        }
                    }
                });
            }
            Expr::Unary { op, operand, .. } => {
                self.block(&format!("unary {} {{", op.as_str()), "}", |p| p.expr(operand));
            }
            Expr::Binary {
                op, left, right, ..
            } => {
                self.block(&format!("binary {} {{", op.as_str()), "}", |p| {
                    p.expr(left);
                    p.expr(right);
                });
            }
            Expr::Call { callee, args, .. } => {
                self.block("call {", "}", |p| {
                    p.expr(callee);
                    for arg in args {
                        p.expr(arg);
                    }
                });
            }
            Expr::Index { target, index, .. } => {
                self.block("index {", "}", |p| {
                    p.expr(target);
                    p.expr(index);
                });
            }
            Expr::Member { target, name, .. } => {
                self.block(&format!("member {} {{", name), "}", |p| p.expr(target));
            }
            Expr::ArrayLiteral { elements, .. } => {
                self.block("array [", "]", |p| {
                    for element in elements {
                        p.expr(element);
                    }
                });
            }
            Expr::MapLiteral { entries, .. } => {
                // Stable order independent of source entry order: ascending
                // source column of the key span.
                let mut ordered: Vec<&(Expr, Expr)> = entries.iter().collect();
                ordered.sort_by_key(|(key, _)| key.span().start.column);
                self.block("map [", "]", |p| {
                    for (key, value) in ordered {
                        p.block("entry {", "}", |p| {
                            p.expr(key);
                            p.expr(value);
                        });
                    }
                });
            }
            Expr::StructLiteral {
                type_name, fields, ..
            } => {
                self.block(
                    &format!("structlit {} {{", type_name.source_text()),
                    "}",
                    |p| {
                        for (name, value) in fields {
                            p.block(&format!("field {} {{", name), "}", |p| p.expr(value));
                        }
                    },
                );
            }
            Expr::Assignment { target, value, .. } => {
                self.block("assign {", "}", |p| {
                    p.expr(target);
                    p.expr(value);
                });
            }
            Expr::Increment { target, op, .. } => {
                self.block(&format!("increment {} {{", op.as_str()), "}", |p| {
                    p.expr(target)
                });
            }
            Expr::New { ty, .. } => self.line(&format!("new {}", ty.source_text())),
            Expr::Delete { target, .. } => self.block("delete {", "}", |p| p.expr(target)),
            Expr::Lambda { params: ps, body, .. } => {
                self.block(&format!("lambda ({}) {{", params(ps)), "}", |p| p.expr(body));
            }
            Expr::Cast { ty, expr, .. } => {
                self.block(&format!("cast {} {{", ty.source_text()), "}", |p| {
                    p.expr(expr)
                });
            }
            Expr::Await { expr, .. } => self.block("await {", "}", |p| p.expr(expr)),
        }
    }
}

fn type_params(names: &[String]) -> String {
    if names.is_empty() {
        String::new()
    } else {
        format!("<{}>", names.join(", "))
    }
}

fn params(params: &[Param]) -> String {
    let rendered: Vec<String> = params
        .iter()
        .map(|p| match &p.ty {
            Some(ty) => format!("{}: {}", p.name, ty.source_text()),
            None => p.name.clone(),
        })
        .collect();
    rendered.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::Parser;

    fn print(source: &str) -> String {
        let module = Parser::new("test.omni", source)
            .parse()
            .expect("source should parse");
        print_module(&module)
    }

    #[test]
    fn test_print_is_deterministic() {
        let source = "func main(): int { return 1 }";
        assert_eq!(print(source), print(source));
    }

    #[test]
    fn test_imports_and_func() {
        let out = print("import std.io\nfunc main(): int { return 0 }");
        assert_eq!(
            out,
            "module {\n  import std.io\n  func main(): int {\n    return {\n      lit int \"0\"\n    }\n  }\n}\n"
        );
    }

    #[test]
    fn test_map_entries_sorted_by_key_column() {
        // Keys deliberately written so later entries start at earlier
        // columns; the printer orders by key span column, not source order.
        let out = print("let m = {\n      \"zz\": 1,\n  \"aa\": 2,\n}");
        let zz = out.find("\"zz\"").unwrap();
        let aa = out.find("\"aa\"").unwrap();
        assert!(aa < zz, "entry with the smaller key column prints first:\n{}", out);
    }

    #[test]
    fn test_closing_delimiters_on_own_line() {
        let out = print("func f() { if true { return } }");
        for line in out.lines() {
            let trimmed = line.trim();
            if trimmed == "}" || trimmed == "]" {
                assert_eq!(line.trim_start_matches(' ').len(), 1);
            }
        }
    }
}
