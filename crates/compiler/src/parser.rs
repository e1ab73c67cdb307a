//! Recursive-descent parser for OmniLang.
//!
//! The parser materializes the token stream up front and walks it with a
//! cursor, which makes the two speculative spots cheap: the lambda-head
//! check after `(`, and the generic-type-literal check after a qualified
//! name (commit only when the `>` closes without hitting `||`, `&&`,
//! `==`, `!=`, or a statement terminator).
//!
//! Errors are single-shot: the first syntax error aborts the parse and is
//! returned as a [`Diagnostic`] whose message names the offending token
//! kind by its stable name, so tests can assert on substrings like
//! `OR_OR` or `RBRACE`.

use crate::ast::{
    Block, CatchClause, Decl, EnumDecl, Expr, FieldDecl, ForStmt, FuncBody, FuncDecl,
    GlobalBinding, Import, IncOp, InterpPart, LitKind, Module, Param, Stmt, StructDecl,
    TypeAliasDecl, TypeExpr, UnaryOp,
};
use crate::ast::BinaryOp;
use crate::diag::{Diagnostic, Position, Span};
use crate::lexer::Lexer;
use crate::token::{Token, TokenKind};

pub struct Parser {
    file: String,
    tokens: Vec<Token>,
    /// Source lines for diagnostic excerpts.
    lines: Vec<String>,
    pos: usize,
    lex_error: Option<Diagnostic>,
    /// Type-parameter scopes for marking `TypeExpr::Generic` references.
    type_param_scopes: Vec<Vec<String>>,
    /// Cleared while parsing `if`/`while`/`for` headers so `name {` is the
    /// statement's block, not a struct literal.
    allow_struct_literal: bool,
}

impl Parser {
    pub fn new(file: impl Into<String>, source: &str) -> Self {
        let file = file.into();
        let mut lexer = Lexer::new(file.clone(), source);
        let (mut tokens, lex_error) = lexer.lex_all();
        if tokens.last().map(|t| t.kind) != Some(TokenKind::Eof) {
            let at = tokens
                .last()
                .map(|t| t.span.end)
                .unwrap_or_else(|| Position::new(1, 1));
            tokens.push(Token::new(TokenKind::Eof, "", Span::at(at)));
        }
        let lines = source
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .split('\n')
            .map(str::to_string)
            .collect();
        Parser {
            file,
            tokens,
            lines,
            pos: 0,
            lex_error,
            type_param_scopes: Vec::new(),
            allow_struct_literal: true,
        }
    }

    /// Parse a whole module. Any lex error surfaces here before parsing.
    pub fn parse(&mut self) -> Result<Module, Diagnostic> {
        if let Some(diag) = self.lex_error.take() {
            return Err(diag);
        }
        let start = self.peek().span;
        let mut imports = Vec::new();
        while self.check(TokenKind::Import) {
            imports.push(self.parse_import()?);
        }
        let mut decls = Vec::new();
        while !self.check(TokenKind::Eof) {
            decls.push(self.parse_decl()?);
        }
        let end = self.peek().span;
        Ok(Module {
            imports,
            decls,
            span: start.to(end),
        })
    }

    /// Parse a single expression followed by end of input. Used for the
    /// `${…}` fragments of interpolated strings.
    pub fn parse_standalone_expr(&mut self) -> Result<Expr, Diagnostic> {
        if let Some(diag) = self.lex_error.take() {
            return Err(diag);
        }
        let expr = self.parse_expr()?;
        if !self.check(TokenKind::Eof) {
            return Err(self.unexpected("end of interpolated expression"));
        }
        Ok(expr)
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_import(&mut self) -> Result<Import, Diagnostic> {
        let start = self.expect(TokenKind::Import, "'import'")?.span;
        let mut path = vec![self.expect(TokenKind::Ident, "module name")?.lexeme];
        while self.eat(TokenKind::Dot).is_some() {
            path.push(self.expect(TokenKind::Ident, "module name segment")?.lexeme);
        }
        let mut end = self.previous_span();
        let alias = if self.eat(TokenKind::As).is_some() {
            let alias = self.expect(TokenKind::Ident, "import alias")?;
            end = alias.span;
            Some(alias.lexeme)
        } else {
            None
        };
        Ok(Import {
            path,
            alias,
            span: start.to(end),
        })
    }

    fn parse_decl(&mut self) -> Result<Decl, Diagnostic> {
        match self.peek().kind {
            TokenKind::Let => Ok(Decl::Let(self.parse_global_binding(TokenKind::Let)?)),
            TokenKind::Var => Ok(Decl::Var(self.parse_global_binding(TokenKind::Var)?)),
            TokenKind::Func => Ok(Decl::Func(self.parse_func(false)?)),
            TokenKind::Async => {
                let start = self.advance().span;
                let mut func = self.parse_func(true)?;
                func.span = start.to(func.span);
                Ok(Decl::Func(func))
            }
            TokenKind::Struct => Ok(Decl::Struct(self.parse_struct()?)),
            TokenKind::Enum => Ok(Decl::Enum(self.parse_enum()?)),
            TokenKind::Type => Ok(Decl::TypeAlias(self.parse_type_alias()?)),
            _ => Err(self.unexpected("a top-level declaration")),
        }
    }

    fn parse_global_binding(&mut self, kw: TokenKind) -> Result<GlobalBinding, Diagnostic> {
        let start = self.expect(kw, "binding keyword")?.span;
        let name = self.expect(TokenKind::Ident, "binding name")?;
        let ty = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };
        let value = if self.eat(TokenKind::Assign).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let end = self.previous_span();
        Ok(GlobalBinding {
            name: name.lexeme,
            ty,
            value,
            span: start.to(end),
        })
    }

    fn parse_func(&mut self, is_async: bool) -> Result<FuncDecl, Diagnostic> {
        let start = self.expect(TokenKind::Func, "'func'")?.span;
        let name = self.expect(TokenKind::Ident, "function name")?;
        let type_params = self.parse_type_params()?;
        self.type_param_scopes.push(type_params.clone());

        let result = (|| {
            self.expect(TokenKind::LParen, "'('")?;
            let mut params = Vec::new();
            while !self.check(TokenKind::RParen) {
                let pname = self.expect(TokenKind::Ident, "parameter name")?;
                let pty = if self.eat(TokenKind::Colon).is_some() {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                let pspan = pname.span.to(self.previous_span());
                params.push(Param {
                    name: pname.lexeme,
                    ty: pty,
                    span: pspan,
                });
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')'")?;

            let return_type = if self.eat(TokenKind::Colon).is_some() {
                Some(self.parse_type()?)
            } else {
                None
            };

            let body = if self.eat(TokenKind::FatArrow).is_some() {
                FuncBody::Expr(self.parse_expr()?)
            } else {
                FuncBody::Block(self.parse_block()?)
            };
            Ok((params, return_type, body))
        })();
        self.type_param_scopes.pop();
        let (params, return_type, body) = result?;

        let end = self.previous_span();
        Ok(FuncDecl {
            name: name.lexeme,
            type_params,
            params,
            return_type,
            body,
            is_async,
            span: start.to(end),
        })
    }

    fn parse_struct(&mut self) -> Result<StructDecl, Diagnostic> {
        let start = self.expect(TokenKind::Struct, "'struct'")?.span;
        let name = self.expect(TokenKind::Ident, "struct name")?;
        let type_params = self.parse_type_params()?;
        self.type_param_scopes.push(type_params.clone());

        let result = (|| {
            self.expect(TokenKind::LBrace, "'{'")?;
            let mut fields = Vec::new();
            while !self.check(TokenKind::RBrace) {
                let fname = self.expect(TokenKind::Ident, "field name")?;
                self.expect(TokenKind::Colon, "':' after field name")?;
                let fty = self.parse_type()?;
                let fspan = fname.span.to(fty.span());
                fields.push(FieldDecl {
                    name: fname.lexeme,
                    ty: fty,
                    span: fspan,
                });
                // Field separators are optional: `;` or `,`.
                if self.eat(TokenKind::Semicolon).is_none() {
                    self.eat(TokenKind::Comma);
                }
            }
            self.expect(TokenKind::RBrace, "'}'")?;
            Ok(fields)
        })();
        self.type_param_scopes.pop();
        let fields = result?;

        let end = self.previous_span();
        Ok(StructDecl {
            name: name.lexeme,
            type_params,
            fields,
            span: start.to(end),
        })
    }

    fn parse_enum(&mut self) -> Result<EnumDecl, Diagnostic> {
        let start = self.expect(TokenKind::Enum, "'enum'")?.span;
        let name = self.expect(TokenKind::Ident, "enum name")?;
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut variants = Vec::new();
        while !self.check(TokenKind::RBrace) {
            variants.push(self.expect(TokenKind::Ident, "enum variant")?.lexeme);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.expect(TokenKind::RBrace, "'}'")?.span;
        Ok(EnumDecl {
            name: name.lexeme,
            variants,
            span: start.to(end),
        })
    }

    fn parse_type_alias(&mut self) -> Result<TypeAliasDecl, Diagnostic> {
        let start = self.expect(TokenKind::Type, "'type'")?.span;
        let name = self.expect(TokenKind::Ident, "type alias name")?;
        let type_params = self.parse_type_params()?;
        self.type_param_scopes.push(type_params.clone());
        let result = (|| {
            self.expect(TokenKind::Assign, "'='")?;
            self.parse_type()
        })();
        self.type_param_scopes.pop();
        let ty = result?;
        let span = start.to(ty.span());
        Ok(TypeAliasDecl {
            name: name.lexeme,
            type_params,
            ty,
            span,
        })
    }

    fn parse_type_params(&mut self) -> Result<Vec<String>, Diagnostic> {
        let mut names = Vec::new();
        if self.eat(TokenKind::Less).is_some() {
            loop {
                names.push(self.expect(TokenKind::Ident, "type parameter")?.lexeme);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect_close_angle()?;
        }
        Ok(names)
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn parse_type(&mut self) -> Result<TypeExpr, Diagnostic> {
        let first = self.parse_optional_type()?;
        if !self.check(TokenKind::Pipe) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(TokenKind::Pipe).is_some() {
            members.push(self.parse_optional_type()?);
        }
        let span = members[0].span().to(members.last().unwrap().span());
        Ok(TypeExpr::Union { members, span })
    }

    fn parse_optional_type(&mut self) -> Result<TypeExpr, Diagnostic> {
        let inner = self.parse_postfix_type()?;
        if let Some(q) = self.eat(TokenKind::Question) {
            let span = inner.span().to(q.span);
            return Ok(TypeExpr::Optional {
                inner: Box::new(inner),
                span,
            });
        }
        Ok(inner)
    }

    fn parse_postfix_type(&mut self) -> Result<TypeExpr, Diagnostic> {
        if let Some(star) = self.eat(TokenKind::Star) {
            let inner = self.parse_postfix_type()?;
            let span = star.span.to(inner.span());
            return Ok(TypeExpr::Pointer {
                inner: Box::new(inner),
                span,
            });
        }
        self.parse_named_type()
    }

    fn parse_named_type(&mut self) -> Result<TypeExpr, Diagnostic> {
        // Function type: "(" (type ("," type)*)? ")" "->" type
        if let Some(open) = self.eat(TokenKind::LParen) {
            let mut params = Vec::new();
            while !self.check(TokenKind::RParen) {
                params.push(self.parse_type()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            self.expect(TokenKind::RParen, "')'")?;
            self.expect(TokenKind::Arrow, "'->' in function type")?;
            let ret = self.parse_type()?;
            let span = open.span.to(ret.span());
            return Ok(TypeExpr::Function {
                params,
                ret: Box::new(ret),
                span,
            });
        }

        // Array shorthand: []T
        if let Some(open) = self.eat(TokenKind::LBracket) {
            self.expect(TokenKind::RBracket, "']' in array type")?;
            let element = self.parse_postfix_type()?;
            let span = open.span.to(element.span());
            return Ok(TypeExpr::Named {
                name: "array".to_string(),
                args: vec![element],
                span,
            });
        }

        let first = self.expect_type_name()?;
        let mut name = first.lexeme.clone();
        let start = first.span;
        let mut end = first.span;
        let mut qualified = false;
        while self.check(TokenKind::Dot) {
            self.advance();
            let segment = self.expect(TokenKind::Ident, "type name segment")?;
            name.push('.');
            name.push_str(&segment.lexeme);
            end = segment.span;
            qualified = true;
        }

        // In type position `<` always opens a type-argument list.
        let mut args = Vec::new();
        if self.eat(TokenKind::Less).is_some() {
            loop {
                args.push(self.parse_type()?);
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            end = self.expect_close_angle()?;
        }

        let span = start.to(end);
        if !qualified && args.is_empty() && self.is_type_param(&name) {
            return Ok(TypeExpr::Generic { name, span });
        }
        Ok(TypeExpr::Named { name, args, span })
    }

    /// A type name is an identifier; the collection keywords are plain
    /// identifiers, but `optional` is a keyword that may also head a type.
    fn expect_type_name(&mut self) -> Result<Token, Diagnostic> {
        if self.check(TokenKind::Ident) || self.check(TokenKind::Optional) {
            return Ok(self.advance());
        }
        Err(self.unexpected("a type"))
    }

    /// Consume a `>` closing a type-argument list. A `>>` token is split
    /// in place so nested generics like `Box<Box<int>>` close correctly.
    fn expect_close_angle(&mut self) -> Result<Span, Diagnostic> {
        if let Some(tok) = self.eat(TokenKind::Greater) {
            return Ok(tok.span);
        }
        if self.check(TokenKind::RShift) {
            let tok = self.tokens[self.pos].clone();
            let mid = Position::new(tok.span.start.line, tok.span.start.column + 1);
            self.tokens[self.pos] =
                Token::new(TokenKind::Greater, ">", Span::new(mid, tok.span.end));
            return Ok(Span::new(tok.span.start, mid));
        }
        Err(self.unexpected("'>' to close type arguments"))
    }

    fn is_type_param(&self, name: &str) -> bool {
        self.type_param_scopes
            .iter()
            .any(|scope| scope.iter().any(|p| p == name))
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_block(&mut self) -> Result<Block, Diagnostic> {
        let start = self.expect(TokenKind::LBrace, "'{'")?.span;
        let mut stmts = Vec::new();
        while !self.check(TokenKind::RBrace) {
            if self.check(TokenKind::Eof) {
                return Err(self.unexpected("'}' to close block"));
            }
            stmts.push(self.parse_stmt()?);
            // Statement separators are optional.
            self.eat(TokenKind::Semicolon);
        }
        let end = self.expect(TokenKind::RBrace, "'}'")?.span;
        Ok(Block {
            stmts,
            span: start.to(end),
        })
    }

    fn parse_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        match self.peek().kind {
            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::Return => self.parse_return(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Try => self.parse_try(),
            TokenKind::Throw => {
                let start = self.advance().span;
                let value = self.parse_expr()?;
                let span = start.to(value.span());
                Ok(Stmt::Throw { value, span })
            }
            TokenKind::Break => {
                let span = self.advance().span;
                Ok(Stmt::Break { span })
            }
            TokenKind::Continue => {
                let span = self.advance().span;
                Ok(Stmt::Continue { span })
            }
            TokenKind::Let => self.parse_binding(false),
            TokenKind::Var => self.parse_binding(true),
            _ => self.parse_simple_stmt(),
        }
    }

    /// `return` with no value when the next token cannot start one: `}`,
    /// `;`, end of input, or a token on a later line.
    fn parse_return(&mut self) -> Result<Stmt, Diagnostic> {
        let ret = self.expect(TokenKind::Return, "'return'")?;
        let next = self.peek();
        let ends_statement = matches!(
            next.kind,
            TokenKind::RBrace | TokenKind::Semicolon | TokenKind::Eof
        ) || next.span.start.line > ret.span.start.line;
        if ends_statement {
            return Ok(Stmt::Return {
                value: None,
                span: ret.span,
            });
        }
        let value = self.parse_expr()?;
        let span = ret.span.to(value.span());
        Ok(Stmt::Return {
            value: Some(value),
            span,
        })
    }

    fn parse_if(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.expect(TokenKind::If, "'if'")?.span;
        let cond = self.parse_header_expr()?;
        let then_block = self.parse_block()?;
        let mut end = then_block.span;
        let else_branch = if self.eat(TokenKind::Else).is_some() {
            let branch = if self.check(TokenKind::If) {
                self.parse_if()?
            } else {
                Stmt::Block(self.parse_block()?)
            };
            end = branch.span();
            Some(Box::new(branch))
        } else {
            None
        };
        Ok(Stmt::If {
            cond,
            then_block,
            else_branch,
            span: start.to(end),
        })
    }

    fn parse_while(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.expect(TokenKind::While, "'while'")?.span;
        let cond = self.parse_header_expr()?;
        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(Stmt::While { cond, body, span })
    }

    /// After `for`, peek decides between range form (`x in xs { … }`) and
    /// classic form (`init?; cond?; post? { … }`).
    fn parse_for(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.expect(TokenKind::For, "'for'")?.span;

        if self.check(TokenKind::Ident) && self.peek_at(1).kind == TokenKind::In {
            let target = self.advance().lexeme;
            self.advance(); // 'in'
            let iterable = self.parse_header_expr()?;
            let body = self.parse_block()?;
            let span = start.to(body.span);
            return Ok(Stmt::For(ForStmt::range(target, iterable, body, span)));
        }

        let was_allowed = self.allow_struct_literal;
        self.allow_struct_literal = false;
        let result = (|| {
            let init = if self.check(TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_simple_stmt()?)
            };
            self.expect(TokenKind::Semicolon, "';' after for-loop init")?;
            let condition = if self.check(TokenKind::Semicolon) {
                None
            } else {
                Some(self.parse_expr()?)
            };
            self.expect(TokenKind::Semicolon, "';' after for-loop condition")?;
            let post = if self.check(TokenKind::LBrace) {
                None
            } else {
                Some(self.parse_simple_stmt()?)
            };
            Ok((init, condition, post))
        })();
        self.allow_struct_literal = was_allowed;
        let (init, condition, post) = result?;

        let body = self.parse_block()?;
        let span = start.to(body.span);
        Ok(Stmt::For(ForStmt::classic(init, condition, post, body, span)))
    }

    fn parse_try(&mut self) -> Result<Stmt, Diagnostic> {
        let start = self.expect(TokenKind::Try, "'try'")?.span;
        let body = self.parse_block()?;
        let mut end = body.span;

        let mut catches = Vec::new();
        while self.check(TokenKind::Catch) {
            let cstart = self.advance().span;
            let (binder, binder_type) = if self.eat(TokenKind::LParen).is_some() {
                let name = self.expect(TokenKind::Ident, "catch binder")?.lexeme;
                let ty = if self.eat(TokenKind::Colon).is_some() {
                    Some(self.parse_type()?)
                } else {
                    None
                };
                self.expect(TokenKind::RParen, "')'")?;
                (Some(name), ty)
            } else {
                (None, None)
            };
            let cbody = self.parse_block()?;
            let cspan = cstart.to(cbody.span);
            end = cbody.span;
            catches.push(CatchClause {
                binder,
                binder_type,
                body: cbody,
                span: cspan,
            });
        }

        let finally = if self.eat(TokenKind::Finally).is_some() {
            let fblock = self.parse_block()?;
            end = fblock.span;
            Some(fblock)
        } else {
            None
        };

        Ok(Stmt::Try {
            body,
            catches,
            finally,
            span: start.to(end),
        })
    }

    fn parse_binding(&mut self, mutable: bool) -> Result<Stmt, Diagnostic> {
        let start = self.advance().span; // let / var
        let name = self.expect(TokenKind::Ident, "binding name")?.lexeme;
        let ty = if self.eat(TokenKind::Colon).is_some() {
            Some(self.parse_type()?)
        } else {
            None
        };
        let value = if self.eat(TokenKind::Assign).is_some() {
            Some(self.parse_expr()?)
        } else {
            None
        };
        let span = start.to(self.previous_span());
        Ok(Stmt::Binding {
            mutable,
            name,
            ty,
            value,
            span,
        })
    }

    /// Short var decl, assignment, increment, or a bare expression.
    fn parse_simple_stmt(&mut self) -> Result<Stmt, Diagnostic> {
        if self.check(TokenKind::Ident)
            && self.peek_at(1).kind == TokenKind::Colon
            && self.peek_at(2).kind == TokenKind::Assign
        {
            let name = self.advance();
            self.advance(); // ':'
            self.advance(); // '='
            let value = self.parse_expr()?;
            let span = name.span.to(value.span());
            return Ok(Stmt::ShortVarDecl {
                name: name.lexeme,
                value,
                span,
            });
        }

        let expr = self.parse_expr()?;
        if self.eat(TokenKind::Assign).is_some() {
            let value = self.parse_expr()?;
            let span = expr.span().to(value.span());
            return Ok(Stmt::Assignment {
                target: expr,
                value,
                span,
            });
        }
        match expr {
            Expr::Increment { target, op, span } => Ok(Stmt::Increment {
                target: *target,
                op,
                span,
            }),
            other => Ok(Stmt::Expr(other)),
        }
    }

    /// Parse the controlling expression of an `if`/`while`/`for` header,
    /// with struct literals disabled so the body `{` terminates it.
    fn parse_header_expr(&mut self) -> Result<Expr, Diagnostic> {
        let was_allowed = self.allow_struct_literal;
        self.allow_struct_literal = false;
        let result = self.parse_expr();
        self.allow_struct_literal = was_allowed;
        result
    }

    // ------------------------------------------------------------------
    // Expressions (precedence climbing)
    // ------------------------------------------------------------------

    pub(crate) fn parse_expr(&mut self) -> Result<Expr, Diagnostic> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_and()?;
        while self.eat(TokenKind::OrOr).is_some() {
            let right = self.parse_and()?;
            left = binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_bitor()?;
        while self.eat(TokenKind::AndAnd).is_some() {
            let right = self.parse_bitor()?;
            left = binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_bitor(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_bitxor()?;
        while self.eat(TokenKind::Pipe).is_some() {
            let right = self.parse_bitxor()?;
            left = binary(BinaryOp::BitOr, left, right);
        }
        Ok(left)
    }

    fn parse_bitxor(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_bitand()?;
        while self.eat(TokenKind::Caret).is_some() {
            let right = self.parse_bitand()?;
            left = binary(BinaryOp::BitXor, left, right);
        }
        Ok(left)
    }

    fn parse_bitand(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_equality()?;
        while self.eat(TokenKind::Ampersand).is_some() {
            let right = self.parse_equality()?;
            left = binary(BinaryOp::BitAnd, left, right);
        }
        Ok(left)
    }

    fn parse_equality(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_comparison()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Eq,
                TokenKind::BangEqual => BinaryOp::Neq,
                _ => break,
            };
            self.advance();
            let right = self.parse_comparison()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_comparison(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_shift()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Less => BinaryOp::Lt,
                TokenKind::LessEqual => BinaryOp::Lte,
                TokenKind::Greater => BinaryOp::Gt,
                TokenKind::GreaterEqual => BinaryOp::Gte,
                _ => break,
            };
            self.advance();
            let right = self.parse_shift()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::LShift => BinaryOp::Shl,
                TokenKind::RShift => BinaryOp::Shr,
                _ => break,
            };
            self.advance();
            let right = self.parse_additive()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr, Diagnostic> {
        let mut left = self.parse_cast()?;
        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Mod,
                _ => break,
            };
            self.advance();
            let right = self.parse_cast()?;
            left = binary(op, left, right);
        }
        Ok(left)
    }

    /// `expr as Type` — postfix cast, binding tighter than arithmetic.
    fn parse_cast(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_unary()?;
        while self.eat(TokenKind::As).is_some() {
            let ty = self.parse_type()?;
            let span = expr.span().to(ty.span());
            expr = Expr::Cast {
                ty,
                expr: Box::new(expr),
                span,
            };
        }
        Ok(expr)
    }

    fn parse_unary(&mut self) -> Result<Expr, Diagnostic> {
        let op = match self.peek().kind {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Bang => Some(UnaryOp::Not),
            TokenKind::Tilde => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            let start = self.advance().span;
            let operand = self.parse_unary()?;
            let span = start.to(operand.span());
            return Ok(Expr::Unary {
                op,
                operand: Box::new(operand),
                span,
            });
        }

        match self.peek().kind {
            TokenKind::Await => {
                let start = self.advance().span;
                let expr = self.parse_unary()?;
                let span = start.to(expr.span());
                Ok(Expr::Await {
                    expr: Box::new(expr),
                    span,
                })
            }
            TokenKind::New => {
                let start = self.advance().span;
                let ty = self.parse_type()?;
                let span = start.to(ty.span());
                Ok(Expr::New { ty, span })
            }
            TokenKind::Delete => {
                let start = self.advance().span;
                let target = self.parse_unary()?;
                let span = start.to(target.span());
                Ok(Expr::Delete {
                    target: Box::new(target),
                    span,
                })
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> Result<Expr, Diagnostic> {
        let mut expr = self.parse_primary()?;
        loop {
            match self.peek().kind {
                TokenKind::LParen => {
                    self.advance();
                    let mut args = Vec::new();
                    while !self.check(TokenKind::RParen) {
                        args.push(self.parse_expr()?);
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                    let end = self.expect(TokenKind::RParen, "')'")?.span;
                    let span = expr.span().to(end);
                    expr = Expr::Call {
                        callee: Box::new(expr),
                        args,
                        span,
                    };
                }
                TokenKind::LBracket => {
                    self.advance();
                    let index = self.parse_expr()?;
                    let end = self.expect(TokenKind::RBracket, "']'")?.span;
                    let span = expr.span().to(end);
                    expr = Expr::Index {
                        target: Box::new(expr),
                        index: Box::new(index),
                        span,
                    };
                }
                TokenKind::Dot => {
                    self.advance();
                    let name = self.expect(TokenKind::Ident, "member name")?;
                    let span = expr.span().to(name.span);
                    expr = Expr::Member {
                        target: Box::new(expr),
                        name: name.lexeme,
                        span,
                    };
                }
                TokenKind::PlusPlus | TokenKind::MinusMinus => {
                    let op = if self.peek().kind == TokenKind::PlusPlus {
                        IncOp::Inc
                    } else {
                        IncOp::Dec
                    };
                    let end = self.advance().span;
                    let span = expr.span().to(end);
                    expr = Expr::Increment {
                        target: Box::new(expr),
                        op,
                        span,
                    };
                }
                TokenKind::LBrace if self.allow_struct_literal => {
                    let Some(name) = qualified_name(&expr) else {
                        break;
                    };
                    expr = self.parse_struct_literal_body(name, expr.span(), Vec::new())?;
                }
                TokenKind::Less => {
                    // Possible generic type literal: `Name<Args>{ … }`.
                    // Commit only when the angle brackets close cleanly and
                    // a struct-literal brace follows; otherwise `<` is a
                    // comparison and the main loop handles it.
                    let Some(name) = qualified_name(&expr) else {
                        break;
                    };
                    if !self.allow_struct_literal || !self.generic_literal_ahead() {
                        break;
                    }
                    self.advance(); // '<'
                    let mut args = Vec::new();
                    loop {
                        args.push(self.parse_type()?);
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                    }
                    self.expect_close_angle()?;
                    expr = self.parse_struct_literal_body(name, expr.span(), args)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// Speculatively scan past a `<`-opened argument list. Returns true
    /// when it closes with `>` followed by `{`, without meeting one of the
    /// operators or terminators that prove this is a comparison.
    fn generic_literal_ahead(&self) -> bool {
        let mut depth = 0usize;
        let mut i = self.pos;
        loop {
            let kind = self.tokens[i.min(self.tokens.len() - 1)].kind;
            match kind {
                TokenKind::Less => depth += 1,
                TokenKind::Greater => {
                    depth -= 1;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .is_some_and(|t| t.kind == TokenKind::LBrace);
                    }
                }
                TokenKind::RShift => {
                    if depth < 2 {
                        return false;
                    }
                    depth -= 2;
                    if depth == 0 {
                        return self
                            .tokens
                            .get(i + 1)
                            .is_some_and(|t| t.kind == TokenKind::LBrace);
                    }
                }
                TokenKind::OrOr
                | TokenKind::AndAnd
                | TokenKind::EqualEqual
                | TokenKind::BangEqual
                | TokenKind::Semicolon
                | TokenKind::LBrace
                | TokenKind::RBrace
                | TokenKind::Eof => return false,
                _ => {}
            }
            i += 1;
        }
    }

    fn parse_struct_literal_body(
        &mut self,
        name: String,
        start: Span,
        args: Vec<TypeExpr>,
    ) -> Result<Expr, Diagnostic> {
        self.expect(TokenKind::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let fname = self.expect(TokenKind::Ident, "field name")?.lexeme;
            self.expect(TokenKind::Colon, "':' after field name")?;
            let value = self.parse_expr()?;
            fields.push((fname, value));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.expect(TokenKind::RBrace, "'}'")?.span;
        let span = start.to(end);
        let type_span = start.to(self.previous_span());
        Ok(Expr::StructLiteral {
            type_name: TypeExpr::Named {
                name,
                args,
                span: type_span,
            },
            fields,
            span,
        })
    }

    fn parse_primary(&mut self) -> Result<Expr, Diagnostic> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Int => self.literal(LitKind::Int),
            TokenKind::Float => self.literal(LitKind::Float),
            TokenKind::Hex => self.literal(LitKind::Hex),
            TokenKind::Binary => self.literal(LitKind::Binary),
            TokenKind::String => self.literal(LitKind::String),
            TokenKind::Char => self.literal(LitKind::Char),
            TokenKind::True | TokenKind::False => {
                self.advance();
                Ok(Expr::Literal {
                    kind: LitKind::Bool,
                    raw: token.lexeme,
                    span: token.span,
                })
            }
            TokenKind::Null => {
                self.advance();
                Ok(Expr::Literal {
                    kind: LitKind::Null,
                    raw: token.lexeme,
                    span: token.span,
                })
            }
            TokenKind::StringInterp => {
                self.advance();
                self.parse_interpolation(&token)
            }
            TokenKind::Ident => {
                // Single-parameter lambda: `x => expr`.
                if self.peek_at(1).kind == TokenKind::FatArrow {
                    let name = self.advance();
                    self.advance(); // '=>'
                    let body = self.parse_expr()?;
                    let span = name.span.to(body.span());
                    return Ok(Expr::Lambda {
                        params: vec![Param {
                            name: name.lexeme,
                            ty: None,
                            span: name.span,
                        }],
                        body: Box::new(body),
                        span,
                    });
                }
                self.advance();
                Ok(Expr::Identifier {
                    name: token.lexeme,
                    span: token.span,
                })
            }
            TokenKind::LParen => self.parse_paren_or_lambda(),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_map_literal(),
            _ => Err(self.unexpected("an expression")),
        }
    }

    fn literal(&mut self, kind: LitKind) -> Result<Expr, Diagnostic> {
        let token = self.advance();
        Ok(Expr::Literal {
            kind,
            raw: token.lexeme,
            span: token.span,
        })
    }

    /// `(…)` is either a lambda head or a parenthesized expression; try
    /// the lambda shape first and rewind when it does not pan out.
    fn parse_paren_or_lambda(&mut self) -> Result<Expr, Diagnostic> {
        let saved = self.pos;
        let open = self.advance(); // '('

        let mut params = Vec::new();
        let mut is_lambda = true;
        while !self.check(TokenKind::RParen) {
            if !self.check(TokenKind::Ident) {
                is_lambda = false;
                break;
            }
            let pname = self.advance();
            let pty = if self.eat(TokenKind::Colon).is_some() {
                match self.parse_type() {
                    Ok(ty) => Some(ty),
                    Err(_) => {
                        is_lambda = false;
                        break;
                    }
                }
            } else {
                None
            };
            let pspan = pname.span.to(self.previous_span());
            params.push(Param {
                name: pname.lexeme,
                ty: pty,
                span: pspan,
            });
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        if is_lambda
            && self.check(TokenKind::RParen)
            && self.peek_at(1).kind == TokenKind::FatArrow
        {
            self.advance(); // ')'
            self.advance(); // '=>'
            let body = self.parse_expr()?;
            let span = open.span.to(body.span());
            return Ok(Expr::Lambda {
                params,
                body: Box::new(body),
                span,
            });
        }

        // Not a lambda: rewind and parse a parenthesized expression, which
        // may carry an assignment (`(x = 1)`).
        self.pos = saved;
        self.advance(); // '('
        let inner = self.parse_expr()?;
        let inner = if self.eat(TokenKind::Assign).is_some() {
            let value = self.parse_expr()?;
            let span = inner.span().to(value.span());
            Expr::Assignment {
                target: Box::new(inner),
                value: Box::new(value),
                span,
            }
        } else {
            inner
        };
        self.expect(TokenKind::RParen, "')'")?;
        Ok(inner)
    }

    fn parse_array_literal(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.expect(TokenKind::LBracket, "'['")?.span;
        let mut elements = Vec::new();
        while !self.check(TokenKind::RBracket) {
            elements.push(self.parse_expr()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.expect(TokenKind::RBracket, "']'")?.span;
        Ok(Expr::ArrayLiteral {
            elements,
            span: start.to(end),
        })
    }

    fn parse_map_literal(&mut self) -> Result<Expr, Diagnostic> {
        let start = self.expect(TokenKind::LBrace, "'{'")?.span;
        let mut entries = Vec::new();
        while !self.check(TokenKind::RBrace) {
            let key = self.parse_expr()?;
            self.expect(TokenKind::Colon, "':' after map key")?;
            let value = self.parse_expr()?;
            entries.push((key, value));
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let end = self.expect(TokenKind::RBrace, "'}'")?.span;
        Ok(Expr::MapLiteral {
            entries,
            span: start.to(end),
        })
    }

    /// Re-scan a STRING_INTERP lexeme, parsing each `${…}` fragment with
    /// an isolated sub-parser and keeping literal chunks as written.
    fn parse_interpolation(&mut self, token: &Token) -> Result<Expr, Diagnostic> {
        let mut parts = Vec::new();
        let chars: Vec<char> = token.lexeme.chars().collect();
        let mut chunk = String::new();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '$' && chars.get(i + 1) == Some(&'{') {
                if !chunk.is_empty() {
                    parts.push(InterpPart::Literal {
                        text: std::mem::take(&mut chunk),
                        span: token.span,
                    });
                }
                i += 2;
                let fragment = extract_braced(&chars, &mut i);
                let mut sub = Parser::new(self.file.clone(), &fragment);
                let expr = sub.parse_standalone_expr().map_err(|mut diag| {
                    // Point the fragment's error at the interpolation token.
                    diag.span = token.span;
                    diag.caret_column = token.span.start.column;
                    diag.source_line = self.source_line(token.span.start.line);
                    diag.file = self.file.clone();
                    diag
                })?;
                parts.push(InterpPart::Expr(expr));
            } else {
                chunk.push(chars[i]);
                i += 1;
            }
        }
        if !chunk.is_empty() {
            parts.push(InterpPart::Literal {
                text: chunk,
                span: token.span,
            });
        }
        Ok(Expr::StringInterp {
            parts,
            span: token.span,
        })
    }

    // ------------------------------------------------------------------
    // Cursor helpers
    // ------------------------------------------------------------------

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_at(&self, n: usize) -> &Token {
        &self.tokens[(self.pos + n).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, Diagnostic> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.pos.saturating_sub(1)].span
    }

    fn source_line(&self, line: u32) -> String {
        self.lines
            .get((line - 1) as usize)
            .cloned()
            .unwrap_or_default()
    }

    fn unexpected(&self, expected: &str) -> Diagnostic {
        let token = self.peek();
        Diagnostic::error(
            self.file.clone(),
            "parse",
            format!(
                "unexpected token {}, expected {}",
                token.kind.name(),
                expected
            ),
            token.span,
            self.source_line(token.span.start.line),
        )
    }
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span().to(right.span());
    Expr::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
        span,
    }
}

/// The dotted name of a pure identifier/member chain, if the expression
/// is one (`pkg.sub.T`).
fn qualified_name(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Identifier { name, .. } => Some(name.clone()),
        Expr::Member { target, name, .. } => {
            qualified_name(target).map(|base| format!("{}.{}", base, name))
        }
        _ => None,
    }
}

/// Copy chars up to the `}` balancing an already-consumed `${`, honoring
/// nested braces and quoted strings.
fn extract_braced(chars: &[char], i: &mut usize) -> String {
    let mut out = String::new();
    let mut depth = 1usize;
    while *i < chars.len() {
        let c = chars[*i];
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    *i += 1;
                    return out;
                }
            }
            '"' | '\'' => {
                let quote = c;
                out.push(c);
                *i += 1;
                while *i < chars.len() {
                    let inner = chars[*i];
                    out.push(inner);
                    *i += 1;
                    if inner == '\\' {
                        if *i < chars.len() {
                            out.push(chars[*i]);
                            *i += 1;
                        }
                        continue;
                    }
                    if inner == quote {
                        break;
                    }
                }
                continue;
            }
            _ => {}
        }
        out.push(c);
        *i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Module {
        Parser::new("test.omni", source)
            .parse()
            .unwrap_or_else(|e| panic!("parse failed: {}", e))
    }

    fn parse_err(source: &str) -> Diagnostic {
        Parser::new("test.omni", source)
            .parse()
            .expect_err("expected a parse error")
    }

    #[test]
    fn test_imports() {
        let module = parse("import std.io\nimport net.http as web\nfunc main() {}");
        assert_eq!(module.imports.len(), 2);
        assert_eq!(module.imports[0].dotted(), "std.io");
        assert_eq!(module.imports[1].alias.as_deref(), Some("web"));
    }

    #[test]
    fn test_func_expr_body_and_async() {
        let module = parse("async func g(): int => 7");
        let Decl::Func(f) = &module.decls[0] else {
            panic!("expected func");
        };
        assert!(f.is_async);
        assert!(matches!(f.body, FuncBody::Expr(_)));
    }

    #[test]
    fn test_for_range_form() {
        let module = parse("func f(xs: []int) { for x in xs { print(x) } }");
        let Decl::Func(f) = &module.decls[0] else {
            panic!()
        };
        let FuncBody::Block(body) = &f.body else { panic!() };
        let Stmt::For(for_stmt) = &body.stmts[0] else {
            panic!("expected for, got {:?}", body.stmts[0])
        };
        assert!(for_stmt.is_range);
        assert_eq!(for_stmt.target.as_deref(), Some("x"));
        assert!(for_stmt.iterable.is_some());
        assert!(for_stmt.init.is_none());
    }

    #[test]
    fn test_for_classic_form() {
        let module = parse("func f(n: int) { for i := 0; i < n; i++ { } }");
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        let Stmt::For(for_stmt) = &body.stmts[0] else { panic!() };
        assert!(!for_stmt.is_range);
        assert!(matches!(
            for_stmt.init.as_deref(),
            Some(Stmt::ShortVarDecl { .. })
        ));
        assert!(for_stmt.condition.is_some());
        assert!(matches!(
            for_stmt.post.as_deref(),
            Some(Stmt::Increment { op: IncOp::Inc, .. })
        ));
    }

    #[test]
    fn test_classic_for_with_assignment_init() {
        let module = parse("func f(n: int) { var i = 0 for i = 0; i < n; i++ { } }");
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        let Stmt::For(for_stmt) = &body.stmts[1] else { panic!() };
        assert!(matches!(
            for_stmt.init.as_deref(),
            Some(Stmt::Assignment { .. })
        ));
    }

    #[test]
    fn test_return_without_value() {
        let module = parse("func f() { return }");
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        assert!(matches!(body.stmts[0], Stmt::Return { value: None, .. }));
    }

    #[test]
    fn test_return_value_must_start_on_same_line() {
        let module = parse("func f(): int {\n  return\n  1\n}");
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        assert!(matches!(body.stmts[0], Stmt::Return { value: None, .. }));
        assert!(matches!(body.stmts[1], Stmt::Expr(_)));
    }

    #[test]
    fn test_struct_literal_with_qualified_name() {
        let module = parse("func f() { let p = pkg.T{ a: 1 } }");
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        let Stmt::Binding { value: Some(value), .. } = &body.stmts[0] else {
            panic!()
        };
        let Expr::StructLiteral { type_name, fields, .. } = value else {
            panic!("expected struct literal, got {:?}", value)
        };
        assert_eq!(type_name.source_text(), "pkg.T");
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_no_struct_literal_in_if_header() {
        let module = parse("func f(x: int) { if x { return } }");
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        assert!(matches!(body.stmts[0], Stmt::If { .. }));
    }

    #[test]
    fn test_generic_struct_literal_commits() {
        let module = parse("func f() { let b = Box<int>{ value: 1 } }");
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        let Stmt::Binding { value: Some(value), .. } = &body.stmts[0] else { panic!() };
        let Expr::StructLiteral { type_name, .. } = value else {
            panic!("expected struct literal, got {:?}", value)
        };
        assert_eq!(type_name.source_text(), "Box<int>");
    }

    #[test]
    fn test_less_than_stays_a_comparison() {
        let module = parse("func f(a: int, b: int): bool { return a < b }");
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        let Stmt::Return { value: Some(value), .. } = &body.stmts[0] else { panic!() };
        assert!(matches!(
            value,
            Expr::Binary { op: BinaryOp::Lt, .. }
        ));
    }

    #[test]
    fn test_generic_type_args_reject_or_or() {
        let err = parse_err("func f(x: Foo<Bar || Baz>) { }");
        assert!(err.message.contains("OR_OR"), "message: {}", err.message);
    }

    #[test]
    fn test_else_after_decl_is_unexpected() {
        let err = parse_err("func f() { return 1 } else {}");
        assert!(err.message.contains("unexpected"));
        assert!(err.message.contains("ELSE"));
    }

    #[test]
    fn test_try_catch_finally() {
        let module = parse(
            "func f() { try { g() } catch (e: net.Error) { } catch { } finally { } }",
        );
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        let Stmt::Try { catches, finally, .. } = &body.stmts[0] else { panic!() };
        assert_eq!(catches.len(), 2);
        assert_eq!(catches[0].binder.as_deref(), Some("e"));
        assert_eq!(
            catches[0].binder_type.as_ref().map(|t| t.source_text()),
            Some("net.Error".to_string())
        );
        assert!(catches[1].binder.is_none());
        assert!(finally.is_some());
    }

    #[test]
    fn test_interpolation_parses_fragments() {
        let module = parse(r#"func f(n: int) { let s = "n is ${n + 1}!" }"#);
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        let Stmt::Binding { value: Some(value), .. } = &body.stmts[0] else { panic!() };
        let Expr::StringInterp { parts, .. } = value else {
            panic!("expected interpolation, got {:?}", value)
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(&parts[0], InterpPart::Literal { text, .. } if text == "n is "));
        assert!(matches!(&parts[1], InterpPart::Expr(Expr::Binary { .. })));
        assert!(matches!(&parts[2], InterpPart::Literal { text, .. } if text == "!"));
    }

    #[test]
    fn test_trailing_commas() {
        parse("func f(a: int, b: int,) { g(1, 2,) let xs = [1, 2,] let m = {1: 2,} }");
    }

    #[test]
    fn test_map_literal() {
        let module = parse(r#"let m = { "a": 1, "b": 2 }"#);
        let Decl::Let(b) = &module.decls[0] else { panic!() };
        let Some(Expr::MapLiteral { entries, .. }) = &b.value else { panic!() };
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_lambda_forms() {
        let module = parse("let f = (a: int, b: int) => a + b\nlet g = x => x");
        let Decl::Let(first) = &module.decls[0] else { panic!() };
        assert!(matches!(first.value, Some(Expr::Lambda { .. })));
        let Decl::Let(second) = &module.decls[1] else { panic!() };
        assert!(matches!(second.value, Some(Expr::Lambda { .. })));
    }

    #[test]
    fn test_cast_new_delete_await() {
        let module = parse(
            "async func f(p: *Point) { let x = g() as int\n let q = new Point\n delete p\n let r = await h() }",
        );
        let Decl::Func(f) = &module.decls[0] else { panic!() };
        let FuncBody::Block(body) = &f.body else { panic!() };
        assert_eq!(body.stmts.len(), 4);
    }

    #[test]
    fn test_union_and_pointer_and_function_types() {
        let module = parse("type Handler = (int, string) -> bool\ntype Ref = *int?\ntype U = int | string");
        assert_eq!(module.decls.len(), 3);
        let Decl::TypeAlias(h) = &module.decls[0] else { panic!() };
        assert_eq!(h.ty.source_text(), "(int, string) -> bool");
        let Decl::TypeAlias(r) = &module.decls[1] else { panic!() };
        assert_eq!(r.ty.source_text(), "*int?");
        let Decl::TypeAlias(u) = &module.decls[2] else { panic!() };
        assert_eq!(u.ty.source_text(), "int | string");
    }

    #[test]
    fn test_generic_marking_in_scope() {
        let module = parse("struct Box<T> { value: T }");
        let Decl::Struct(s) = &module.decls[0] else { panic!() };
        assert!(matches!(s.fields[0].ty, TypeExpr::Generic { .. }));
    }

    #[test]
    fn test_lex_error_surfaces_from_parse() {
        let err = parse_err("func f() { let s = \"oops }");
        assert!(err.message.contains("unterminated"));
    }

    #[test]
    fn test_enum_decl() {
        let module = parse("enum Color { Red, Green, Blue }");
        let Decl::Enum(e) = &module.decls[0] else { panic!() };
        assert_eq!(e.variants, vec!["Red", "Green", "Blue"]);
    }
}
