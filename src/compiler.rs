//! # Compiler
//!
//! Single-pass Pratt parser: there is no intermediate AST, every grammar
//! production emits directly into the [`Program`] it is given. Precedence
//! climbing is driven by a static parse-rule table indexed by token kind,
//! each entry naming a prefix handler, an infix handler, and a precedence
//! level, the same shape as a hand-rolled recursive-descent parser, but
//! able to fall through to the right infix handler by table lookup instead
//! of a long `match` in the caller.
//!
//! The parse-rule table stores free functions, `fn(&mut Compiler, bool)`,
//! rather than closures, which avoids the aliasing problems of a closure
//! capturing `&mut Compiler` while also being stored inside the `Compiler`
//! it mutates.

use once_cell::sync::Lazy;

use crate::opcode::{Opcode, OperandWidth};
use crate::program::Program;
use crate::scanner::{Scanner, Token, TokenKind, TOKEN_KIND_COUNT};
use crate::value::Value;

/// Operator precedence, lowest to highest. Order matters: comparisons like
/// `precedence <= get_rule(...).precedence` rely on declaration order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    None,
    Assignment,
    Or,
    And,
    Equality,
    Comparison,
    Term,
    Factor,
    Unary,
    Call,
    Primary,
}

impl Precedence {
    /// One level tighter-binding than `self`. Used by `binary` to compile
    /// its right operand at left-associative precedence.
    fn next(self) -> Precedence {
        use Precedence::*;
        match self {
            None => Assignment,
            Assignment => Or,
            Or => And,
            And => Equality,
            Equality => Comparison,
            Comparison => Term,
            Term => Factor,
            Factor => Unary,
            Unary => Call,
            Call => Primary,
            Primary => panic!("no precedence above Primary"),
        }
    }
}

/// Any parse-rule handler. Takes the whole compiler and whether the
/// enclosing precedence level allows an assignment target.
type ParseFn = fn(&mut Compiler, bool);

#[derive(Clone, Copy)]
struct ParseRule {
    prefix: Option<ParseFn>,
    infix: Option<ParseFn>,
    precedence: Precedence,
}

const EMPTY_RULE: ParseRule = ParseRule {
    prefix: None,
    infix: None,
    precedence: Precedence::None,
};

/// Parse-rule table, built once and indexed by `TokenKind as usize`.
/// Entries not listed here keep `EMPTY_RULE` (no prefix, no infix, lowest
/// precedence); this is exactly how `MATRIX` tokens fall through to
/// "Expect expression." without any special-cased rejection.
static PARSE_RULES: Lazy<[ParseRule; TOKEN_KIND_COUNT]> = Lazy::new(|| {
    let mut rules = [EMPTY_RULE; TOKEN_KIND_COUNT];

    let mut set = |kind: TokenKind, rule: ParseRule| {
        rules[kind as usize] = rule;
    };

    set(
        TokenKind::LeftParen,
        ParseRule {
            prefix: Some(grouping),
            infix: None,
            precedence: Precedence::None,
        },
    );
    set(
        TokenKind::Minus,
        ParseRule {
            prefix: Some(unary),
            infix: Some(binary),
            precedence: Precedence::Term,
        },
    );
    set(
        TokenKind::Plus,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Term,
        },
    );
    set(
        TokenKind::Slash,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Factor,
        },
    );
    set(
        TokenKind::Star,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Factor,
        },
    );
    set(
        TokenKind::Bang,
        ParseRule {
            prefix: Some(unary),
            infix: None,
            precedence: Precedence::None,
        },
    );
    set(
        TokenKind::BangEqual,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Equality,
        },
    );
    set(
        TokenKind::EqualEqual,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Equality,
        },
    );
    set(
        TokenKind::Greater,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Comparison,
        },
    );
    set(
        TokenKind::GreaterEqual,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Comparison,
        },
    );
    set(
        TokenKind::Less,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Comparison,
        },
    );
    set(
        TokenKind::LessEqual,
        ParseRule {
            prefix: None,
            infix: Some(binary),
            precedence: Precedence::Comparison,
        },
    );
    set(
        TokenKind::Identifier,
        ParseRule {
            prefix: Some(variable),
            infix: None,
            precedence: Precedence::None,
        },
    );
    set(
        TokenKind::String,
        ParseRule {
            prefix: Some(string_literal),
            infix: None,
            precedence: Precedence::None,
        },
    );
    set(
        TokenKind::Number,
        ParseRule {
            prefix: Some(number),
            infix: None,
            precedence: Precedence::None,
        },
    );
    set(
        TokenKind::True,
        ParseRule {
            prefix: Some(literal),
            infix: None,
            precedence: Precedence::None,
        },
    );
    set(
        TokenKind::False,
        ParseRule {
            prefix: Some(literal),
            infix: None,
            precedence: Precedence::None,
        },
    );
    set(
        TokenKind::Nil,
        ParseRule {
            prefix: Some(literal),
            infix: None,
            precedence: Precedence::None,
        },
    );
    set(
        TokenKind::And,
        ParseRule {
            prefix: None,
            infix: Some(and_),
            precedence: Precedence::And,
        },
    );
    set(
        TokenKind::Or,
        ParseRule {
            prefix: None,
            infix: Some(or_),
            precedence: Precedence::Or,
        },
    );

    rules
});

fn get_rule(kind: TokenKind) -> ParseRule {
    PARSE_RULES[kind as usize]
}

/// A resolved local: name plus its declaring scope depth. `None` is the
/// `UNINITIALIZED` sentinel (spec's `scope_depth = UNINITIALIZED`),
/// forbidding `var a = a;` from resolving `a` to itself.
struct Local {
    name: String,
    depth: Option<usize>,
}

/// Instruction families with a 1/2/4-byte index operand, chosen narrowest
/// first at each emit site.
#[derive(Clone, Copy)]
enum IndexedOp {
    Constant,
    DefineGlobal,
    GetGlobal,
    SetGlobal,
    GetLocal,
    SetLocal,
}

impl IndexedOp {
    fn opcode(self, width: OperandWidth) -> Opcode {
        use IndexedOp::*;
        use OperandWidth::*;
        match (self, width) {
            (Constant, Byte) => Opcode::Constant,
            (Constant, Word16) => Opcode::ConstantW2,
            (Constant, Word32) => Opcode::ConstantW4,
            (DefineGlobal, Byte) => Opcode::DefineGlobal,
            (DefineGlobal, Word16) => Opcode::DefineGlobalW2,
            (DefineGlobal, Word32) => Opcode::DefineGlobalW4,
            (GetGlobal, Byte) => Opcode::GetGlobal,
            (GetGlobal, Word16) => Opcode::GetGlobalW2,
            (GetGlobal, Word32) => Opcode::GetGlobalW4,
            (SetGlobal, Byte) => Opcode::SetGlobal,
            (SetGlobal, Word16) => Opcode::SetGlobalW2,
            (SetGlobal, Word32) => Opcode::SetGlobalW4,
            (GetLocal, Byte) => Opcode::GetLocal,
            (GetLocal, Word16) => Opcode::GetLocalW2,
            (GetLocal, Word32) => Opcode::GetLocalW4,
            (SetLocal, Byte) => Opcode::SetLocal,
            (SetLocal, Word16) => Opcode::SetLocalW2,
            (SetLocal, Word32) => Opcode::SetLocalW4,
        }
    }
}

/// Jump families, all carrying an offset operand that is back-patched
/// (`Jump`/`JumpIfFalse`) or computed directly at the emit site
/// (`JumpBack`, whose target is always already known).
#[derive(Clone, Copy)]
enum JumpOp {
    Jump,
    JumpBack,
    JumpIfFalse,
}

impl JumpOp {
    fn opcode(self, width: OperandWidth) -> Opcode {
        use JumpOp::*;
        use OperandWidth::*;
        match (self, width) {
            (Jump, Byte) => Opcode::Jump,
            (Jump, Word16) => Opcode::JumpW2,
            (Jump, Word32) => Opcode::JumpW4,
            (JumpBack, Byte) => Opcode::JumpBack,
            (JumpBack, Word16) => Opcode::JumpBackW2,
            (JumpBack, Word32) => Opcode::JumpBackW4,
            (JumpIfFalse, Byte) => Opcode::JumpIfFalse,
            (JumpIfFalse, Word16) => Opcode::JumpIfFalseW2,
            (JumpIfFalse, Word32) => Opcode::JumpIfFalseW4,
        }
    }
}

const DUMMY_TOKEN: Token = Token {
    kind: TokenKind::Eof,
    source_offset: 0,
    length: 0,
    line: 1,
};

/// Compiler state for one `compile` call: the scanner, the lookahead
/// tokens, the program being built, and the local-variable/scope stack.
pub struct Compiler<'a> {
    scanner: Scanner<'a>,
    previous: Token,
    current: Token,
    program: Program,
    locals: Vec<Local>,
    scope_depth: usize,
    had_error: bool,
    panic_mode: bool,
}

/// Where a just-declared variable's value should end up.
enum VarTarget {
    Global(usize),
    Local,
}

impl<'a> Compiler<'a> {
    /// Compile a complete program. Returns `None` if any compile error was
    /// reported (diagnostics already went to stderr at the point of
    /// discovery, see `error_at`).
    pub fn compile(source: &'a str) -> Option<Program> {
        let mut compiler = Compiler {
            scanner: Scanner::new(source),
            previous: DUMMY_TOKEN,
            current: DUMMY_TOKEN,
            program: Program::new(),
            locals: Vec::new(),
            scope_depth: 0,
            had_error: false,
            panic_mode: false,
        };

        compiler.advance();
        while !compiler.match_token(TokenKind::Eof) {
            compiler.declaration();
        }
        compiler.emit_op(Opcode::Return);

        if compiler.had_error {
            None
        } else {
            Some(compiler.program)
        }
    }

    // ----- token stream plumbing -----

    fn advance(&mut self) {
        self.previous = self.current;
        loop {
            self.current = self.scanner.next_token();
            if self.current.kind != TokenKind::Error {
                break;
            }
            let message = format!(
                "Unexpected character '{}'.",
                self.scanner.lexeme(&self.current)
            );
            self.error_at_current(&message);
        }
    }

    fn consume(&mut self, kind: TokenKind, message: &str) {
        if self.current.kind == kind {
            self.advance();
        } else {
            self.error_at_current(message);
        }
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.current.kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        self.advance();
        true
    }

    fn error_at_current(&mut self, message: &str) {
        self.error_at(self.current, message);
    }

    fn error(&mut self, message: &str) {
        self.error_at(self.previous, message);
    }

    fn error_at(&mut self, token: Token, message: &str) {
        if self.panic_mode {
            return;
        }
        self.panic_mode = true;
        eprint!("[Line {}] Error", token.line);
        match token.kind {
            TokenKind::Eof => eprint!(" at end"),
            TokenKind::Error => {}
            _ => eprint!(" at '{}'", self.scanner.lexeme(&token)),
        }
        eprintln!(": {}", message);
        self.had_error = true;
    }

    /// Consume tokens until a likely statement boundary, clearing
    /// `panic_mode` so one bad token doesn't cascade into a wall of errors.
    fn synchronize(&mut self) {
        self.panic_mode = false;
        while self.current.kind != TokenKind::Eof {
            if self.previous.kind == TokenKind::Semicolon {
                return;
            }
            match self.current.kind {
                TokenKind::Class
                | TokenKind::Fun
                | TokenKind::Var
                | TokenKind::For
                | TokenKind::If
                | TokenKind::While
                | TokenKind::Print
                | TokenKind::Return => return,
                _ => {}
            }
            self.advance();
        }
    }

    // ----- emit helpers -----

    fn emit_op(&mut self, op: Opcode) {
        let line = self.previous.line;
        self.program.add_op(op, line);
    }

    /// Emit one of an `IndexedOp` family's three width variants, choosing
    /// the narrowest that can hold `index`.
    fn emit_indexed(&mut self, op: IndexedOp, index: usize) {
        match OperandWidth::narrowest_for(index) {
            Some(width) => {
                let opcode = op.opcode(width);
                self.emit_op(opcode);
                let line = self.previous.line;
                self.program.add_operand(width, index as u32, line);
            }
            None => self.error("Too many constants, globals, or locals for one operand."),
        }
    }

    fn emit_constant(&mut self, value: Value) {
        let index = self.program.add_constant(value);
        self.emit_indexed(IndexedOp::Constant, index);
    }

    /// Discard `n` stack slots with the minimal-encoding form: nothing for
    /// 0, `Pop`/`Pop Pop` for 1/2, `PopN(n)` otherwise.
    fn emit_pop_n(&mut self, n: usize) {
        match n {
            0 => {}
            1 => self.emit_op(Opcode::Pop),
            2 => {
                self.emit_op(Opcode::Pop);
                self.emit_op(Opcode::Pop);
            }
            _ => match OperandWidth::narrowest_for(n) {
                Some(OperandWidth::Byte) => {
                    self.emit_op(Opcode::PopN);
                    let line = self.previous.line;
                    self.program.add_operand(OperandWidth::Byte, n as u32, line);
                }
                _ => self.error("Too many locals leaving scope at once."),
            },
        }
    }

    /// Emit a forward jump with a placeholder 16-bit operand, returning the
    /// operand's byte offset for `patch_jump` to fill in later.
    fn emit_jump(&mut self, op: JumpOp) -> usize {
        let width = OperandWidth::Word16;
        let opcode = op.opcode(width);
        self.emit_op(opcode);
        let site = self.program.code.len();
        let line = self.previous.line;
        self.program.add_operand(width, 0, line);
        site
    }

    /// Back-patch a jump emitted by `emit_jump` to land just after the
    /// current position (relative to the byte immediately after the
    /// operand, per the offset convention used everywhere else).
    fn patch_jump(&mut self, site: usize) {
        let width = OperandWidth::Word16;
        let offset = self.program.code.len() - site - width.byte_len();
        if offset > width.max_value() {
            self.error("Too much code to jump over.");
            return;
        }
        self.program.patch_operand(site, width, offset as u32);
    }

    /// Emit a backward jump to `loop_start`. Unlike forward jumps, the
    /// distance is already known at the emit site, so the width is chosen
    /// directly instead of placeholder-then-patch, accounting for the fact
    /// that the offset is measured from the byte after the (not yet
    /// emitted) operand.
    fn emit_loop(&mut self, loop_start: usize) {
        for width in [
            OperandWidth::Byte,
            OperandWidth::Word16,
            OperandWidth::Word32,
        ] {
            let after_operand = self.program.code.len() + 1 + width.byte_len();
            let distance = after_operand - loop_start;
            if distance <= width.max_value() {
                let opcode = JumpOp::JumpBack.opcode(width);
                self.emit_op(opcode);
                let line = self.previous.line;
                self.program.add_operand(width, distance as u32, line);
                return;
            }
        }
        self.error("Loop body too large.");
    }

    // ----- declarations & statements -----

    fn declaration(&mut self) {
        if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.statement();
        }
        if self.panic_mode {
            self.synchronize();
        }
    }

    fn var_declaration(&mut self) {
        let target = self.parse_variable("Expect variable name.");
        if self.match_token(TokenKind::Equal) {
            self.expression();
        } else {
            self.emit_op(Opcode::Null);
        }
        self.consume(
            TokenKind::Semicolon,
            "Expect ';' after variable declaration.",
        );
        self.define_variable(target);
    }

    fn parse_variable(&mut self, message: &str) -> VarTarget {
        self.consume(TokenKind::Identifier, message);
        self.declare_variable();
        if self.scope_depth > 0 {
            return VarTarget::Local;
        }
        let name = self.scanner.lexeme(&self.previous).to_string();
        let index = self.program.add_constant(Value::String(name));
        VarTarget::Global(index)
    }

    /// Record a local in the current scope. No-op for globals
    /// (`scope_depth == 0`), which are resolved by name at runtime instead.
    fn declare_variable(&mut self) {
        if self.scope_depth == 0 {
            return;
        }
        let name = self.scanner.lexeme(&self.previous).to_string();
        for local in self.locals.iter().rev() {
            if let Some(depth) = local.depth {
                if depth < self.scope_depth {
                    break;
                }
            }
            if local.name == name {
                self.error("Already a variable with this name in this scope.");
                return;
            }
        }
        self.locals.push(Local { name, depth: None });
    }

    fn define_variable(&mut self, target: VarTarget) {
        match target {
            VarTarget::Local => self.mark_initialized(),
            VarTarget::Global(index) => self.emit_indexed(IndexedOp::DefineGlobal, index),
        }
    }

    fn mark_initialized(&mut self) {
        if let Some(local) = self.locals.last_mut() {
            local.depth = Some(self.scope_depth);
        }
    }

    fn statement(&mut self) {
        if self.match_token(TokenKind::Print) {
            self.print_statement();
        } else if self.match_token(TokenKind::If) {
            self.if_statement();
        } else if self.match_token(TokenKind::While) {
            self.while_statement();
        } else if self.match_token(TokenKind::For) {
            self.for_statement();
        } else if self.match_token(TokenKind::LeftBrace) {
            self.begin_scope();
            self.block();
            self.end_scope();
        } else {
            self.expression_statement();
        }
    }

    fn print_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after value.");
        self.emit_op(Opcode::Print);
    }

    fn expression_statement(&mut self) {
        self.expression();
        self.consume(TokenKind::Semicolon, "Expect ';' after expression.");
        self.emit_op(Opcode::Pop);
    }

    fn block(&mut self) {
        while !self.check(TokenKind::RightBrace) && !self.check(TokenKind::Eof) {
            self.declaration();
        }
        self.consume(TokenKind::RightBrace, "Expect '}' after block.");
    }

    fn begin_scope(&mut self) {
        self.scope_depth += 1;
    }

    fn end_scope(&mut self) {
        self.scope_depth -= 1;
        let mut popped = 0usize;
        while let Some(local) = self.locals.last() {
            if local.depth.map_or(false, |d| d > self.scope_depth) {
                self.locals.pop();
                popped += 1;
            } else {
                break;
            }
        }
        self.emit_pop_n(popped);
    }

    fn if_statement(&mut self) {
        self.consume(TokenKind::LeftParen, "Expect '(' after 'if'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let then_site = self.emit_jump(JumpOp::JumpIfFalse);
        self.emit_op(Opcode::Pop);
        self.statement();

        let else_site = self.emit_jump(JumpOp::Jump);
        self.patch_jump(then_site);
        self.emit_op(Opcode::Pop);

        if self.match_token(TokenKind::Else) {
            self.statement();
        }
        self.patch_jump(else_site);
    }

    fn while_statement(&mut self) {
        let loop_start = self.program.code.len();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'while'.");
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after condition.");

        let exit_site = self.emit_jump(JumpOp::JumpIfFalse);
        self.emit_op(Opcode::Pop);
        self.statement();
        self.emit_loop(loop_start);

        self.patch_jump(exit_site);
        self.emit_op(Opcode::Pop);
    }

    fn for_statement(&mut self) {
        self.begin_scope();
        self.consume(TokenKind::LeftParen, "Expect '(' after 'for'.");

        if self.match_token(TokenKind::Semicolon) {
            // No initializer.
        } else if self.match_token(TokenKind::Var) {
            self.var_declaration();
        } else {
            self.expression_statement();
        }

        let mut loop_start = self.program.code.len();

        let mut exit_site: Option<usize> = None;
        if !self.match_token(TokenKind::Semicolon) {
            self.expression();
            self.consume(TokenKind::Semicolon, "Expect ';' after loop condition.");
            exit_site = Some(self.emit_jump(JumpOp::JumpIfFalse));
            self.emit_op(Opcode::Pop);
        }

        if !self.match_token(TokenKind::RightParen) {
            let body_site = self.emit_jump(JumpOp::Jump);
            let increment_start = self.program.code.len();
            self.expression();
            self.emit_op(Opcode::Pop);
            self.consume(TokenKind::RightParen, "Expect ')' after for clauses.");

            self.emit_loop(loop_start);
            loop_start = increment_start;
            self.patch_jump(body_site);
        }

        self.statement();
        self.emit_loop(loop_start);

        if let Some(site) = exit_site {
            self.patch_jump(site);
            self.emit_op(Opcode::Pop);
        }

        self.end_scope();
    }

    // ----- expressions -----

    fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let prefix_rule = match get_rule(self.previous.kind).prefix {
            Some(rule) => rule,
            None => {
                self.error("Expect expression.");
                return;
            }
        };

        let can_assign = precedence <= Precedence::Assignment;
        prefix_rule(self, can_assign);

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            let infix_rule = get_rule(self.previous.kind)
                .infix
                .expect("precedence table only advances into tokens with an infix rule");
            infix_rule(self, can_assign);
        }

        if can_assign && self.match_token(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn named_variable(&mut self, can_assign: bool) {
        let name = self.scanner.lexeme(&self.previous).to_string();

        match self.resolve_local(&name) {
            Some(Err(())) => {
                self.error("Can't read local variable in its own initializer.");
            }
            Some(Ok(slot)) => {
                if can_assign && self.match_token(TokenKind::Equal) {
                    self.expression();
                    self.emit_indexed(IndexedOp::SetLocal, slot);
                } else {
                    self.emit_indexed(IndexedOp::GetLocal, slot);
                }
            }
            None => {
                let index = self.program.add_constant(Value::String(name));
                if can_assign && self.match_token(TokenKind::Equal) {
                    self.expression();
                    self.emit_indexed(IndexedOp::SetGlobal, index);
                } else {
                    self.emit_indexed(IndexedOp::GetGlobal, index);
                }
            }
        }
    }

    /// Scan `locals` newest-to-oldest for `name`. `Some(Err(()))` means the
    /// match is still `UNINITIALIZED` (self-reference); `Some(Ok(slot))` is
    /// a resolved local slot; `None` means "treat as global".
    fn resolve_local(&self, name: &str) -> Option<Result<usize, ()>> {
        for (index, local) in self.locals.iter().enumerate().rev() {
            if local.name == name {
                return Some(match local.depth {
                    Some(_) => Ok(index),
                    None => Err(()),
                });
            }
        }
        None
    }
}

// ----- parse-rule handlers -----
//
// Free functions rather than methods so they can be stored as plain `fn`
// pointers in `PARSE_RULES` without capturing (and thus aliasing) the
// `&mut Compiler` they're later called with.

fn grouping(compiler: &mut Compiler, _can_assign: bool) {
    compiler.expression();
    compiler.consume(TokenKind::RightParen, "Expect ')' after expression.");
}

fn number(compiler: &mut Compiler, _can_assign: bool) {
    let lexeme = compiler.scanner.lexeme(&compiler.previous);
    let value: f64 = lexeme
        .parse()
        .expect("scanner only produces well-formed numeric lexemes");
    compiler.emit_constant(Value::Number(value));
}

fn string_literal(compiler: &mut Compiler, _can_assign: bool) {
    let lexeme = compiler.scanner.lexeme(&compiler.previous);
    let text = &lexeme[1..lexeme.len() - 1];
    compiler.emit_constant(Value::String(text.to_string()));
}

fn unary(compiler: &mut Compiler, _can_assign: bool) {
    let operator = compiler.previous.kind;
    compiler.parse_precedence(Precedence::Unary);
    match operator {
        TokenKind::Minus => compiler.emit_op(Opcode::Negate),
        TokenKind::Bang => compiler.emit_op(Opcode::Not),
        _ => unreachable!("unary parse rule only registered for '-' and '!'"),
    }
}

fn binary(compiler: &mut Compiler, _can_assign: bool) {
    let operator = compiler.previous.kind;
    let rule = get_rule(operator);
    compiler.parse_precedence(rule.precedence.next());
    match operator {
        TokenKind::Plus => compiler.emit_op(Opcode::Add),
        TokenKind::Minus => compiler.emit_op(Opcode::Sub),
        TokenKind::Star => compiler.emit_op(Opcode::Mul),
        TokenKind::Slash => compiler.emit_op(Opcode::Div),
        TokenKind::EqualEqual => compiler.emit_op(Opcode::Equal),
        TokenKind::BangEqual => compiler.emit_op(Opcode::NotEqual),
        TokenKind::Greater => compiler.emit_op(Opcode::Greater),
        TokenKind::GreaterEqual => compiler.emit_op(Opcode::GreaterEqual),
        TokenKind::Less => compiler.emit_op(Opcode::Less),
        TokenKind::LessEqual => compiler.emit_op(Opcode::LessEqual),
        _ => unreachable!("binary parse rule only registered for the above operators"),
    }
}

fn literal(compiler: &mut Compiler, _can_assign: bool) {
    match compiler.previous.kind {
        TokenKind::True => compiler.emit_op(Opcode::True),
        TokenKind::False => compiler.emit_op(Opcode::False),
        TokenKind::Nil => compiler.emit_op(Opcode::Null),
        _ => unreachable!("literal parse rule only registered for true/false/nil"),
    }
}

fn variable(compiler: &mut Compiler, can_assign: bool) {
    compiler.named_variable(can_assign);
}

fn and_(compiler: &mut Compiler, _can_assign: bool) {
    let end_site = compiler.emit_jump(JumpOp::JumpIfFalse);
    compiler.emit_op(Opcode::Pop);
    compiler.parse_precedence(Precedence::And);
    compiler.patch_jump(end_site);
}

fn or_(compiler: &mut Compiler, _can_assign: bool) {
    let else_site = compiler.emit_jump(JumpOp::JumpIfFalse);
    let end_site = compiler.emit_jump(JumpOp::Jump);
    compiler.patch_jump(else_site);
    compiler.emit_op(Opcode::Pop);
    compiler.parse_precedence(Precedence::Or);
    compiler.patch_jump(end_site);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile_ok(source: &str) -> Program {
        Compiler::compile(source).expect("expected source to compile")
    }

    #[test]
    fn arithmetic_precedence_emits_left_to_right() {
        let program = compile_ok("print 1 + 2 * 3;");
        assert!(program.code.contains(&(Opcode::Mul as u8)));
        assert!(program.code.contains(&(Opcode::Add as u8)));
        assert!(program.code.contains(&(Opcode::Print as u8)));
    }

    #[test]
    fn global_roundtrip() {
        let program = compile_ok("var x = 1; print x;");
        assert!(program.code.contains(&(Opcode::DefineGlobal as u8)));
        assert!(program.code.contains(&(Opcode::GetGlobal as u8)));
    }

    #[test]
    fn local_uses_get_local_not_global() {
        let program = compile_ok("{ var x = 1; print x; }");
        assert!(program.code.contains(&(Opcode::GetLocal as u8)));
        assert!(!program.code.contains(&(Opcode::DefineGlobal as u8)));
    }

    #[test]
    fn self_referential_initializer_is_a_compile_error() {
        assert!(Compiler::compile("{ var a = a; }").is_none());
    }

    #[test]
    fn redeclaration_in_same_scope_is_an_error() {
        assert!(Compiler::compile("{ var a = 1; var a = 2; }").is_none());
    }

    #[test]
    fn shadowing_in_nested_scope_is_allowed() {
        assert!(Compiler::compile("{ var a = 1; { var a = 2; print a; } print a; }").is_some());
    }

    #[test]
    fn block_end_emits_minimal_pop_encoding() {
        let one_local = compile_ok("{ var a = 1; }");
        assert!(one_local.code.ends_with(&[Opcode::Pop as u8, Opcode::Return as u8]));

        let three_locals = compile_ok("{ var a = 1; var b = 2; var c = 3; }");
        let tail = &three_locals.code[three_locals.code.len() - 3..];
        assert_eq!(tail[0], Opcode::PopN as u8);
        assert_eq!(tail[1], 3);
        assert_eq!(tail[2], Opcode::Return as u8);
    }

    #[test]
    fn while_loop_backpatches_a_backward_jump() {
        let program = compile_ok("var i = 0; while (i < 3) { i = i + 1; }");
        assert!(program.code.contains(&(Opcode::JumpBackW2 as u8)));
        assert!(program.code.contains(&(Opcode::JumpIfFalseW2 as u8)));
    }

    #[test]
    fn logical_and_or_short_circuit_with_jumps() {
        let program = compile_ok("print true and false or true;");
        assert!(program.code.contains(&(Opcode::JumpIfFalseW2 as u8)));
        assert!(program.code.contains(&(Opcode::JumpW2 as u8)));
    }

    #[test]
    fn unexpected_token_reports_error_and_does_not_panic() {
        assert!(Compiler::compile("var ;").is_none());
    }

    #[test]
    fn invalid_assignment_target_is_an_error() {
        assert!(Compiler::compile("1 + 2 = 3;").is_none());
    }

    #[test]
    fn matrix_literal_syntax_is_rejected() {
        // Matrix literals have no surface syntax in this implementation
        // (the matrix value type itself is out of scope); bracket syntax
        // simply fails to scan/parse rather than being specially rejected.
        assert!(Compiler::compile("print [[1,2],[3,4]];").is_none());
    }

    #[test]
    fn wide_global_form_used_past_the_byte_threshold() {
        let mut source = String::new();
        for i in 0..300 {
            source.push_str(&format!("var g{} = {};\n", i, i));
        }
        let program = compile_ok(&source);
        assert!(program.code.contains(&(Opcode::DefineGlobalW2 as u8)));
    }
}
