//! RcDoc-based SMT-LIB serializer with termcolor annotations for [`Program`].
//!
//! Role
//! - Convert a program into an annotated document: the fixed prelude, then sort
//!   declarations, function declarations, constant declarations, function definitions and
//!   assertions, one command per line.
//! - Render plain text for the solver and colored text for terminals from the same document.
//!
//! Layout
//! - Every application is `(head arg...)`; when it does not fit the width, its arguments go
//!   on their own lines indented by two columns. Layout only depends on the program and the
//!   width, so identical programs always produce identical text.
//! - `Real` and `String` sorts have no counterpart in the target dialect and are rejected.

use std::io::{self, Write};

use log::debug;
use pretty::{FmtWrite, RcDoc, RenderAnnotated};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::{
    decl::{DeclId, Declaration},
    error::{TermError, TermResult},
    expr::{BinaryOp, Expression},
    program::Program,
    sort::Sort,
};

/// Commands emitted before any declaration.
pub const PRELUDE: &str = "(set-logic ALL)\n\
(set-option :produce-models true)\n\
(set-option :finite-model-find true)\n\
(set-option :sets-ext true)\n";

/// Layout width used by [`print`].
pub const DEFAULT_WIDTH: usize = 100;

/// Styles used to annotate parts of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Parentheses are colored by nesting depth so matching pairs share a color.
    Paren(u8),
    Keyword,  // declare-fun, assert, forall, as
    Operator, // member, join, =, and
    Ident,    // declared names and bound variables
    Sort,
    Literal, // numerals, true/false, emptyset
    Comment,
}

impl Style {
    fn to_color_spec(self) -> ColorSpec {
        let mut s = ColorSpec::new();
        match self {
            Style::Paren(depth) => {
                let fg = match depth % 6 {
                    0 => Color::Blue,
                    1 => Color::Green,
                    2 => Color::White,
                    3 => Color::Yellow,
                    4 => Color::Red,
                    _ => Color::Magenta,
                };
                s.set_fg(Some(fg)).set_dimmed(true);
            }
            Style::Keyword => {
                s.set_fg(Some(Color::Cyan)).set_bold(true);
            }
            Style::Operator => {
                s.set_fg(Some(Color::Yellow)).set_bold(true);
            }
            Style::Ident => {
                s.set_fg(Some(Color::Green));
            }
            Style::Sort => {
                s.set_fg(Some(Color::Magenta));
            }
            Style::Literal => {
                s.set_fg(Some(Color::Red));
            }
            Style::Comment => {
                s.set_dimmed(true).set_italic(true);
            }
        }
        s
    }
}

fn styled(style: Style, s: impl std::fmt::Display) -> RcDoc<'static, Style> {
    RcDoc::as_string(s).annotate(style)
}

#[inline]
fn lparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string("(").annotate(Style::Paren(depth))
}

#[inline]
fn rparen(depth: u8) -> RcDoc<'static, Style> {
    RcDoc::as_string(")").annotate(Style::Paren(depth))
}

fn kw(s: &'static str) -> RcDoc<'static, Style> {
    styled(Style::Keyword, s)
}

fn op(s: impl std::fmt::Display) -> RcDoc<'static, Style> {
    styled(Style::Operator, s)
}

fn literal(s: impl std::fmt::Display) -> RcDoc<'static, Style> {
    styled(Style::Literal, s)
}

/// `(head args...)`, breaking the arguments onto indented lines when too wide.
fn sexpr(
    head: RcDoc<'static, Style>,
    args: Vec<RcDoc<'static, Style>>,
    depth: u8,
) -> RcDoc<'static, Style> {
    if args.is_empty() {
        return lparen(depth).append(head).append(rparen(depth));
    }
    lparen(depth)
        .append(head)
        .append(
            RcDoc::line()
                .append(RcDoc::intersperse(args, RcDoc::line()))
                .nest(2),
        )
        .append(rparen(depth))
        .group()
}

/// `(a b c)` without a head; `()` when empty.
fn list(items: Vec<RcDoc<'static, Style>>, depth: u8) -> RcDoc<'static, Style> {
    lparen(depth)
        .append(RcDoc::intersperse(items, RcDoc::line()).nest(1))
        .append(rparen(depth))
        .group()
}

const RESERVED: &[&str] = &[
    "_", "!", "as", "let", "exists", "forall", "match", "par", "BINARY", "DECIMAL", "HEXADECIMAL",
    "NUMERAL", "STRING",
];

fn is_symbol_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "~!@$%^&*_-+=<>.?/".contains(c)
}

/// Renders `name` as an SMT-LIB symbol, quoting it when it is not a simple symbol.
pub fn symbol(name: &str) -> TermResult<String> {
    let simple = name.chars().next().is_some_and(|c| !c.is_ascii_digit())
        && name.chars().all(is_symbol_char)
        && !RESERVED.contains(&name);
    if simple {
        return Ok(name.to_string());
    }
    if name.contains(['|', '\\']) {
        return Err(TermError::malformed(
            "symbol",
            format!("`{name}` cannot be written as an SMT-LIB symbol"),
        ));
    }
    Ok(format!("|{name}|"))
}

fn ident(name: &str) -> TermResult<RcDoc<'static, Style>> {
    Ok(styled(Style::Ident, symbol(name)?))
}

struct DocBuilder<'p> {
    program: &'p Program,
}

impl<'p> DocBuilder<'p> {
    fn sort(&self, sort: &Sort, depth: u8) -> TermResult<RcDoc<'static, Style>> {
        Ok(match sort {
            Sort::Uninterpreted(name) => styled(Style::Sort, symbol(name)?),
            Sort::Set(element) => sexpr(
                styled(Style::Sort, "Set"),
                vec![self.sort(element, depth + 1)?],
                depth,
            ),
            Sort::Tuple(columns) => {
                if columns.is_empty() {
                    return Err(TermError::malformed("Tuple", "empty tuple sort"));
                }
                let columns = columns
                    .iter()
                    .map(|c| self.sort(c, depth + 1))
                    .collect::<TermResult<Vec<_>>>()?;
                sexpr(styled(Style::Sort, "Tuple"), columns, depth)
            }
            Sort::Int => styled(Style::Sort, "Int"),
            Sort::Bool => styled(Style::Sort, "Bool"),
            Sort::Real => return Err(TermError::unsupported("Real sort")),
            Sort::String => return Err(TermError::unsupported("String sort")),
        })
    }

    fn sorts(&self, sorts: &[Sort], depth: u8) -> TermResult<RcDoc<'static, Style>> {
        let docs = sorts
            .iter()
            .map(|s| self.sort(s, depth + 1))
            .collect::<TermResult<Vec<_>>>()?;
        Ok(list(docs, depth))
    }

    /// `((x S) (y T))`
    fn bindings(&self, vars: &[DeclId], depth: u8) -> TermResult<RcDoc<'static, Style>> {
        let docs = vars
            .iter()
            .map(|id| match self.program.decl(*id) {
                Declaration::BoundVariable { name, sort } => Ok(sexpr(
                    ident(name)?,
                    vec![self.sort(sort, depth + 2)?],
                    depth + 1,
                )),
                other => Err(TermError::malformed(
                    "binding",
                    format!("`{}` is not a bound variable", other.name()),
                )),
            })
            .collect::<TermResult<Vec<_>>>()?;
        Ok(list(docs, depth))
    }

    fn exprs(&self, exprs: &[Expression], depth: u8) -> TermResult<Vec<RcDoc<'static, Style>>> {
        exprs.iter().map(|e| self.expr(e, depth + 1)).collect()
    }

    fn expr(&self, expr: &Expression, depth: u8) -> TermResult<RcDoc<'static, Style>> {
        Ok(match expr {
            Expression::ConstantRef(id) => ident(self.program.decl(*id).name())?,
            Expression::IntConstant(value) if *value < 0 => {
                sexpr(op("-"), vec![literal(value.unsigned_abs())], depth)
            }
            Expression::IntConstant(value) => literal(value),
            Expression::BooleanConstant(value) => literal(value),
            Expression::EmptySet(sort) | Expression::UniverseSet(sort) => {
                if !sort.is_set() {
                    return Err(TermError::malformed(
                        "set literal",
                        format!("`{sort}` is not a set sort"),
                    ));
                }
                let name = if matches!(expr, Expression::EmptySet(_)) {
                    "emptyset"
                } else {
                    "univset"
                };
                sexpr(
                    kw("as"),
                    vec![literal(name), self.sort(sort, depth + 1)?],
                    depth,
                )
            }
            Expression::Unary(unary, inner) => {
                sexpr(op(unary), vec![self.expr(inner, depth + 1)?], depth)
            }
            Expression::Binary(BinaryOp::TupSel, index, tuple) => {
                let index = match index.as_ref() {
                    Expression::IntConstant(i) if *i >= 0 => *i,
                    _ => {
                        return Err(TermError::malformed(
                            "tupSel",
                            "the column index must be a non-negative integer constant",
                        ));
                    }
                };
                let selector = sexpr(
                    op("_"),
                    vec![op(BinaryOp::TupSel), literal(index)],
                    depth + 1,
                );
                sexpr(selector, vec![self.expr(tuple, depth + 1)?], depth)
            }
            Expression::Binary(binary, lhs, rhs) => sexpr(
                op(binary),
                vec![self.expr(lhs, depth + 1)?, self.expr(rhs, depth + 1)?],
                depth,
            ),
            Expression::MultiArity(multi, args) => {
                if args.is_empty() {
                    return Err(TermError::malformed(
                        "multi-arity operator",
                        format!("`{multi}` applied to no operand"),
                    ));
                }
                sexpr(op(multi), self.exprs(args, depth)?, depth)
            }
            Expression::Quantified { op: q, vars, body } => {
                if vars.is_empty() {
                    return Err(TermError::malformed(
                        "quantifier",
                        format!("`{q}` binds no variable"),
                    ));
                }
                sexpr(
                    styled(Style::Keyword, q),
                    vec![
                        self.bindings(vars, depth + 1)?,
                        self.expr(body, depth + 1)?,
                    ],
                    depth,
                )
            }
            Expression::Ite {
                condition,
                then_branch,
                else_branch,
            } => sexpr(
                kw("ite"),
                vec![
                    self.expr(condition, depth + 1)?,
                    self.expr(then_branch, depth + 1)?,
                    self.expr(else_branch, depth + 1)?,
                ],
                depth,
            ),
            Expression::Call { function, args } if args.is_empty() => ident(function)?,
            Expression::Call { function, args } => {
                sexpr(ident(function)?, self.exprs(args, depth)?, depth)
            }
        })
    }

    fn declaration(&self, decl: &Declaration) -> TermResult<RcDoc<'static, Style>> {
        Ok(match decl {
            Declaration::Function {
                name,
                inputs,
                output,
            } => sexpr(
                kw("declare-fun"),
                vec![ident(name)?, self.sorts(inputs, 1)?, self.sort(output, 1)?],
                0,
            ),
            Declaration::Constant { name, sort } => sexpr(
                kw("declare-const"),
                vec![ident(name)?, self.sort(sort, 1)?],
                0,
            ),
            Declaration::Definition {
                name,
                inputs,
                output,
                body,
            } => sexpr(
                kw("define-fun"),
                vec![
                    ident(name)?,
                    self.bindings(inputs, 1)?,
                    self.sort(output, 1)?,
                    self.expr(body, 1)?,
                ],
                0,
            ),
            Declaration::BoundVariable { name, .. } => {
                return Err(TermError::malformed(
                    "declaration",
                    format!("bound variable `{name}` cannot be declared at top level"),
                ));
            }
        })
    }

    fn program(&self) -> TermResult<RcDoc<'static, Style>> {
        let mut commands: Vec<RcDoc<'static, Style>> = PRELUDE
            .lines()
            .map(|line| styled(Style::Keyword, line))
            .collect();

        for sort in self.program.sorts() {
            commands.push(sexpr(
                kw("declare-sort"),
                vec![
                    styled(Style::Sort, symbol(&sort.name)?),
                    literal(sort.arity),
                ],
                0,
            ));
        }
        for (_, decl) in self
            .program
            .function_declarations()
            .chain(self.program.constant_declarations())
            .chain(self.program.function_definitions())
        {
            commands.push(self.declaration(decl)?);
        }
        for assertion in self.program.assertions() {
            let command = sexpr(kw("assert"), vec![self.expr(&assertion.expr, 1)?], 0);
            commands.push(match &assertion.name {
                // A line break would end the comment and leak the rest as commands.
                Some(name) if name.contains(['\n', '\r']) => {
                    return Err(TermError::malformed(
                        "assertion name",
                        format!("{name:?} spans several lines"),
                    ));
                }
                Some(name) => styled(Style::Comment, format!("; {name}"))
                    .append(RcDoc::hardline())
                    .append(command),
                None => command,
            });
        }

        Ok(RcDoc::concat(
            commands
                .into_iter()
                .map(|command| command.append(RcDoc::hardline())),
        ))
    }
}

/// Builds the annotated document of a whole program.
pub fn program_doc(program: &Program) -> TermResult<RcDoc<'static, Style>> {
    DocBuilder { program }.program()
}

/// Builds the annotated document of a single expression of `program`.
pub fn expression_doc(program: &Program, expr: &Expression) -> TermResult<RcDoc<'static, Style>> {
    DocBuilder { program }.expr(expr, 0)
}

/// Serializes `program` at [`DEFAULT_WIDTH`].
pub fn print(program: &Program) -> TermResult<String> {
    print_with_width(program, DEFAULT_WIDTH)
}

/// Serializes `program` as plain text laid out for `width` columns.
pub fn print_with_width(program: &Program, width: usize) -> TermResult<String> {
    let doc = program_doc(program)?;
    debug!(
        "serializing program: {} sorts, {} assertions",
        program.sorts().len(),
        program.assertions().len()
    );
    let mut buf = String::new();
    doc.render_fmt(width, &mut buf)
        .map_err(|e| TermError::malformed("program", format!("rendering failed: {e}")))?;
    Ok(buf)
}

// A writer that maps Style annotations to termcolor ColorSpec on a WriteColor sink.
struct ColorWriter<'w, W: WriteColor + Write> {
    out: &'w mut W,
}

impl<'a, 'w, W: WriteColor + Write> RenderAnnotated<'a, Style> for ColorWriter<'w, W> {
    fn push_annotation(&mut self, ann: &'a Style) -> io::Result<()> {
        self.out.set_color(&ann.to_color_spec())
    }
    fn pop_annotation(&mut self) -> io::Result<()> {
        self.out.reset()
    }
}

impl<'w, W: WriteColor + Write> pretty::Render for ColorWriter<'w, W> {
    type Error = io::Error;
    fn write_str(&mut self, s: &str) -> io::Result<usize> {
        self.out.write_all(s.as_bytes())?;
        Ok(s.len())
    }
    fn write_str_all(&mut self, s: &str) -> io::Result<()> {
        self.out.write_all(s.as_bytes())
    }
    fn fail_doc(&self) -> Self::Error {
        io::Error::other("render failed")
    }
}

/// Render a document to a `termcolor::WriteColor` with width-aware layout.
pub fn render_to<W: WriteColor + Write>(
    doc: &RcDoc<'_, Style>,
    width: usize,
    out: &mut W,
) -> io::Result<()> {
    let mut cw = ColorWriter { out };
    doc.render_raw(width, &mut cw)
}

/// Convenience: retrieve the width of the terminal, or 80 if it cannot be determined.
fn terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

/// Print `program` to stdout with colors if supported, at the terminal width.
pub fn print_colored(program: &Program) -> io::Result<()> {
    let doc = program_doc(program).map_err(io::Error::other)?;
    let stdout = StandardStream::stdout(ColorChoice::Auto);
    let mut stdout = stdout.lock();
    render_to(&doc, terminal_width(), &mut stdout)
}

impl std::fmt::Display for Program {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let doc = program_doc(self).map_err(|_| std::fmt::Error)?;
        let mut w = FmtWrite::new(f);
        doc.render_raw(DEFAULT_WIDTH, &mut w)
    }
}
