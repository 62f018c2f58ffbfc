//! Reader for solver models and SMT-LIB scripts using chumsky.
//!
//! Role
//! - Turn the model reported by the solver back into a typed [`Program`].
//! - Read the printer's own output (a full script) so programs can round-trip.
//!
//! Three stages:
//! 1) Tokenisation from the input string to a `Token` stream. Comments of the form
//!    `; cardinality of <Sort> is <n>` become dedicated tokens; other comments are only kept
//!    at top level, where they may name the following assertion.
//! 2) Parsing tokens into arena-allocated s-expressions.
//! 3) Checked conversion of the s-expressions into a [`Program`]. Symbols resolve to bound
//!    variables first, then to top-level declarations; solver abstract values (`@uc_Atom_0`,
//!    `(as @Atom_0 Atom)`) are declared as constants the first time they are seen.
//!
//! Anything outside the supported grammar is reported as [`TermError::Parse`]; a partial
//! model is never returned.
use std::{collections::BTreeMap, fmt, str::FromStr};

use chumsky::{input::ValueInput, prelude::*};
use log::debug;
use typed_arena::Arena;

use crate::{
    decl::DeclId,
    error::{TermError, TermResult},
    expr::{BinaryOp, Expression, MultiArityOp, QuantifierOp, UnaryOp, func},
    program::Program,
    sort::Sort,
};

pub type Spanned<T> = (T, SimpleSpan);
type Span = SimpleSpan;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Token {
    LParen,
    RParen,
    Symbol(String),
    Keyword(String),
    Numeral(u64),
    StringLit(String),
    Comment(String),
    /// `; cardinality of <sort> is <count>`
    Cardinality { sort: String, count: u64 },
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Symbol(s) => write!(f, "{s}"),
            Token::Keyword(k) => write!(f, ":{k}"),
            Token::Numeral(n) => write!(f, "{n}"),
            Token::StringLit(s) => write!(f, "\"{s}\""),
            Token::Comment(c) => write!(f, "; {c}"),
            Token::Cardinality { sort, count } => write!(f, "; cardinality of {sort} is {count}"),
        }
    }
}

// ---------------- Lexer ----------------

fn is_symbol_char(c: &char) -> bool {
    c.is_ascii_alphanumeric() || "~!@$%^&*_-+=<>.?/".contains(*c)
}

fn comment_token(text: &str) -> Token {
    let mut words = text.split_whitespace();
    if let (Some("cardinality"), Some("of"), Some(sort), Some("is"), Some(count), None) = (
        words.next(),
        words.next(),
        words.next(),
        words.next(),
        words.next(),
        words.next(),
    ) && let Ok(count) = count.parse()
    {
        return Token::Cardinality {
            sort: sort.to_string(),
            count,
        };
    }
    Token::Comment(text.to_string())
}

fn lexer<'a>() -> impl Parser<'a, &'a str, Vec<Spanned<Token>>, extra::Err<Rich<'a, char>>> {
    let numeral = text::int(10)
        .try_map(|s: &str, span| {
            s.parse::<u64>()
                .map(Token::Numeral)
                .map_err(|e| Rich::custom(span, format!("invalid numeral `{s}`: {e}")))
        })
        .labelled("numeral");

    // Simple symbols never start with a digit
    let simple_symbol = any()
        .filter(|c: &char| is_symbol_char(c) && !c.is_ascii_digit())
        .then(any().filter(is_symbol_char).repeated())
        .to_slice()
        .map(|s: &str| Token::Symbol(s.to_string()))
        .labelled("symbol");

    let quoted_symbol = just('|')
        .ignore_then(none_of("|\\").repeated().to_slice())
        .then_ignore(just('|'))
        .map(|s: &str| Token::Symbol(s.to_string()))
        .labelled("quoted symbol");

    let keyword = just(':')
        .ignore_then(any().filter(is_symbol_char).repeated().at_least(1).to_slice())
        .map(|s: &str| Token::Keyword(s.to_string()))
        .labelled("keyword");

    let string = just('"')
        .ignore_then(none_of('"').repeated().to_slice())
        .then_ignore(just('"'))
        .map(|s: &str| Token::StringLit(s.to_string()))
        .labelled("string literal");

    let comment = just(';')
        .ignore_then(any().and_is(just('\n').not()).repeated().to_slice())
        .map(|s: &str| comment_token(s.trim()))
        .labelled("comment");

    let token = choice((
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        comment,
        keyword,
        string,
        quoted_symbol,
        numeral,
        simple_symbol,
    ));

    token
        .map_with(|tok, e| (tok, e.span()))
        .padded()
        .repeated()
        .collect()
        .then_ignore(end())
}

// ---------------- S-expressions ----------------

#[derive(Debug, Clone)]
enum SExpr<'a> {
    Symbol(String),
    Keyword(String),
    Numeral(u64),
    Str(String),
    Comment(String),
    Cardinality { sort: String, count: u64 },
    List(&'a [SExpr<'a>]),
}

impl fmt::Display for SExpr<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExpr::Symbol(s) => write!(f, "{s}"),
            SExpr::Keyword(k) => write!(f, ":{k}"),
            SExpr::Numeral(n) => write!(f, "{n}"),
            SExpr::Str(s) => write!(f, "\"{s}\""),
            SExpr::Comment(c) => write!(f, "; {c}"),
            SExpr::Cardinality { sort, count } => write!(f, "; cardinality of {sort} is {count}"),
            SExpr::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, ")")
            }
        }
    }
}

fn sexpr_parser<'tokens, I>(
    arena: &'tokens Arena<SExpr<'tokens>>,
) -> impl Parser<'tokens, I, Vec<SExpr<'tokens>>, extra::Err<Rich<'tokens, Token, Span>>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = Span>,
{
    let sexpr = recursive(|sexpr| {
        let atom = select! {
            Token::Symbol(s) => SExpr::Symbol(s),
            Token::Keyword(k) => SExpr::Keyword(k),
            Token::Numeral(n) => SExpr::Numeral(n),
            Token::StringLit(s) => SExpr::Str(s),
            Token::Comment(c) => SExpr::Comment(c),
            Token::Cardinality { sort, count } => SExpr::Cardinality { sort, count },
        }
        .labelled("atom");

        let list = sexpr
            .repeated()
            .collect::<Vec<_>>()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map(move |items: Vec<SExpr<'tokens>>| SExpr::List(arena.alloc_extend(items)))
            .labelled("list");

        atom.or(list)
    });

    sexpr.repeated().collect::<Vec<_>>()
}

// ---------------- Conversion into a Program ----------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    /// `declare-*` and `define-fun` commands, optionally wrapped in `(model ...)`.
    Model,
    /// Everything the printer emits.
    Script,
}

fn error(message: impl Into<String>) -> TermError {
    TermError::parse(message)
}

/// Reports term-model violations found while reading as parse errors.
fn checked<T>(result: TermResult<T>) -> TermResult<T> {
    result.map_err(|e| match e {
        TermError::Parse { .. } => e,
        other => error(other.to_string()),
    })
}

struct Reader {
    dialect: Dialect,
    program: Program,
    /// Bound variables in scope, innermost last.
    scopes: Vec<(String, DeclId)>,
    cardinalities: BTreeMap<String, u64>,
}

impl Reader {
    fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            program: Program::new(),
            scopes: Vec::new(),
            cardinalities: BTreeMap::new(),
        }
    }

    fn read(mut self, items: &[SExpr<'_>]) -> TermResult<Program> {
        let commands: &[SExpr<'_>] = match items {
            [SExpr::List([SExpr::Symbol(head), rest @ ..])] if head == "model" => rest,
            // Some solvers print the model as a bare parenthesised list of commands
            [SExpr::List(inner)] if !matches!(inner.first(), Some(SExpr::Symbol(_))) => *inner,
            _ => items,
        };

        let mut pending_name: Option<String> = None;
        for item in commands {
            let name = pending_name.take();
            match item {
                SExpr::Comment(text) => pending_name = Some(text.clone()),
                SExpr::Cardinality { sort, count } => {
                    self.cardinalities.insert(sort.clone(), *count);
                }
                SExpr::List(command) => self.command(command, name)?,
                other => return Err(error(format!("expected a command, found `{other}`"))),
            }
        }

        for (sort, count) in std::mem::take(&mut self.cardinalities) {
            if self.program.sort_declaration(&sort).is_some() {
                self.program.set_sort_cardinality(&sort, count)?;
            } else {
                debug!("ignoring cardinality reported for undeclared sort `{sort}`");
            }
        }
        Ok(self.program)
    }

    fn command(&mut self, command: &[SExpr<'_>], name: Option<String>) -> TermResult<()> {
        let [SExpr::Symbol(head), args @ ..] = command else {
            return Err(error(format!(
                "expected a command, found `{}`",
                SExpr::List(command)
            )));
        };
        let script = self.dialect == Dialect::Script;

        match (head.as_str(), args) {
            ("declare-sort", [SExpr::Symbol(sort), SExpr::Numeral(arity)]) => {
                let arity = u32::try_from(*arity)
                    .map_err(|_| error(format!("arity of sort `{sort}` is out of range")))?;
                checked(self.program.declare_sort(sort.clone(), arity))
            }
            ("declare-fun", [SExpr::Symbol(function), SExpr::List(inputs), output]) => {
                let inputs = inputs
                    .iter()
                    .map(|s| self.sort(s))
                    .collect::<TermResult<Vec<_>>>()?;
                let output = self.sort(output)?;
                checked(self.program.declare_function(function.clone(), inputs, output)).map(drop)
            }
            ("declare-const", [SExpr::Symbol(constant), sort]) => {
                let sort = self.sort(sort)?;
                checked(self.program.declare_constant(constant.clone(), sort)).map(drop)
            }
            ("define-fun", [SExpr::Symbol(function), SExpr::List(params), output, body]) => {
                let output = self.sort(output)?;
                let (params, body) = self.scoped(params, |reader| reader.term(body))?;
                checked(
                    self.program
                        .define_function(function.clone(), params, output, body),
                )
                .map(drop)
            }
            ("assert", [body]) if script => {
                let body = self.term(body)?;
                match name {
                    Some(name) => self.program.assert_named(name, body),
                    None => self.program.assert(body),
                }
                Ok(())
            }
            ("set-logic", [SExpr::Symbol(_)]) if script => Ok(()),
            ("set-option", [SExpr::Keyword(_), _]) if script => Ok(()),
            _ => Err(error(format!(
                "unsupported command `{}`",
                SExpr::List(command)
            ))),
        }
    }

    fn sort(&self, sort: &SExpr<'_>) -> TermResult<Sort> {
        match sort {
            SExpr::Symbol(name) => match name.as_str() {
                "Int" => Ok(Sort::Int),
                "Bool" => Ok(Sort::Bool),
                "Real" => Ok(Sort::Real),
                "String" => Ok(Sort::String),
                _ if self.program.sort_declaration(name).is_some() => {
                    Ok(Sort::uninterpreted(name.clone()))
                }
                _ => Err(error(format!("unknown sort `{name}`"))),
            },
            SExpr::List([SExpr::Symbol(head), element]) if head == "Set" => {
                checked(Sort::set(self.sort(element)?))
            }
            SExpr::List([SExpr::Symbol(head), columns @ ..]) if head == "Tuple" => {
                let columns = columns
                    .iter()
                    .map(|c| self.sort(c))
                    .collect::<TermResult<Vec<_>>>()?;
                checked(Sort::tuple(columns))
            }
            other => Err(error(format!("expected a sort, found `{other}`"))),
        }
    }

    /// Reads `((x S) ...)`, brings the variables into scope for `body`, then drops them.
    fn scoped<T>(
        &mut self,
        bindings: &[SExpr<'_>],
        body: impl FnOnce(&mut Self) -> TermResult<T>,
    ) -> TermResult<(Vec<DeclId>, T)> {
        let mark = self.scopes.len();
        let mut vars = Vec::with_capacity(bindings.len());
        for binding in bindings {
            let SExpr::List([SExpr::Symbol(name), sort]) = binding else {
                return Err(error(format!("expected a binding `(name Sort)`, found `{binding}`")));
            };
            let sort = self.sort(sort)?;
            let id = self.program.bound_variable(name.clone(), sort);
            self.scopes.push((name.clone(), id));
            vars.push(id);
        }
        let result = body(self);
        self.scopes.truncate(mark);
        Ok((vars, result?))
    }

    fn abstract_value(&mut self, name: &str, sort: Sort) -> TermResult<Expression> {
        let id = match self.program.lookup(name) {
            Some(id) => id,
            None => checked(self.program.declare_constant(name, sort))?,
        };
        Ok(Expression::ConstantRef(id))
    }

    fn symbol(&mut self, name: &str) -> TermResult<Expression> {
        match name {
            "true" => return Ok(Expression::TRUE),
            "false" => return Ok(Expression::FALSE),
            _ => {}
        }
        if let Some((_, id)) = self.scopes.iter().rev().find(|(n, _)| n == name) {
            return Ok(Expression::ConstantRef(*id));
        }
        if let Some(id) = self.program.lookup(name) {
            return Ok(Expression::ConstantRef(id));
        }
        // `@uc_<Sort>_<n>`
        if let Some((sort, _)) = name
            .strip_prefix("@uc_")
            .and_then(|rest| rest.rsplit_once('_'))
            && self.program.sort_declaration(sort).is_some()
        {
            return self.abstract_value(name, Sort::uninterpreted(sort));
        }
        Err(error(format!("unknown symbol `{name}`")))
    }

    fn terms(&mut self, terms: &[SExpr<'_>]) -> TermResult<Vec<Expression>> {
        terms.iter().map(|t| self.term(t)).collect()
    }

    fn term(&mut self, term: &SExpr<'_>) -> TermResult<Expression> {
        let items = match term {
            SExpr::Symbol(name) => return self.symbol(name),
            SExpr::Numeral(n) => {
                return i64::try_from(*n)
                    .map(Expression::IntConstant)
                    .map_err(|_| error(format!("numeral {n} is out of range")));
            }
            SExpr::List(items) => *items,
            other => return Err(error(format!("expected a term, found `{other}`"))),
        };

        match items {
            [SExpr::Symbol(head), SExpr::Symbol(name), sort] if head == "as" => {
                let sort = self.sort(sort)?;
                match name.as_str() {
                    "emptyset" | "univset" if !sort.is_set() => {
                        Err(error(format!("`{name}` annotated with non-set sort `{sort}`")))
                    }
                    "emptyset" => Ok(Expression::EmptySet(sort)),
                    "univset" => Ok(Expression::UniverseSet(sort)),
                    _ if name.starts_with('@') => self.abstract_value(name, sort),
                    _ => Err(error(format!("unsupported annotation of `{name}`"))),
                }
            }
            [SExpr::Symbol(head), SExpr::Numeral(n)] if head == "-" => i64::try_from(-i128::from(*n))
                .map(Expression::IntConstant)
                .map_err(|_| error(format!("numeral -{n} is out of range"))),
            [SExpr::List([SExpr::Symbol(under), SExpr::Symbol(sel), SExpr::Numeral(i)]), tuple]
                if under == "_" && sel == "tupSel" =>
            {
                let index =
                    u32::try_from(*i).map_err(|_| error(format!("column {i} is out of range")))?;
                Ok(func::tup_sel(index, self.term(tuple)?))
            }
            [SExpr::Symbol(head), SExpr::List(bindings), body]
                if QuantifierOp::from_str(head).is_ok() =>
            {
                let op = QuantifierOp::from_str(head).map_err(|e| error(e.to_string()))?;
                let (vars, body) = self.scoped(bindings, |reader| reader.term(body))?;
                checked(func::quantified(op, vars, body))
            }
            [SExpr::Symbol(head), condition, then_branch, else_branch] if head == "ite" => {
                Ok(func::ite(
                    self.term(condition)?,
                    self.term(then_branch)?,
                    self.term(else_branch)?,
                ))
            }
            [SExpr::Symbol(head), args @ ..] if !args.is_empty() => self.application(head, args),
            _ => Err(error(format!("unsupported term `{term}`"))),
        }
    }

    fn application(&mut self, head: &str, args: &[SExpr<'_>]) -> TermResult<Expression> {
        if let Ok(op) = UnaryOp::from_str(head) {
            let [arg] = args else {
                return Err(error(format!("`{head}` expects one operand, got {}", args.len())));
            };
            return Ok(Expression::Unary(op, Box::new(self.term(arg)?)));
        }
        if let Ok(op) = BinaryOp::from_str(head)
            && op != BinaryOp::TupSel
        {
            let [lhs, rhs] = args else {
                return Err(error(format!(
                    "`{head}` expects two operands, got {}",
                    args.len()
                )));
            };
            let (lhs, rhs) = (self.term(lhs)?, self.term(rhs)?);
            return Ok(Expression::Binary(op, Box::new(lhs), Box::new(rhs)));
        }
        if let Ok(op) = MultiArityOp::from_str(head) {
            let mut args = self.terms(args)?;
            return checked(match op {
                MultiArityOp::MkTuple => func::mk_tuple(args),
                MultiArityOp::Distinct => func::distinct(args),
                MultiArityOp::Insert => match args.pop() {
                    Some(set) => func::insert(args, set),
                    None => Err(error("`insert` expects operands")),
                },
                MultiArityOp::And | MultiArityOp::Or => Ok(Expression::MultiArity(op, args)),
            });
        }
        if self.program.lookup(head).is_some() {
            let args = self.terms(args)?;
            return Ok(func::call(head, args));
        }
        Err(error(format!("unknown function `{head}`")))
    }
}

fn read(src: &str, dialect: Dialect) -> TermResult<Program> {
    // 1) Lexing
    let (tokens, lex_errs) = lexer().parse(src).into_output_errors();
    let mut errors: Vec<String> = lex_errs
        .into_iter()
        .map(|e| format!("lexing error: {e}"))
        .collect();

    let tokens = match tokens {
        Some(toks) => toks,
        None => return Err(TermError::Parse { errors }),
    };

    // Only top-level comments can name an assertion; nested ones are dropped here
    let mut depth = 0usize;
    let plain: Vec<Token> = tokens
        .into_iter()
        .map(|(t, _s)| t)
        .filter(|t| {
            match t {
                Token::LParen => depth += 1,
                Token::RParen => depth = depth.saturating_sub(1),
                Token::Comment(_) => return depth == 0,
                _ => {}
            }
            true
        })
        .collect();

    // 2) S-expressions over the token stream
    let arena = Arena::new();
    let (sexprs, parse_errs) = sexpr_parser(&arena)
        .then_ignore(end())
        .parse(plain.as_slice())
        .into_output_errors();
    errors.extend(parse_errs.into_iter().map(|e| format!("parse error: {e}")));
    if !errors.is_empty() {
        return Err(TermError::Parse { errors });
    }
    let Some(sexprs) = sexprs else {
        return Err(error("no output produced for the input"));
    };
    debug!("read {} top-level s-expressions", sexprs.len());

    // 3) Program
    Reader::new(dialect).read(&sexprs)
}

/// Parse a solver model into a [`Program`].
///
/// Accepts `(model ...)`, a parenthesised list of commands, or a bare sequence of
/// `declare-sort`, `declare-fun`, `declare-const` and `define-fun` commands. Cardinality
/// comments are recorded on the corresponding sort.
///
/// Example
/// ```
/// use relterm::parser::parse_model;
/// let model = parse_model(
///     "(model\n; cardinality of Atom is 2\n(declare-sort Atom 0)\n\
///      (define-fun atomNone () (Set (Tuple Atom)) (as emptyset (Set (Tuple Atom)))))",
/// )
/// .unwrap();
/// assert_eq!(model.sorts()[0].cardinality, Some(2));
/// assert_eq!(model.function_definitions().count(), 1);
/// ```
pub fn parse_model(src: &str) -> TermResult<Program> {
    read(src, Dialect::Model)
}

/// Parse an SMT-LIB script in the dialect produced by [`crate::printer::print`].
///
/// On top of the model commands, `set-logic`, `set-option` and `assert` are accepted; a
/// top-level comment right before an `assert` becomes the assertion's name.
pub fn parse_script(src: &str) -> TermResult<Program> {
    read(src, Dialect::Script)
}
