//! Parser for the textual graph DSL used by rewrite rules and tests.
//!
//! ```text
//! graph(%input, %weight, %bias : Tensor):
//!     %r = nn::linear(%input, %weight, %bias)
//!     return (%r)
//! ```
//!
//! Inline literals (`3`, `1.5`, `true`, `None`, `[1, 1]`, `"s"`) become
//! `prim::constant` nodes; in a pattern they only match constants with an
//! equal value. Attribute blocks (`prim::constant[value=None]()`) set node
//! attributes directly.

use std::collections::HashMap;

use crate::error::{
    DuplicateValueSnafu, ParseSnafu, Result, UndeclaredReturnSnafu, UndefinedValueSnafu,
};
use crate::graph::{Graph, ValueId};
use crate::{AttrValue, Symbol, TypeAnn};

/// A parsed rewrite pattern: the pattern graph plus the name table binding
/// every `%name` the text declared.
#[derive(Debug, Clone)]
pub struct Pattern {
    pub graph: Graph,
    pub names: HashMap<String, ValueId>,
}

impl Pattern {
    pub fn parse(text: &str) -> Result<Self> {
        Parser::new(text)?.run()
    }
}

/// Parse a standalone graph. Identical grammar to patterns.
pub fn parse_graph(text: &str) -> Result<Graph> {
    Ok(Pattern::parse(text)?.graph)
}

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Graph,
    Return,
    NoneKw,
    True,
    False,
    Ident(String),
    ValueRef(String),
    Int(i64),
    Float(f64),
    Str(String),
    LParen,
    RParen,
    LBracket,
    RBracket,
    Colon,
    Comma,
    Eq,
    Eof,
}

impl Tok {
    fn describe(&self) -> String {
        match self {
            Tok::Graph => "`graph`".into(),
            Tok::Return => "`return`".into(),
            Tok::NoneKw => "`None`".into(),
            Tok::True | Tok::False => "boolean".into(),
            Tok::Ident(s) => format!("`{s}`"),
            Tok::ValueRef(s) => format!("`%{s}`"),
            Tok::Int(i) => format!("`{i}`"),
            Tok::Float(v) => format!("`{v}`"),
            Tok::Str(_) => "string literal".into(),
            Tok::LParen => "`(`".into(),
            Tok::RParen => "`)`".into(),
            Tok::LBracket => "`[`".into(),
            Tok::RBracket => "`]`".into(),
            Tok::Colon => "`:`".into(),
            Tok::Comma => "`,`".into(),
            Tok::Eq => "`=`".into(),
            Tok::Eof => "end of input".into(),
        }
    }
}

#[derive(Debug, Clone)]
struct Spanned {
    tok: Tok,
    line: usize,
    column: usize,
}

struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self { chars: text.chars().peekable(), line: 1, column: 1 }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn err<T>(&self, message: impl Into<String>) -> Result<T> {
        ParseSnafu { message: message.into(), line: self.line, column: self.column }.fail()
    }

    fn ident(&mut self, first: char) -> String {
        let mut s = String::from(first);
        loop {
            while self.chars.peek().copied().is_some_and(is_ident_char) {
                s.push(self.bump().unwrap());
            }
            // qualified names: `nn::linear`
            let mut lookahead = self.chars.clone();
            if lookahead.next() == Some(':') && lookahead.next() == Some(':') {
                self.bump();
                self.bump();
                s.push_str("::");
            } else {
                break;
            }
        }
        s
    }

    fn tokens(mut self) -> Result<Vec<Spanned>> {
        let mut out = Vec::new();
        loop {
            while self.chars.peek().is_some_and(|c| c.is_whitespace()) {
                self.bump();
            }
            // line comments
            if self.chars.peek() == Some(&'#') {
                while self.chars.peek().is_some_and(|&c| c != '\n') {
                    self.bump();
                }
                continue;
            }
            let (line, column) = (self.line, self.column);
            let Some(c) = self.bump() else {
                out.push(Spanned { tok: Tok::Eof, line, column });
                return Ok(out);
            };
            let tok = match c {
                '(' => Tok::LParen,
                ')' => Tok::RParen,
                '[' => Tok::LBracket,
                ']' => Tok::RBracket,
                ':' => Tok::Colon,
                ',' => Tok::Comma,
                '=' => Tok::Eq,
                '%' => {
                    let mut name = String::new();
                    while self.chars.peek().copied().is_some_and(|c| is_ident_char(c) || c == '.') {
                        name.push(self.bump().unwrap());
                    }
                    if name.is_empty() {
                        return self.err("expected value name after `%`");
                    }
                    Tok::ValueRef(name)
                }
                '"' => {
                    let mut s = String::new();
                    loop {
                        match self.bump() {
                            None => return self.err("unterminated string literal"),
                            Some('"') => break,
                            Some('\\') => match self.bump() {
                                Some('n') => s.push('\n'),
                                Some(other @ ('"' | '\\')) => s.push(other),
                                _ => return self.err("unsupported escape in string literal"),
                            },
                            Some(other) => s.push(other),
                        }
                    }
                    Tok::Str(s)
                }
                c if c == '-' || c.is_ascii_digit() => {
                    let mut s = String::from(c);
                    if c == '-' && !self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                        return self.err("expected digits after `-`");
                    }
                    while self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                        s.push(self.bump().unwrap());
                    }
                    if self.chars.peek() == Some(&'.') {
                        s.push(self.bump().unwrap());
                        while self.chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                            s.push(self.bump().unwrap());
                        }
                        match s.parse() {
                            Ok(v) => Tok::Float(v),
                            Err(_) => return self.err(format!("malformed float literal `{s}`")),
                        }
                    } else {
                        match s.parse() {
                            Ok(v) => Tok::Int(v),
                            Err(_) => return self.err(format!("malformed integer literal `{s}`")),
                        }
                    }
                }
                c if c.is_ascii_alphabetic() || c == '_' => match self.ident(c).as_str() {
                    "graph" => Tok::Graph,
                    "return" => Tok::Return,
                    "None" => Tok::NoneKw,
                    "true" => Tok::True,
                    "false" => Tok::False,
                    other => Tok::Ident(other.to_owned()),
                },
                other => return self.err(format!("unexpected character `{other}`")),
            };
            out.push(Spanned { tok, line, column });
        }
    }
}

struct Parser {
    toks: Vec<Spanned>,
    pos: usize,
    graph: Graph,
    names: HashMap<String, ValueId>,
}

impl Parser {
    fn new(text: &str) -> Result<Self> {
        Ok(Self {
            toks: Lexer::new(text).tokens()?,
            pos: 0,
            graph: Graph::new(),
            names: HashMap::new(),
        })
    }

    fn peek(&self) -> &Tok {
        &self.toks[self.pos].tok
    }

    fn here(&self) -> (usize, usize) {
        let s = &self.toks[self.pos.min(self.toks.len() - 1)];
        (s.line, s.column)
    }

    fn advance(&mut self) -> Spanned {
        let s = self.toks[self.pos].clone();
        if self.pos + 1 < self.toks.len() {
            self.pos += 1;
        }
        s
    }

    fn eat(&mut self, tok: &Tok) -> bool {
        if self.peek() == tok {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, tok: Tok) -> Result<()> {
        if self.peek() == &tok {
            self.advance();
            Ok(())
        } else {
            self.unexpected(&format!("expected {}", tok.describe()))
        }
    }

    fn unexpected<T>(&self, what: &str) -> Result<T> {
        let (line, column) = self.here();
        ParseSnafu {
            message: format!("{what}, found {}", self.peek().describe()),
            line,
            column,
        }
        .fail()
    }

    fn declare(&mut self, name: String, value: ValueId) -> Result<()> {
        let (line, column) = self.here();
        if self.names.insert(name.clone(), value).is_some() {
            return DuplicateValueSnafu { name, line, column }.fail();
        }
        Ok(())
    }

    fn run(mut self) -> Result<Pattern> {
        self.expect(Tok::Graph)?;
        self.expect(Tok::LParen)?;
        if !self.eat(&Tok::RParen) {
            loop {
                let Tok::ValueRef(name) = self.peek().clone() else {
                    return self.unexpected("expected graph input `%name`");
                };
                self.advance();
                let ty = self.type_annotation()?;
                let id = self.graph.add_input(Some(name.clone()), ty);
                self.declare(name, id)?;
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(Tok::RParen)?;
        }
        self.expect(Tok::Colon)?;

        while self.peek() != &Tok::Return {
            self.statement()?;
        }
        self.expect(Tok::Return)?;
        self.expect(Tok::LParen)?;
        if !self.eat(&Tok::RParen) {
            loop {
                let Tok::ValueRef(name) = self.peek().clone() else {
                    return self.unexpected("expected returned value `%name`");
                };
                let (line, column) = self.here();
                self.advance();
                let Some(&id) = self.names.get(&name) else {
                    return UndeclaredReturnSnafu { name, line, column }.fail();
                };
                self.graph.outputs.push(id);
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(Tok::RParen)?;
        }
        self.expect(Tok::Eof)?;
        self.graph.validate()?;
        Ok(Pattern { graph: self.graph, names: self.names })
    }

    /// `: int[]`, `: Tensor`, `: vk::Conv2dContext`, `: None`
    fn type_annotation(&mut self) -> Result<Option<TypeAnn>> {
        if !self.eat(&Tok::Colon) {
            return Ok(None);
        }
        match self.peek().clone() {
            Tok::NoneKw => {
                self.advance();
                Ok(Some(TypeAnn::NoneType))
            }
            Tok::Ident(name) => {
                self.advance();
                if self.eat(&Tok::LBracket) {
                    self.expect(Tok::RBracket)?;
                    Ok(Some(TypeAnn::parse(&format!("{name}[]"))))
                } else {
                    Ok(Some(TypeAnn::parse(&name)))
                }
            }
            _ => self.unexpected("expected type annotation"),
        }
    }

    fn statement(&mut self) -> Result<()> {
        // LHS: one or more `%name : ty` declarations
        let mut lhs = Vec::new();
        loop {
            let Tok::ValueRef(name) = self.peek().clone() else {
                return self.unexpected("expected statement `%out = ns::op(...)`");
            };
            self.advance();
            let ty = self.type_annotation()?;
            lhs.push((name, ty));
            if !self.eat(&Tok::Comma) {
                break;
            }
        }
        self.expect(Tok::Eq)?;
        let Tok::Ident(kind) = self.peek().clone() else {
            return self.unexpected("expected operation kind");
        };
        self.advance();
        let kind = Symbol::new(kind);

        let mut attrs = Vec::new();
        if self.eat(&Tok::LBracket) {
            loop {
                let Tok::Ident(key) = self.peek().clone() else {
                    return self.unexpected("expected attribute key");
                };
                self.advance();
                self.expect(Tok::Eq)?;
                attrs.push((Symbol::new(key), self.literal()?));
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(Tok::RBracket)?;
        }

        self.expect(Tok::LParen)?;
        let mut args = Vec::new();
        if !self.eat(&Tok::RParen) {
            loop {
                match self.peek().clone() {
                    Tok::ValueRef(name) => {
                        let (line, column) = self.here();
                        self.advance();
                        let Some(&id) = self.names.get(&name) else {
                            return UndefinedValueSnafu { name, line, column }.fail();
                        };
                        args.push(id);
                    }
                    _ => {
                        let value = self.literal()?;
                        args.push(self.graph.append_constant(value, None));
                    }
                }
                if !self.eat(&Tok::Comma) {
                    break;
                }
            }
            self.expect(Tok::RParen)?;
        }

        let node = self.graph.append_node(kind, &args);
        for (key, value) in attrs {
            self.graph.set_attr(node, key, value);
        }
        for (name, ty) in lhs {
            let id = self.graph.add_output(node, Some(name.clone()), ty);
            self.declare(name, id)?;
        }
        Ok(())
    }

    fn literal(&mut self) -> Result<AttrValue> {
        let value = match self.peek().clone() {
            Tok::Int(i) => AttrValue::Int(i),
            Tok::Float(v) => AttrValue::Float(v),
            Tok::True => AttrValue::Bool(true),
            Tok::False => AttrValue::Bool(false),
            Tok::NoneKw => AttrValue::None,
            Tok::Str(s) => AttrValue::Str(s),
            Tok::LBracket => {
                self.advance();
                let mut items = Vec::new();
                if !self.eat(&Tok::RBracket) {
                    loop {
                        let Tok::Int(i) = self.peek().clone() else {
                            return self.unexpected("expected integer in list literal");
                        };
                        self.advance();
                        items.push(i);
                        if !self.eat(&Tok::Comma) {
                            break;
                        }
                    }
                    self.expect(Tok::RBracket)?;
                }
                return Ok(AttrValue::IntList(items));
            }
            _ => return self.unexpected("expected literal"),
        };
        self.advance();
        Ok(value)
    }
}
