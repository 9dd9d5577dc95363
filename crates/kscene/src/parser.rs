//! Parser for scene sources
//!
//! Turns the token stream into a flat list of [`Statement`]s. The parser only checks the shape of
//! the source; argument names and values are validated later by the loader, so that errors can
//! name the offending field.

use crate::{
    descriptor::AttributeKind,
    error::{Location, SyntaxError},
    lexer::{Lexer, Token, TokenKind},
};
use kscene_proc::Keyword;
use kscene_utils::KeywordParseError;
use smallvec::SmallVec;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Str(String),
    Number(f32),
    Tuple(SmallVec<[f32; 4]>),
    /// `entities['name']`
    EntityRef(String),
}

impl Value {
    /// Name of the value's type, as used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Str(_) => "a string",
            Value::Number(_) => "a number",
            Value::Tuple(_) => "a tuple",
            Value::EntityRef(_) => "an entity reference",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Number(n) => write!(f, "{n}"),
            Value::Tuple(values) => {
                f.write_str("(")?;
                for (i, v) in values.iter().enumerate() {
                    if i != 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str(")")
            }
            Value::EntityRef(name) => write!(f, "entities[{name:?}]"),
        }
    }
}

/// A `name=value` argument of an attribute call.
#[derive(Debug, Clone, PartialEq)]
pub struct Argument {
    pub name: String,
    pub value: Value,
    pub location: Location,
}

/// A chained `.attribute(...)` call following `create_entity`.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub attribute: AttributeKind,
    pub args: Vec<Argument>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatementKind {
    SceneName(String),
    RequireVersion(String),
    AddAssetPath(String),
    CreateEntity { name: String, calls: Vec<Call> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Keyword)]
enum StatementHead {
    Scene,
    Assets,
    CreateEntity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Keyword)]
enum SceneField {
    Name,
    RequireVersion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Keyword)]
enum AssetsMethod {
    #[keyword("addPath", "add_path")]
    AddPath,
}

/// Keyword naming the table of declared entities inside references.
const ENTITIES: &str = "entities";

pub struct Parser {
    tokens: Vec<Token>,
    cursor: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        debug_assert!(matches!(
            tokens.last(),
            Some(Token {
                kind: TokenKind::Eof,
                ..
            })
        ));
        Self { tokens, cursor: 0 }
    }

    /// Tokenizes and parses a whole source.
    pub fn parse(src: &str) -> Result<Vec<Statement>, SyntaxError> {
        let tokens = Lexer::tokenize(src)?;
        log::trace!("Tokenized scene source into {} tokens", tokens.len());
        Parser::new(tokens).statements()
    }

    pub fn statements(&mut self) -> Result<Vec<Statement>, SyntaxError> {
        let mut statements = Vec::new();
        loop {
            while self.eat(&TokenKind::Semicolon) {}
            if self.peek().kind == TokenKind::Eof {
                return Ok(statements);
            }
            statements.push(self.statement()?);
        }
    }

    fn peek(&self) -> &Token {
        // The token list always ends with `Eof`, which is never consumed
        &self.tokens[self.cursor.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if token.kind != TokenKind::Eof {
            self.cursor += 1;
        }
        token
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if &self.peek().kind == kind {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Location, SyntaxError> {
        let token = self.advance();
        if token.kind == kind {
            Ok(token.location)
        } else {
            Err(unexpected(&token, &kind))
        }
    }

    fn keyword<K>(&mut self) -> Result<(K, Location), SyntaxError>
    where
        K: for<'s> TryFrom<&'s str, Error = KeywordParseError>,
    {
        let token = self.advance();
        match &token.kind {
            TokenKind::Ident(name) => K::try_from(name.as_str())
                .map(|keyword| (keyword, token.location))
                .map_err(|err| SyntaxError::new(token.location, err)),
            _ => Err(unexpected(&token, "an identifier")),
        }
    }

    fn string(&mut self) -> Result<String, SyntaxError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Str(s) => Ok(s),
            _ => Err(unexpected(&token, "a string")),
        }
    }

    /// `( STRING )`
    fn string_call(&mut self) -> Result<String, SyntaxError> {
        self.expect(TokenKind::LParen)?;
        let s = self.string()?;
        self.expect(TokenKind::RParen)?;
        Ok(s)
    }

    fn statement(&mut self) -> Result<Statement, SyntaxError> {
        let (head, location) = self.keyword::<StatementHead>()?;

        let kind = match head {
            StatementHead::Scene => {
                self.expect(TokenKind::Dot)?;
                match self.keyword::<SceneField>()?.0 {
                    SceneField::Name => {
                        let token = self.advance();
                        if !matches!(token.kind, TokenKind::Equals | TokenKind::Colon) {
                            return Err(unexpected(&token, "`=`"));
                        }
                        StatementKind::SceneName(self.string()?)
                    }
                    SceneField::RequireVersion => StatementKind::RequireVersion(self.string_call()?),
                }
            }
            StatementHead::Assets => {
                self.expect(TokenKind::Dot)?;
                match self.keyword::<AssetsMethod>()?.0 {
                    AssetsMethod::AddPath => StatementKind::AddAssetPath(self.string_call()?),
                }
            }
            StatementHead::CreateEntity => {
                let name = self.string_call()?;
                let mut calls = Vec::new();
                while self.eat(&TokenKind::Dot) {
                    calls.push(self.call()?);
                }
                StatementKind::CreateEntity { name, calls }
            }
        };

        Ok(Statement { kind, location })
    }

    fn call(&mut self) -> Result<Call, SyntaxError> {
        let (attribute, location) = self.keyword::<AttributeKind>()?;
        self.expect(TokenKind::LParen)?;

        let mut args = Vec::new();
        while !self.eat(&TokenKind::RParen) {
            args.push(self.argument()?);
            if !self.eat(&TokenKind::Comma) {
                self.expect(TokenKind::RParen)?;
                break;
            }
        }

        Ok(Call {
            attribute,
            args,
            location,
        })
    }

    fn argument(&mut self) -> Result<Argument, SyntaxError> {
        let token = self.advance();
        let name = match token.kind {
            TokenKind::Ident(name) => name,
            _ => return Err(unexpected(&token, "an argument name")),
        };

        let separator = self.advance();
        if !matches!(separator.kind, TokenKind::Equals | TokenKind::Colon) {
            return Err(unexpected(&separator, "`=` or `:`"));
        }

        Ok(Argument {
            name,
            value: self.value()?,
            location: token.location,
        })
    }

    fn value(&mut self) -> Result<Value, SyntaxError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Str(s) => Ok(Value::Str(s)),
            TokenKind::Number(n) => Ok(Value::Number(n)),
            TokenKind::LParen => {
                let mut values = SmallVec::new();
                while !self.eat(&TokenKind::RParen) {
                    values.push(self.number()?);
                    if !self.eat(&TokenKind::Comma) {
                        self.expect(TokenKind::RParen)?;
                        break;
                    }
                }
                if values.is_empty() {
                    return Err(SyntaxError::new(token.location, "tuples can't be empty"));
                }
                Ok(Value::Tuple(values))
            }
            TokenKind::Ident(ref name) if name == ENTITIES => {
                self.expect(TokenKind::LBracket)?;
                let name = self.string()?;
                self.expect(TokenKind::RBracket)?;
                Ok(Value::EntityRef(name))
            }
            _ => Err(unexpected(&token, "a value")),
        }
    }

    fn number(&mut self) -> Result<f32, SyntaxError> {
        let token = self.advance();
        match token.kind {
            TokenKind::Number(n) => Ok(n),
            _ => Err(unexpected(&token, "a number")),
        }
    }
}

fn unexpected(token: &Token, expected: impl fmt::Display) -> SyntaxError {
    SyntaxError::new(
        token.location,
        format_args!("expected {expected}, found {}", token.kind),
    )
}
