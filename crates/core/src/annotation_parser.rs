//! Annotation Parser
//!
//! Parses annotation text into [`TypeExpr`] values so stage element types can be
//! written the way pipeline authors spell them.
//!
//! Supports:
//! - Builtins: int, bool, float, complex, str, bytes, None, Any
//! - Containers: `List[int]`, `Dict[str, int]`, `Set`, `Tuple[int, str]`, `Tuple[()]`, `Iterator[T]`
//!   and their lowercase PEP 585 spellings
//! - Union types: `Union[int, str]`, `int | str`, `Optional[T]`
//! - Type variables registered on the parser
//! - Any other identifier as a nominal class, optionally parameterized (`Batch[int]`)
//!
//! ## Examples
//!
//! ```
//! use pipetype_core::{AnnotationParser, TypeExpr, TypeVarDef};
//!
//! let parser = AnnotationParser::new().with_var(TypeVarDef::new("T"));
//! let ty = parser.parse("List[T]").unwrap();
//! assert_eq!(ty, TypeExpr::list(TypeExpr::var(TypeVarDef::new("T"))));
//! ```

use crate::{TypeCtor, TypeExpr, TypeVarDef, TypingError};
use rustc_hash::FxHashMap;
use std::iter::Peekable;
use std::str::Chars;

type ParseResult<T> = std::result::Result<T, TypingError>;

const MODULE_PREFIXES: [&str; 3] = ["typing.", "builtins.", "collections.abc."];

/// Deepest nesting of brackets and parentheses accepted
const MAX_DEPTH: usize = 64;

/// Parser for annotation text with an optional scope of type variables
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationParser {
    vars: FxHashMap<String, TypeVarDef>,
}

impl AnnotationParser {
    pub fn new() -> Self {
        Self { vars: FxHashMap::default() }
    }

    /// Make a type variable resolvable by name
    pub fn with_var(mut self, var: TypeVarDef) -> Self {
        self.vars.insert(var.name.clone(), var);
        self
    }

    /// Parse annotation text into a type expression
    pub fn parse(&self, annotation: &str) -> ParseResult<TypeExpr> {
        let trimmed = annotation.trim();
        if trimmed.is_empty() {
            return Err(TypingError::malformed(annotation, "empty annotation"));
        }

        let tokens = Lexer::new(trimmed).tokenize().map_err(|reason| TypingError::malformed(trimmed, reason))?;
        let mut parser = Parser { tokens, pos: 0, depth: 0, vars: &self.vars };
        let ty = parser.parse_type().map_err(|reason| TypingError::malformed(trimmed, reason))?;

        if parser.pos < parser.tokens.len() {
            Err(TypingError::malformed(
                trimmed,
                format!("unexpected tokens: {:?}", &parser.tokens[parser.pos..]),
            ))
        } else {
            Ok(ty)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    LBracket,
    RBracket,
    LParen,
    RParen,
    Comma,
    Pipe,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { chars: input.chars().peekable() }
    }

    fn tokenize(&mut self) -> Result<Vec<Token>, String> {
        let mut tokens = Vec::new();

        while let Some(&ch) = self.chars.peek() {
            let token = match ch {
                ' ' | '\t' | '\n' | '\r' => {
                    self.chars.next();
                    continue;
                }
                '[' => Token::LBracket,
                ']' => Token::RBracket,
                '(' => Token::LParen,
                ')' => Token::RParen,
                ',' => Token::Comma,
                '|' => Token::Pipe,
                ch if ch.is_alphabetic() || ch == '_' => {
                    tokens.push(self.read_identifier());
                    continue;
                }
                _ => return Err(format!("unexpected character '{ch}'")),
            };
            self.chars.next();
            tokens.push(token);
        }

        Ok(tokens)
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(&ch) = self.chars.peek() {
            if ch.is_alphanumeric() || ch == '_' || ch == '.' {
                ident.push(ch);
                self.chars.next();
            } else {
                break;
            }
        }

        for prefix in MODULE_PREFIXES {
            if let Some(stripped) = ident.strip_prefix(prefix) {
                return Token::Ident(stripped.to_string());
            }
        }
        Token::Ident(ident)
    }
}

struct Parser<'v> {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
    vars: &'v FxHashMap<String, TypeVarDef>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), String> {
        match self.advance() {
            Some(token) if token == expected => Ok(()),
            Some(token) => Err(format!("expected {expected:?}, found {token:?}")),
            None => Err(format!("expected {expected:?}, found end of input")),
        }
    }

    fn parse_type(&mut self) -> Result<TypeExpr, String> {
        if self.depth >= MAX_DEPTH {
            return Err(format!("nesting deeper than {MAX_DEPTH} levels"));
        }
        self.depth += 1;
        let ty = self.parse_union();
        self.depth -= 1;
        ty
    }

    /// type := primary ('|' primary)*
    fn parse_union(&mut self) -> Result<TypeExpr, String> {
        let mut members = vec![self.parse_primary()?];
        while matches!(self.peek(), Some(Token::Pipe)) {
            self.advance();
            members.push(self.parse_primary()?);
        }

        Ok(if members.len() == 1 { members.remove(0) } else { TypeExpr::union(members) })
    }

    fn parse_primary(&mut self) -> Result<TypeExpr, String> {
        match self.advance() {
            Some(Token::Ident(name)) => self.parse_named(&name),
            Some(Token::LParen) => {
                let ty = self.parse_type()?;
                self.expect(Token::RParen)?;
                Ok(ty)
            }
            Some(token) => Err(format!("expected type name, found {token:?}")),
            None => Err("expected type name, found end of input".to_string()),
        }
    }

    /// Bracketed argument list, if one follows
    fn parse_args(&mut self) -> Result<Option<Vec<TypeExpr>>, String> {
        if !matches!(self.peek(), Some(Token::LBracket)) {
            return Ok(None);
        }
        self.advance();

        if matches!(self.peek(), Some(Token::LParen)) && matches!(self.tokens.get(self.pos + 1), Some(Token::RParen)) {
            self.pos += 2;
            self.expect(Token::RBracket)?;
            return Ok(Some(Vec::new()));
        }

        let mut args = vec![self.parse_type()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            args.push(self.parse_type()?);
        }
        self.expect(Token::RBracket)?;
        Ok(Some(args))
    }

    fn parse_named(&mut self, name: &str) -> Result<TypeExpr, String> {
        let args = self.parse_args()?;

        let scalar = match name {
            "int" => Some(TypeExpr::int()),
            "bool" => Some(TypeExpr::bool()),
            "float" => Some(TypeExpr::float()),
            "complex" => Some(TypeExpr::complex()),
            "str" => Some(TypeExpr::string()),
            "bytes" => Some(TypeExpr::bytes()),
            "None" | "NoneType" => Some(TypeExpr::NullType),
            "Any" => Some(TypeExpr::Any),
            _ => None,
        };
        if let Some(scalar) = scalar {
            return match args {
                None => Ok(scalar),
                Some(_) => Err(format!("{name} is not subscriptable")),
            };
        }

        if let Some(var) = self.vars.get(name) {
            return match args {
                None => Ok(TypeExpr::Var(var.clone())),
                Some(_) => Err(format!("type variable {name} is not subscriptable")),
            };
        }

        match name {
            "Union" => {
                let members = args.ok_or("Union requires type arguments")?;
                if members.is_empty() {
                    return Err("Cannot take a Union of no types".to_string());
                }
                Ok(TypeExpr::union(members))
            }
            "Optional" => match args.as_deref() {
                Some([inner]) => Ok(TypeExpr::optional(inner.clone())),
                _ => Err("Optional requires exactly one type argument".to_string()),
            },
            "list" | "dict" | "set" | "tuple" => {
                let ctor = container(name);
                match args {
                    None => Ok(TypeExpr::Concrete(ctor)),
                    Some(args) => checked_generic(ctor, args),
                }
            }
            "List" | "Dict" | "Set" | "Tuple" | "Iterator" => {
                let ctor = container(name);
                match args {
                    None => Ok(TypeExpr::open(ctor)),
                    Some(args) => checked_generic(ctor, args),
                }
            }
            _ => match args {
                None => Ok(TypeExpr::class(name)),
                Some(args) => Ok(TypeExpr::generic(TypeCtor::Class(name.to_string()), args)),
            },
        }
    }
}

fn container(name: &str) -> TypeCtor {
    match name.to_ascii_lowercase().as_str() {
        "dict" => TypeCtor::Dict,
        "set" => TypeCtor::Set,
        "tuple" => TypeCtor::Tuple,
        "iterator" => TypeCtor::Iterator,
        _ => TypeCtor::List,
    }
}

fn checked_generic(ctor: TypeCtor, args: Vec<TypeExpr>) -> Result<TypeExpr, String> {
    let expected = match ctor {
        TypeCtor::List | TypeCtor::Set | TypeCtor::Iterator => Some(1),
        TypeCtor::Dict => Some(2),
        _ => None,
    };
    match expected {
        Some(n) if n != args.len() => Err(format!(
            "{} expects {n} type argument(s), found {}",
            ctor.generic_name(),
            args.len()
        )),
        _ => Ok(TypeExpr::generic(ctor, args)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> TypeExpr {
        AnnotationParser::new().parse(text).unwrap()
    }

    #[test]
    fn test_parse_builtins() {
        assert_eq!(parse("int"), TypeExpr::int());
        assert_eq!(parse("None"), TypeExpr::NullType);
        assert_eq!(parse("Any"), TypeExpr::Any);
        assert_eq!(parse("typing.Any"), TypeExpr::Any);
        assert_eq!(parse("list"), TypeExpr::Concrete(TypeCtor::List));
    }

    #[test]
    fn test_parse_containers() {
        assert_eq!(parse("List[int]"), TypeExpr::list(TypeExpr::int()));
        assert_eq!(parse("dict[str, int]"), TypeExpr::dict(TypeExpr::string(), TypeExpr::int()));
        assert_eq!(parse("Tuple"), TypeExpr::open(TypeCtor::Tuple));
        assert_eq!(parse("Tuple[()]"), TypeExpr::tuple(vec![]));
        assert_eq!(
            parse("Tuple[int, List[str]]"),
            TypeExpr::tuple(vec![TypeExpr::int(), TypeExpr::list(TypeExpr::string())])
        );
        assert_eq!(parse("Iterator[float]"), TypeExpr::iterator(TypeExpr::float()));
    }

    #[test]
    fn test_parse_unions() {
        let expected = TypeExpr::union(vec![TypeExpr::int(), TypeExpr::string()]);
        assert_eq!(parse("Union[int, str]"), expected);
        assert_eq!(parse("str | int"), expected);
        assert_eq!(parse("Optional[int]"), TypeExpr::optional(TypeExpr::int()));
        assert_eq!(parse("(int)"), TypeExpr::int());
    }

    #[test]
    fn test_parse_type_variables_and_classes() {
        let t = TypeVarDef::bounded("T", TypeExpr::int());
        let parser = AnnotationParser::new().with_var(t.clone());
        assert_eq!(parser.parse("List[T]").unwrap(), TypeExpr::list(TypeExpr::Var(t)));
        assert_eq!(parser.parse("Record").unwrap(), TypeExpr::class("Record"));
        assert_eq!(
            parser.parse("Batch[str]").unwrap(),
            TypeExpr::generic(TypeCtor::Class("Batch".to_string()), vec![TypeExpr::string()])
        );
    }

    #[test]
    fn test_malformed_annotations() {
        let parser = AnnotationParser::new();
        for text in [
            "",
            "   ",
            "List[int",
            "List[int, str]",
            "Dict[str]",
            "int[str]",
            "Union",
            "Union[()]",
            "3",
            "int,",
            "List[]",
        ] {
            let err = parser.parse(text).unwrap_err();
            assert!(
                matches!(err, TypingError::MalformedTypeExpression { .. }),
                "expected malformed error for {text:?}"
            );
        }
    }

    #[test]
    fn test_deep_nesting_rejected() {
        let parser = AnnotationParser::new();
        let nested = format!("{}int{}", "List[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert!(matches!(parser.parse(&nested), Err(TypingError::MalformedTypeExpression { .. })));

        let parens = format!("{}int{}", "(".repeat(100_000), ")".repeat(100_000));
        assert!(matches!(parser.parse(&parens), Err(TypingError::MalformedTypeExpression { .. })));

        let shallow = format!("{}int{}", "List[".repeat(MAX_DEPTH - 1), "]".repeat(MAX_DEPTH - 1));
        assert!(parser.parse(&shallow).is_ok());
    }
}
