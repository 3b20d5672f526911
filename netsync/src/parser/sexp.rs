//! S-expression reader shared by the netlist, board and footprint parsers.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token at line {line}: {token}")]
    UnexpectedToken { line: usize, token: String },
    #[error("Trailing content after root expression at line {0}")]
    TrailingContent(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub enum SExp {
    Atom(String),
    List(Vec<SExp>),
}

impl SExp {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Atom(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// Leading atom of a list, e.g. `footprint` for `(footprint ...)`
    pub fn head(&self) -> Option<&str> {
        self.as_list()?.first()?.as_atom()
    }

    /// Atom at position `index` of a list (0 is the head)
    pub fn atom_at(&self, index: usize) -> Option<&str> {
        self.as_list()?.get(index)?.as_atom()
    }

    /// First child list whose head is `key`
    pub fn find(&self, key: &str) -> Option<&SExp> {
        self.as_list()?.iter().find(|item| item.head() == Some(key))
    }

    /// All child lists whose head is `key`
    pub fn find_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a SExp> + 'a {
        self.as_list()
            .unwrap_or(&[])
            .iter()
            .filter(move |item| item.head() == Some(key))
    }

    /// First argument of the child list `key`: `(key value)` gives `value`.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.find(key)?.atom_at(1)
    }

    pub fn f64_of(&self, key: &str) -> Option<f64> {
        self.value_of(key)?.parse().ok()
    }

    /// Whether a bare atom flag such as `locked` appears among the arguments
    pub fn has_flag(&self, flag: &str) -> bool {
        self.as_list()
            .map(|items| items.iter().skip(1).any(|i| i.as_atom() == Some(flag)))
            .unwrap_or(false)
    }

    /// Every atom after the head of the child list `key`
    pub fn atoms_of(&self, key: &str) -> Vec<String> {
        self.find(key)
            .and_then(|l| l.as_list())
            .map(|items| {
                items
                    .iter()
                    .skip(1)
                    .filter_map(|i| i.as_atom())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExp::Atom(s) => {
                let needs_quotes = s.is_empty()
                    || s.chars().any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '"');
                if needs_quotes {
                    write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
                } else {
                    write!(f, "{}", s)
                }
            }
            SExp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

pub struct SExpParser {
    input: Vec<char>,
    pos: usize,
    line: usize,
}

impl SExpParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
            line: 1,
        }
    }

    /// Parse exactly one root expression.
    pub fn parse(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(ParseError::UnexpectedEof);
        }
        let root = self.parse_sexp()?;
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(ParseError::TrailingContent(self.line));
        }
        Ok(root)
    }

    fn parse_sexp(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some('(') => self.parse_list(),
            Some(')') => Err(self.unexpected(")")),
            Some('"') => self.parse_string(),
            Some(_) => self.parse_symbol(),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, ParseError> {
        self.advance();
        let mut items = Vec::new();
        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof),
                Some(')') => {
                    self.advance();
                    return Ok(SExp::List(items));
                }
                Some(_) => items.push(self.parse_sexp()?),
            }
        }
    }

    fn parse_string(&mut self) -> Result<SExp, ParseError> {
        self.advance();
        let mut s = String::new();
        loop {
            let ch = self.peek().ok_or(ParseError::UnexpectedEof)?;
            self.advance();
            match ch {
                '"' => return Ok(SExp::Atom(s)),
                '\\' => {
                    let escaped = self.peek().ok_or(ParseError::UnexpectedEof)?;
                    self.advance();
                    s.push(match escaped {
                        'n' => '\n',
                        't' => '\t',
                        'r' => '\r',
                        other => other,
                    });
                }
                other => s.push(other),
            }
        }
    }

    fn parse_symbol(&mut self) -> Result<SExp, ParseError> {
        let mut s = String::new();
        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            s.push(ch);
            self.advance();
        }
        Ok(SExp::Atom(s))
    }

    fn skip_whitespace(&mut self) {
        while let Some(ch) = self.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek() {
            if ch == '\n' {
                self.line += 1;
            }
            self.pos += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    fn unexpected(&self, token: &str) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.line,
            token: token.to_string(),
        }
    }
}

/// Parse a whole document into its root expression
pub fn parse_document(content: &str) -> Result<SExp, ParseError> {
    SExpParser::new(content).parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_list() {
        let root = parse_document("(net (code \"1\") (name \"GND\"))").unwrap();
        assert_eq!(root.head(), Some("net"));
        assert_eq!(root.value_of("code"), Some("1"));
        assert_eq!(root.value_of("name"), Some("GND"));
    }

    #[test]
    fn test_escaped_string() {
        let root = parse_document(r#"(value "a \"quoted\" word")"#).unwrap();
        assert_eq!(root.atom_at(1), Some("a \"quoted\" word"));
    }

    #[test]
    fn test_find_all_and_flags() {
        let root = parse_document("(footprint \"R\" locked (pad 1) (pad 2) (layers F.Cu F.Mask))").unwrap();
        assert_eq!(root.find_all("pad").count(), 2);
        assert!(root.has_flag("locked"));
        assert_eq!(root.atoms_of("layers"), vec!["F.Cu", "F.Mask"]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(parse_document(""), Err(ParseError::UnexpectedEof)));
        assert!(matches!(parse_document("(a (b)"), Err(ParseError::UnexpectedEof)));
        assert!(matches!(parse_document("(a) (b)"), Err(ParseError::TrailingContent(1))));
        assert!(matches!(
            parse_document(")"),
            Err(ParseError::UnexpectedToken { line: 1, .. })
        ));
    }

    #[test]
    fn test_display_quotes_when_needed() {
        let root = parse_document("(name \"two words\" plain)").unwrap();
        assert_eq!(root.to_string(), "(name \"two words\" plain)");
    }
}
