//! Field-selection query parser.
//!
//! Accepts the query subset of GraphQL used by requesters:
//!
//! ```text
//! query Name($v: T) {
//!   personalDetails(id: 1) { name surname }
//!   bankingDetails { iban }
//! }
//! ```
//!
//! and reduces it to one [`CollectionData`] per top-level field, listing the
//! names of that field's direct sub-fields. Arguments, aliases, variable
//! definitions and directives are accepted and skipped. Mutations,
//! subscriptions and fragments are rejected.

use crate::errors::QueryError;
use crate::types::CollectionData;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Name(String),
    Punct(char),
    /// String, number or variable; only ever skipped.
    Value,
    Spread,
}

#[derive(Debug, Clone)]
struct Spanned {
    token: Token,
    offset: usize,
}

fn lex(input: &str) -> Result<Vec<Spanned>, QueryError> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        match c {
            b' ' | b'\t' | b'\r' | b'\n' | b',' => i += 1,
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            b'{' | b'}' | b'(' | b')' | b':' | b'[' | b']' | b'!' | b'=' | b'@' => {
                tokens.push(Spanned { token: Token::Punct(c as char), offset: i });
                i += 1;
            }
            b'.' => {
                if input[i..].starts_with("...") {
                    tokens.push(Spanned { token: Token::Spread, offset: i });
                    i += 3;
                } else {
                    return Err(QueryError::UnexpectedToken { found: ".".into(), offset: i });
                }
            }
            b'"' => {
                let start = i;
                i += 1;
                loop {
                    match bytes.get(i) {
                        None => return Err(QueryError::UnterminatedString(start)),
                        Some(b'\\') => i += 2,
                        Some(b'"') => {
                            i += 1;
                            break;
                        }
                        Some(b'\n') => return Err(QueryError::UnterminatedString(start)),
                        Some(_) => i += 1,
                    }
                }
                tokens.push(Spanned { token: Token::Value, offset: start });
            }
            b'$' | b'-' | b'0'..=b'9' => {
                let start = i;
                i += 1;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || matches!(bytes[i], b'_' | b'.' | b'+' | b'-')) {
                    i += 1;
                }
                tokens.push(Spanned { token: Token::Value, offset: start });
            }
            c if c == b'_' || c.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && (bytes[i] == b'_' || bytes[i].is_ascii_alphanumeric()) {
                    i += 1;
                }
                tokens.push(Spanned {
                    token: Token::Name(input[start..i].to_string()),
                    offset: start,
                });
            }
            _ => {
                let found = input[i..].chars().next().map(String::from).unwrap_or_default();
                return Err(QueryError::UnexpectedToken { found, offset: i });
            }
        }
    }

    Ok(tokens)
}

/// Deepest selection set accepted. Only the top two levels are reported.
pub const MAX_DEPTH: usize = 32;

struct Selection {
    name: String,
    children: Vec<String>,
}

struct Parser {
    tokens: Vec<Spanned>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|s| &s.token)
    }

    fn next(&mut self) -> Result<Spanned, QueryError> {
        let tok = self.tokens.get(self.pos).cloned().ok_or(QueryError::UnexpectedEof)?;
        self.pos += 1;
        Ok(tok)
    }

    fn unexpected(tok: &Spanned) -> QueryError {
        let found = match &tok.token {
            Token::Name(n) => n.clone(),
            Token::Punct(c) => c.to_string(),
            Token::Value => "value".to_string(),
            Token::Spread => "...".to_string(),
        };
        QueryError::UnexpectedToken { found, offset: tok.offset }
    }

    fn expect_punct(&mut self, want: char) -> Result<(), QueryError> {
        let tok = self.next()?;
        match tok.token {
            Token::Punct(c) if c == want => Ok(()),
            _ => Err(Self::unexpected(&tok)),
        }
    }

    fn expect_name(&mut self) -> Result<String, QueryError> {
        let tok = self.next()?;
        match tok.token {
            Token::Name(n) => Ok(n),
            _ => Err(Self::unexpected(&tok)),
        }
    }

    /// Skip a balanced `( ... )` group.
    fn skip_parens(&mut self) -> Result<(), QueryError> {
        self.expect_punct('(')?;
        let mut depth = 1usize;
        while depth > 0 {
            match self.next()?.token {
                Token::Punct('(') => depth += 1,
                Token::Punct(')') => depth -= 1,
                _ => {}
            }
        }
        Ok(())
    }

    fn skip_directives(&mut self) -> Result<(), QueryError> {
        while self.peek() == Some(&Token::Punct('@')) {
            self.pos += 1;
            self.expect_name()?;
            if self.peek() == Some(&Token::Punct('(')) {
                self.skip_parens()?;
            }
        }
        Ok(())
    }

    fn document(&mut self) -> Result<Vec<CollectionData>, QueryError> {
        let mut collections = Vec::new();
        while self.peek().is_some() {
            collections.extend(self.operation()?);
        }
        Ok(collections)
    }

    fn operation(&mut self) -> Result<Vec<CollectionData>, QueryError> {
        match self.peek() {
            Some(Token::Punct('{')) => {}
            Some(Token::Name(keyword)) => {
                match keyword.as_str() {
                    "query" => {}
                    "mutation" | "subscription" | "fragment" => {
                        return Err(QueryError::Unsupported(keyword.clone()));
                    }
                    _ => return Err(Self::unexpected(&self.tokens[self.pos])),
                }
                self.pos += 1;
                if let Some(Token::Name(_)) = self.peek() {
                    self.pos += 1;
                }
                if self.peek() == Some(&Token::Punct('(')) {
                    self.skip_parens()?;
                }
                self.skip_directives()?;
            }
            Some(_) => return Err(Self::unexpected(&self.tokens[self.pos])),
            None => return Err(QueryError::UnexpectedEof),
        }

        Ok(self
            .selection_set(1)?
            .into_iter()
            .map(|selection| CollectionData {
                structure: selection.name,
                fields: selection.children,
            })
            .collect())
    }

    fn selection_set(&mut self, depth: usize) -> Result<Vec<Selection>, QueryError> {
        if depth > MAX_DEPTH {
            return Err(QueryError::TooDeep(MAX_DEPTH));
        }
        self.expect_punct('{')?;
        let mut out = Vec::new();
        loop {
            match self.peek() {
                Some(Token::Punct('}')) => {
                    self.pos += 1;
                    break;
                }
                Some(Token::Spread) => return Err(QueryError::Unsupported("fragment".into())),
                Some(_) => out.push(self.field(depth)?),
                None => return Err(QueryError::UnexpectedEof),
            }
        }
        if out.is_empty() {
            let offset = self.tokens[self.pos - 1].offset;
            return Err(QueryError::UnexpectedToken { found: "}".into(), offset });
        }
        Ok(out)
    }

    fn field(&mut self, depth: usize) -> Result<Selection, QueryError> {
        let mut name = self.expect_name()?;
        if self.peek() == Some(&Token::Punct(':')) {
            // alias: the second name is the selected field
            self.pos += 1;
            name = self.expect_name()?;
        }
        if self.peek() == Some(&Token::Punct('(')) {
            self.skip_parens()?;
        }
        self.skip_directives()?;

        let children = if self.peek() == Some(&Token::Punct('{')) {
            self.selection_set(depth + 1)?.into_iter().map(|s| s.name).collect()
        } else {
            Vec::new()
        };
        Ok(Selection { name, children })
    }
}

/// Parse `query` into its top-level collections and requested fields.
pub fn parse_query(query: &str) -> Result<Vec<CollectionData>, QueryError> {
    let tokens = lex(query)?;
    if tokens.is_empty() {
        return Err(QueryError::Empty);
    }
    Parser { tokens, pos: 0 }.document()
}
