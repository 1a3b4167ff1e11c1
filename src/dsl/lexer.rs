//! Lexer (tokenizer) for preset files.

use crate::error::{ReceiverError, Result};

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// The kind of token
    pub kind: TokenKind,
    /// The token's text
    pub text: String,
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
}

/// Token types in a preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A parameter name or a symbolic value (`rectifier`, `bridge`)
    Identifier,
    /// A number, possibly with an SI suffix
    Number,
    /// A directive (starts with '.')
    Directive,
    /// Equals sign '='
    Equals,
    /// Newline
    Newline,
    /// End of file
    Eof,
}

/// Lexer for tokenizing preset input.
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    /// Create a new lexer for the given input.
    pub fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Result<Token> {
        self.skip_whitespace_and_comments();

        let line = self.line;
        let column = self.column;
        let token = |kind, text: String| Token {
            kind,
            text,
            line,
            column,
        };

        let ch = match self.chars.peek().copied() {
            Some(ch) => ch,
            None => return Ok(token(TokenKind::Eof, String::new())),
        };

        let tok = match ch {
            '\n' => {
                self.advance();
                token(TokenKind::Newline, "\n".to_string())
            }
            '.' => {
                self.advance();
                let name = self.read_identifier();
                if name.is_empty() {
                    return Err(ReceiverError::lexer(line, column, "empty directive"));
                }
                token(TokenKind::Directive, format!(".{}", name))
            }
            '=' => {
                self.advance();
                token(TokenKind::Equals, "=".to_string())
            }
            '-' | '+' | '0'..='9' => {
                let text = self.read_number();
                if !text.chars().any(|c| c.is_ascii_digit()) {
                    return Err(ReceiverError::lexer(
                        line,
                        column,
                        format!("malformed number '{}'", text),
                    ));
                }
                token(TokenKind::Number, text)
            }
            _ if ch.is_alphabetic() || ch == '_' => {
                token(TokenKind::Identifier, self.read_identifier())
            }
            _ => {
                return Err(ReceiverError::lexer(
                    line,
                    column,
                    format!("unexpected character '{}'", ch),
                ));
            }
        };

        Ok(tok)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn advance_if(&mut self, pred: impl Fn(char) -> bool) -> Option<char> {
        match self.chars.peek() {
            Some(&ch) if pred(ch) => self.advance(),
            _ => None,
        }
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == ' ' || ch == '\t' || ch == '\r' {
                self.advance();
            } else if ch == '#' || ch == ';' {
                // Comment runs to end of line
                while self.advance_if(|c| c != '\n').is_some() {}
            } else {
                break;
            }
        }
    }

    fn read_identifier(&mut self) -> String {
        let mut text = String::new();
        while let Some(ch) = self.advance_if(|c| c.is_alphanumeric() || c == '_') {
            text.push(ch);
        }
        text
    }

    fn read_digits(&mut self, text: &mut String) {
        while let Some(ch) = self.advance_if(|c| c.is_ascii_digit()) {
            text.push(ch);
        }
    }

    fn read_number(&mut self) -> String {
        let mut text = String::new();

        if let Some(sign) = self.advance_if(|c| c == '-' || c == '+') {
            text.push(sign);
        }
        self.read_digits(&mut text);

        if let Some(dot) = self.advance_if(|c| c == '.') {
            text.push(dot);
            self.read_digits(&mut text);
        }

        if let Some(e) = self.advance_if(|c| c == 'e' || c == 'E') {
            text.push(e);
            if let Some(sign) = self.advance_if(|c| c == '-' || c == '+') {
                text.push(sign);
            }
            self.read_digits(&mut text);
        }

        if let Some(suffix) = self.advance_if(is_unit_suffix) {
            text.push(suffix);
        }

        text
    }
}

fn is_unit_suffix(ch: char) -> bool {
    matches!(ch, 'p' | 'n' | 'u' | 'µ' | 'm' | 'k' | 'K' | 'M' | 'G')
}

/// Parse a number string with optional SI suffix (`100u`, `10k`, `2.2M`).
pub fn parse_value(text: &str) -> Option<f64> {
    let text = text.trim();
    let last = text.chars().last()?;

    let multiplier = match last {
        'p' => 1e-12,
        'n' => 1e-9,
        'u' | 'µ' => 1e-6,
        'm' => 1e-3,
        'k' | 'K' => 1e3,
        'M' => 1e6,
        'G' => 1e9,
        _ => 1.0,
    };
    let digits = if is_unit_suffix(last) {
        &text[..text.len() - last.len_utf8()]
    } else {
        text
    };

    digits
        .parse::<f64>()
        .ok()
        .map(|v| v * multiplier)
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token().unwrap();
            out.push(tok.kind);
            if tok.kind == TokenKind::Eof {
                return out;
            }
        }
    }

    #[test]
    fn test_parse_value() {
        assert_relative_eq!(parse_value("10k").unwrap(), 10_000.0);
        assert_relative_eq!(parse_value("100n").unwrap(), 100e-9);
        assert_relative_eq!(parse_value("4.7u").unwrap(), 4.7e-6);
        assert_relative_eq!(parse_value("470µ").unwrap(), 470e-6);
        assert_relative_eq!(parse_value("1M").unwrap(), 1_000_000.0);
        assert_relative_eq!(parse_value("2.2").unwrap(), 2.2);
        assert_relative_eq!(parse_value("1e-9").unwrap(), 1e-9);
        assert_relative_eq!(parse_value("-3.5").unwrap(), -3.5);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        assert_eq!(parse_value(""), None);
        assert_eq!(parse_value("k"), None);
        assert_eq!(parse_value("ten"), None);
        assert_eq!(parse_value("1e999"), None);
    }

    #[test]
    fn test_lexer_assignment() {
        let mut lexer = Lexer::new("capacitance = 470u");

        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Identifier);
        assert_eq!(tok.text, "capacitance");

        assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Equals);

        let tok = lexer.next_token().unwrap();
        assert_eq!(tok.kind, TokenKind::Number);
        assert_eq!(tok.text, "470u");
        assert_eq!(tok.column, 15);
    }

    #[test]
    fn test_lexer_directive_and_comments() {
        assert_eq!(
            kinds(".power on # switch it on\n; whole-line comment\n.seed 7"),
            vec![
                TokenKind::Directive,
                TokenKind::Identifier,
                TokenKind::Newline,
                TokenKind::Newline,
                TokenKind::Directive,
                TokenKind::Number,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lexer_tracks_lines() {
        let mut lexer = Lexer::new("\n\n  gain 3");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        let tok = lexer.next_token().unwrap();
        assert_eq!((tok.line, tok.column), (3, 3));
    }

    #[test]
    fn test_lexer_unexpected_character() {
        let mut lexer = Lexer::new("gain @");
        lexer.next_token().unwrap();
        let err = lexer.next_token().unwrap_err();
        assert!(matches!(
            err,
            ReceiverError::LexerError { line: 1, column: 6, .. }
        ));
    }
}
