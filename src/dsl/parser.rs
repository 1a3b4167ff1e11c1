//! Parser for preset files.

use super::ast::{Assignment, Preset};
use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{ReceiverError, Result};

/// Parser for presets.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

impl<'a> Parser<'a> {
    /// Create a new parser with the given lexer.
    pub fn new(mut lexer: Lexer<'a>) -> Result<Self> {
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    /// Parse the entire preset.
    pub fn parse(&mut self) -> Result<Preset> {
        let mut preset = Preset::new();

        loop {
            match self.current.kind {
                TokenKind::Eof => break,
                TokenKind::Newline => {
                    self.advance()?;
                    continue;
                }
                TokenKind::Directive => self.parse_directive(&mut preset)?,
                TokenKind::Identifier => {
                    let assignment = self.parse_assignment()?;
                    preset.assignments.push(assignment);
                }
                _ => {
                    return Err(ReceiverError::parse(
                        self.current.line,
                        format!("unexpected token: {:?}", self.current.text),
                    ));
                }
            }
            self.end_of_line()?;
        }

        Ok(preset)
    }

    fn advance(&mut self) -> Result<()> {
        self.current = self.lexer.next_token()?;
        Ok(())
    }

    fn end_of_line(&mut self) -> Result<()> {
        match self.current.kind {
            TokenKind::Newline => self.advance(),
            TokenKind::Eof => Ok(()),
            _ => Err(ReceiverError::parse(
                self.current.line,
                format!("expected end of line, got {:?}", self.current.text),
            )),
        }
    }

    fn expect_value(&mut self, line: usize) -> Result<String> {
        match self.current.kind {
            TokenKind::Number | TokenKind::Identifier => {
                let text = std::mem::take(&mut self.current.text);
                self.advance()?;
                Ok(text)
            }
            _ => Err(ReceiverError::parse(line, "expected a value")),
        }
    }

    fn parse_assignment(&mut self) -> Result<Assignment> {
        let line = self.current.line;
        let name = std::mem::take(&mut self.current.text);
        self.advance()?;

        if self.current.kind == TokenKind::Equals {
            self.advance()?;
        }
        let value = self.expect_value(line)?;

        Ok(Assignment { name, value, line })
    }

    fn parse_directive(&mut self, preset: &mut Preset) -> Result<()> {
        let directive = self.current.text.to_lowercase();
        let line = self.current.line;
        self.advance()?;

        match directive.as_str() {
            ".power" => {
                let value = self.expect_value(line)?;
                preset.assignments.push(Assignment {
                    name: "power".to_string(),
                    value,
                    line,
                });
            }
            ".seed" => {
                let text = self.expect_value(line)?;
                let seed = text.parse::<u64>().map_err(|_| {
                    ReceiverError::parse(line, format!("invalid seed: {}", text))
                })?;
                preset.seed = Some(seed);
            }
            _ => {
                return Err(ReceiverError::parse(
                    line,
                    format!("unknown directive: {}", directive),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use crate::error::ReceiverError;

    #[test]
    fn test_parse_assignments() {
        let preset = parse("rectifier bridge\ncapacitance = 470u\n").unwrap();
        assert_eq!(preset.len(), 2);
        assert_eq!(preset.assignments[0].name, "rectifier");
        assert_eq!(preset.assignments[0].value, "bridge");
        assert_eq!(preset.assignments[1].value, "470u");
        assert_eq!(preset.assignments[1].line, 2);
    }

    #[test]
    fn test_parse_directives() {
        let preset = parse(".seed 42\n.power on").unwrap();
        assert_eq!(preset.seed, Some(42));
        assert_eq!(preset.value_of("power"), Some("on"));
    }

    #[test]
    fn test_parse_with_comments() {
        let input = "# mains receiver\n\nfrequency 60 ; line rate\n";
        let preset = parse(input).unwrap();
        assert_eq!(preset.len(), 1);
        assert_eq!(preset.assignments[0].line, 3);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = parse("gain 3\n.model D1").unwrap_err();
        assert!(matches!(err, ReceiverError::ParseError { line: 2, .. }));

        let err = parse("gain\n").unwrap_err();
        assert!(matches!(err, ReceiverError::ParseError { line: 1, .. }));

        let err = parse("gain 3 4").unwrap_err();
        assert!(matches!(err, ReceiverError::ParseError { line: 1, .. }));

        let err = parse(".seed -1").unwrap_err();
        assert!(matches!(err, ReceiverError::ParseError { line: 1, .. }));
    }
}
