use std::str::Chars;

use peekmore::{PeekMore, PeekMoreIterator};
use substring::Substring;

use crate::error::{Diagnostic, Diagnostics, ScanError};
use crate::literal::Literal;
use crate::token::{Token, Type};

const RESERVED: &[(&str, Type)] = &[
    ("and", Type::And),
    ("class", Type::Class),
    ("else", Type::Else),
    ("false", Type::False),
    ("for", Type::For),
    ("fun", Type::Fun),
    ("if", Type::If),
    ("nil", Type::Nil),
    ("or", Type::Or),
    ("print", Type::Print),
    ("return", Type::Return),
    ("super", Type::Super),
    ("this", Type::This),
    ("true", Type::True),
    ("var", Type::Var),
    ("while", Type::While),
];

/// Converts source text into a terminated token stream. Operates over chars
/// (not bytes) via `peekmore` so that two-character lookahead (`match_next`)
/// and `substring`-based lexeme slicing stay Unicode-safe.
pub struct Scanner<'a> {
    source: &'a str,
    chars: PeekMoreIterator<Chars<'a>>,
    tokens: Vec<Token>,
    start: usize,
    current: usize,
    line: usize,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Scanner<'a> {
        Scanner {
            source,
            chars: source.chars().peekmore(),
            tokens: Vec::new(),
            start: 0,
            current: 0,
            line: 1,
        }
    }

    /// Scans the whole source, reporting any lexical errors to `diagnostics`
    /// and continuing past them, and returns the resulting token sequence
    /// (always terminated by an `EOF` token).
    pub fn scan_tokens(&mut self, diagnostics: &mut Diagnostics) -> Vec<Token> {
        while !self.is_at_end() {
            self.start = self.current;
            self.scan_token(diagnostics);
        }

        self.tokens.push(Token::new(Type::EOF, String::new(), None, self.line));
        std::mem::take(&mut self.tokens)
    }

    fn is_at_end(&mut self) -> bool {
        self.chars.peek_nth(0).is_none()
    }

    fn advance(&mut self) -> char {
        let c = self.chars.next().expect("tried to advance past end of source");
        self.current += 1;
        c
    }

    fn peek(&mut self) -> char {
        *self.chars.peek_nth(0).unwrap_or(&'\0')
    }

    fn peek_next(&mut self) -> char {
        *self.chars.peek_nth(1).unwrap_or(&'\0')
    }

    fn match_next(&mut self, expected: char) -> bool {
        if self.peek() == expected {
            self.advance();
            true
        } else {
            false
        }
    }

    fn lexeme(&self) -> String {
        self.source.substring(self.start, self.current).to_string()
    }

    fn add_token(&mut self, r#type: Type, literal: Option<Literal>) {
        self.tokens.push(Token::new(r#type, self.lexeme(), literal, self.line));
    }

    fn scan_token(&mut self, diagnostics: &mut Diagnostics) {
        let c = self.advance();

        match c {
            '(' => self.add_token(Type::LeftParen, None),
            ')' => self.add_token(Type::RightParen, None),
            '{' => self.add_token(Type::LeftBrace, None),
            '}' => self.add_token(Type::RightBrace, None),
            ',' => self.add_token(Type::Comma, None),
            '.' => self.add_token(Type::Dot, None),
            '-' => self.add_token(Type::Minus, None),
            '+' => self.add_token(Type::Plus, None),
            ';' => self.add_token(Type::Semicolon, None),
            '*' => self.add_token(Type::Star, None),

            '!' => {
                let kind = if self.match_next('=') { Type::BangEqual } else { Type::Bang };
                self.add_token(kind, None);
            }
            '=' => {
                let kind = if self.match_next('=') { Type::EqualEqual } else { Type::Equal };
                self.add_token(kind, None);
            }
            '<' => {
                let kind = if self.match_next('=') { Type::LessEqual } else { Type::Less };
                self.add_token(kind, None);
            }
            '>' => {
                let kind = if self.match_next('=') { Type::GreaterEqual } else { Type::Greater };
                self.add_token(kind, None);
            }
            '/' => {
                if self.match_next('/') {
                    while self.peek() != '\n' && !self.is_at_end() {
                        self.advance();
                    }
                } else {
                    self.add_token(Type::Slash, None);
                }
            }

            ' ' | '\r' | '\t' => {}

            '\n' => {
                self.line += 1;
            }

            '"' => self.string(diagnostics),

            c if c.is_ascii_digit() => self.number(),

            c if c.is_alphabetic() || c == '_' => self.identifier(),

            c => {
                ScanError {
                    line: self.line,
                    message: format!("Unexpected character '{c}'."),
                }.report(diagnostics);
            }
        }
    }

    fn string(&mut self, diagnostics: &mut Diagnostics) {
        let start_line = self.line;

        while self.peek() != '"' && !self.is_at_end() {
            if self.peek() == '\n' {
                self.line += 1;
            }
            self.advance();
        }

        if self.is_at_end() {
            ScanError {
                line: start_line,
                message: "Unterminated string.".to_string(),
            }.report(diagnostics);
            return;
        }

        self.advance(); // the closing quote

        // Lexeme includes the quotes; literal is the unescaped interior.
        let value = self.source.substring(self.start + 1, self.current - 1).to_string();
        self.add_token(Type::String, Some(Literal::String(value)));
    }

    fn number(&mut self) {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        // A trailing '.' with no following digit is left unconsumed so it
        // scans as its own DOT token.
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let value: f64 = self.lexeme().parse().expect("scanned digits to form a valid number");
        self.add_token(Type::Number, Some(Literal::Number(value)));
    }

    fn identifier(&mut self) {
        while self.peek().is_alphanumeric() || self.peek() == '_' {
            self.advance();
        }

        let text = self.lexeme();
        let kind = RESERVED.iter()
            .find(|(word, _)| *word == text)
            .map(|(_, kind)| *kind)
            .unwrap_or(Type::Identifier);

        self.add_token(kind, None);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn scan(source: &str) -> Vec<Token> {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new(source).scan_tokens(&mut diagnostics);
        assert!(!diagnostics.had_error(), "unexpected scan error for {source:?}");
        tokens
    }

    fn types(source: &str) -> Vec<Type> {
        scan(source).into_iter().map(|t| t.r#type).collect()
    }

    #[test]
    fn single_and_double_char_tokens() {
        assert_eq!(types("!= == <= >= < > ="), vec![
            Type::BangEqual, Type::EqualEqual, Type::LessEqual, Type::GreaterEqual,
            Type::Less, Type::Greater, Type::Equal, Type::EOF,
        ]);
    }

    #[test]
    fn line_comment_is_discarded() {
        let tokens = scan("1 // comment\n2");
        assert_eq!(tokens.len(), 3); // two numbers + EOF
        assert_eq!(tokens[1].line, 2);
    }

    #[test]
    fn string_literal() {
        let tokens = scan("\"hello world\"");
        assert_eq!(tokens[0].r#type, Type::String);
        assert_eq!(tokens[0].literal, Some(Literal::String("hello world".to_string())));
    }

    #[test]
    fn unterminated_string_reports_error() {
        let mut diagnostics = Diagnostics::new();
        Scanner::new("\"abc").scan_tokens(&mut diagnostics);
        assert!(diagnostics.had_error());
    }

    #[test]
    fn number_literal_integer_and_fraction() {
        let tokens = scan("123 45.67");
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(45.67)));
    }

    #[test]
    fn trailing_dot_is_not_consumed() {
        let tokens = scan("123.");
        assert_eq!(tokens[0].r#type, Type::Number);
        assert_eq!(tokens[0].literal, Some(Literal::Number(123.0)));
        assert_eq!(tokens[1].r#type, Type::Dot);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(types("and class nil orbit"), vec![
            Type::And, Type::Class, Type::Nil, Type::Identifier, Type::EOF,
        ]);
    }

    #[test]
    fn unknown_character_reports_error_and_continues() {
        let mut diagnostics = Diagnostics::new();
        let tokens = Scanner::new("1 | 2").scan_tokens(&mut diagnostics);
        assert!(diagnostics.had_error());
        assert_eq!(tokens.iter().map(|t| t.r#type).collect::<Vec<_>>(), vec![
            Type::Number, Type::Number, Type::EOF,
        ]);
    }
}
