//! Line tokenizer.
//!
//! Splits on whitespace and on the delimiters that show up in invoice rows:
//! parentheses, currency symbols, slashes and stray OCR punctuation.

/// Kind of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Plain run of non-delimiter characters.
    Word,
    /// Content between parentheses, without the parentheses.
    Paren,
    /// Word directly preceded by a currency symbol, without the symbol.
    Currency,
}

/// A token of a candidate line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub kind: TokenKind,
}

impl Token {
    fn new(text: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn has_digit(&self) -> bool {
        self.text.chars().any(|c| c.is_ascii_digit())
    }

    pub fn has_letter(&self) -> bool {
        self.text.chars().any(|c| c.is_alphabetic())
    }

    /// Text as it should appear in rebuilt product text.
    pub fn display(&self) -> String {
        match self.kind {
            TokenKind::Word => self.text.clone(),
            TokenKind::Paren => format!("({})", self.text),
            TokenKind::Currency => format!("${}", self.text),
        }
    }
}

fn is_currency_symbol(c: char) -> bool {
    matches!(c, '$' | '€' | '£')
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '/' | '\\' | '*' | '<' | '>' | '=' | '%' | '-' | '|' | ')')
}

/// Tokenize one line.
pub fn tokenize(line: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut currency_pending = false;
    let mut chars = line.chars().peekable();

    let flush = |current: &mut String, currency: &mut bool, tokens: &mut Vec<Token>| {
        if !current.is_empty() {
            let kind = if *currency {
                TokenKind::Currency
            } else {
                TokenKind::Word
            };
            tokens.push(Token::new(std::mem::take(current), kind));
            *currency = false;
        }
    };

    while let Some(c) = chars.next() {
        if c == '(' {
            flush(&mut current, &mut currency_pending, &mut tokens);
            currency_pending = false;
            let mut inner = String::new();
            for n in chars.by_ref() {
                if n == ')' {
                    break;
                }
                inner.push(n);
            }
            let inner = inner.trim();
            if !inner.is_empty() {
                tokens.push(Token::new(inner, TokenKind::Paren));
            }
        } else if is_currency_symbol(c) {
            flush(&mut current, &mut currency_pending, &mut tokens);
            currency_pending = true;
        } else if is_separator(c) {
            flush(&mut current, &mut currency_pending, &mut tokens);
        } else {
            current.push(c);
        }
    }
    flush(&mut current, &mut currency_pending, &mut tokens);

    tokens
}
