use super::TemplateError;

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Ident(String),
    LParen,
    RParen,
    Comma,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    EqEq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Spanned {
    pub token: Token,
    pub position: usize,
}

const CLOSE: &str = "}}";

/// Tokenize an expression starting at `start` up to the closing `}}`.
///
/// Returns the tokens and the byte offset just past the closing braces.
pub(super) fn lex_expression(
    source: &str,
    start: usize,
) -> Result<(Vec<Spanned>, usize), TemplateError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = start;

    loop {
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() {
            pos += 1;
        }
        if pos >= bytes.len() {
            return Err(TemplateError::new(
                start,
                "unterminated expression, expected '}}'",
            ));
        }
        if source[pos..].starts_with(CLOSE) {
            return Ok((tokens, pos + CLOSE.len()));
        }

        let token_start = pos;
        let c = bytes[pos];
        let token = match c {
            b'(' => {
                pos += 1;
                Token::LParen
            }
            b')' => {
                pos += 1;
                Token::RParen
            }
            b',' => {
                pos += 1;
                Token::Comma
            }
            b'+' => {
                pos += 1;
                Token::Plus
            }
            b'-' => {
                pos += 1;
                Token::Minus
            }
            b'*' => {
                pos += 1;
                Token::Star
            }
            b'/' => {
                pos += 1;
                Token::Slash
            }
            b'%' => {
                pos += 1;
                Token::Percent
            }
            b'=' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::EqEq
            }
            b'!' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::NotEq
            }
            b'<' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::Le
            }
            b'<' => {
                pos += 1;
                Token::Lt
            }
            b'>' if bytes.get(pos + 1) == Some(&b'=') => {
                pos += 2;
                Token::Ge
            }
            b'>' => {
                pos += 1;
                Token::Gt
            }
            b'\'' | b'"' => {
                let (text, next) = lex_string(source, pos)?;
                pos = next;
                Token::Str(text)
            }
            b'0'..=b'9' => {
                let (token, next) = lex_number(source, pos)?;
                pos = next;
                token
            }
            c if c == b'_' || c.is_ascii_alphabetic() => {
                while pos < bytes.len() && (bytes[pos] == b'_' || bytes[pos].is_ascii_alphanumeric())
                {
                    pos += 1;
                }
                Token::Ident(source[token_start..pos].to_string())
            }
            _ => {
                let ch = source[pos..].chars().next().unwrap_or('?');
                return Err(TemplateError::new(
                    pos,
                    format!("unexpected character '{ch}'"),
                ));
            }
        };

        tokens.push(Spanned {
            token,
            position: token_start,
        });
    }
}

fn lex_string(source: &str, start: usize) -> Result<(String, usize), TemplateError> {
    let mut chars = source[start..].char_indices();
    let quote = match chars.next() {
        Some((_, q)) => q,
        None => return Err(TemplateError::new(start, "expected string")),
    };

    let mut text = String::new();
    while let Some((offset, ch)) = chars.next() {
        match ch {
            c if c == quote => return Ok((text, start + offset + c.len_utf8())),
            '\\' => match chars.next() {
                Some((_, 'n')) => text.push('\n'),
                Some((_, 't')) => text.push('\t'),
                Some((_, escaped)) => text.push(escaped),
                None => break,
            },
            other => text.push(other),
        }
    }

    Err(TemplateError::new(start, "unterminated string literal"))
}

fn lex_number(source: &str, start: usize) -> Result<(Token, usize), TemplateError> {
    let bytes = source.as_bytes();
    let mut pos = start;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }

    let is_float = bytes.get(pos) == Some(&b'.')
        && bytes.get(pos + 1).is_some_and(|b| b.is_ascii_digit());
    if is_float {
        pos += 1;
        while pos < bytes.len() && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        let text = &source[start..pos];
        let value = text
            .parse::<f64>()
            .map_err(|_| TemplateError::new(start, format!("invalid number '{text}'")))?;
        return Ok((Token::Float(value), pos));
    }

    let text = &source[start..pos];
    let value = text
        .parse::<i64>()
        .map_err(|_| TemplateError::new(start, format!("integer '{text}' is out of range")))?;
    Ok((Token::Int(value), pos))
}
