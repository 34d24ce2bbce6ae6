//! Sandboxed `{{ expression }}` templates.
//!
//! Text outside the braces is copied as-is. Expressions can use literals,
//! arithmetic, comparisons, boolean logic and a fixed whitelist of functions
//! (see [`Builtin`]). Nothing else is nameable from a template, so there is
//! no route to the filesystem, processes or the network.

mod eval;
mod lexer;
mod parser;

use thiserror::Error;

use super::Facilities;

pub use parser::Builtin;

/// A template could not be parsed or evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{detail} (at byte {position})")]
pub struct TemplateError {
    pub detail: String,
    pub position: usize,
}

impl TemplateError {
    pub(crate) fn new(position: usize, detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            position,
        }
    }
}

/// A parsed template, ready to render any number of times.
#[derive(Debug, Clone)]
pub struct Template {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone)]
enum Segment {
    Text(String),
    Expr(parser::Expr),
}

const OPEN: &str = "{{";

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        while let Some(found) = source[cursor..].find(OPEN) {
            let open_at = cursor + found;
            if open_at > cursor {
                segments.push(Segment::Text(source[cursor..open_at].to_string()));
            }

            let body_start = open_at + OPEN.len();
            let (tokens, end) = lexer::lex_expression(source, body_start)?;
            let expr = parser::parse(&tokens, body_start)?;
            segments.push(Segment::Expr(expr));
            cursor = end;
        }

        if cursor < source.len() {
            segments.push(Segment::Text(source[cursor..].to_string()));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, facilities: &mut Facilities) -> Result<String, TemplateError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Expr(expr) => {
                    let value = eval::evaluate(expr, facilities)?;
                    out.push_str(&value.to_string());
                }
            }
        }
        Ok(out)
    }
}

/// Parse and render in one go.
pub fn render(source: &str, facilities: &mut Facilities) -> Result<String, TemplateError> {
    Template::parse(source)?.render(facilities)
}
