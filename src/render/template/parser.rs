use super::lexer::{Spanned, Token};
use super::TemplateError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

impl BinaryOp {
    pub(super) fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "and",
            BinaryOp::Or => "or",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum UnaryOp {
    Neg,
    Not,
}

/// Functions a template may call. This list is the whole sandbox surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Random,
    Hour,
    Minute,
    Second,
    Day,
    Month,
    Year,
    Weekday,
    Now,
    Unix,
    Pad,
    Zpad,
    Min,
    Max,
    Abs,
    Len,
    Upper,
    Lower,
    Str,
    Int,
    Round,
}

impl Builtin {
    pub const ALL: [Builtin; 21] = [
        Builtin::Random,
        Builtin::Hour,
        Builtin::Minute,
        Builtin::Second,
        Builtin::Day,
        Builtin::Month,
        Builtin::Year,
        Builtin::Weekday,
        Builtin::Now,
        Builtin::Unix,
        Builtin::Pad,
        Builtin::Zpad,
        Builtin::Min,
        Builtin::Max,
        Builtin::Abs,
        Builtin::Len,
        Builtin::Upper,
        Builtin::Lower,
        Builtin::Str,
        Builtin::Int,
        Builtin::Round,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Builtin::Random => "random",
            Builtin::Hour => "hour",
            Builtin::Minute => "minute",
            Builtin::Second => "second",
            Builtin::Day => "day",
            Builtin::Month => "month",
            Builtin::Year => "year",
            Builtin::Weekday => "weekday",
            Builtin::Now => "now",
            Builtin::Unix => "unix",
            Builtin::Pad => "pad",
            Builtin::Zpad => "zpad",
            Builtin::Min => "min",
            Builtin::Max => "max",
            Builtin::Abs => "abs",
            Builtin::Len => "len",
            Builtin::Upper => "upper",
            Builtin::Lower => "lower",
            Builtin::Str => "str",
            Builtin::Int => "int",
            Builtin::Round => "round",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    fn accepts(self, argc: usize) -> bool {
        match self {
            Builtin::Random => argc == 0 || argc == 2,
            Builtin::Hour
            | Builtin::Minute
            | Builtin::Second
            | Builtin::Day
            | Builtin::Month
            | Builtin::Year
            | Builtin::Weekday
            | Builtin::Unix => argc == 0,
            Builtin::Now
            | Builtin::Abs
            | Builtin::Len
            | Builtin::Upper
            | Builtin::Lower
            | Builtin::Str
            | Builtin::Int
            | Builtin::Round => argc == 1,
            Builtin::Pad | Builtin::Zpad | Builtin::Min | Builtin::Max => argc == 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(super) enum Expr {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
        position: usize,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        position: usize,
    },
    Call {
        function: Builtin,
        args: Vec<Expr>,
        position: usize,
    },
}

/// Parse one expression. `start` is used for errors on empty input.
pub(super) fn parse(tokens: &[Spanned], start: usize) -> Result<Expr, TemplateError> {
    if tokens.is_empty() {
        return Err(TemplateError::new(start, "empty expression"));
    }

    let mut parser = Parser {
        tokens,
        index: 0,
        start,
        depth: 0,
    };
    let expr = parser.or_expr()?;
    if let Some(extra) = parser.peek_spanned() {
        return Err(TemplateError::new(
            extra.position,
            format!("unexpected {}", describe(&extra.token)),
        ));
    }
    Ok(expr)
}

/// Deepest allowed nesting of parentheses, calls and unary operators.
const MAX_NESTING: usize = 64;

struct Parser<'a> {
    tokens: &'a [Spanned],
    index: usize,
    start: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek_spanned(&self) -> Option<&Spanned> {
        self.tokens.get(self.index)
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_spanned().map(|s| &s.token)
    }

    fn position(&self) -> usize {
        self.peek_spanned()
            .or_else(|| self.tokens.last())
            .map_or(self.start, |s| s.position)
    }

    fn advance(&mut self) -> Option<&Spanned> {
        let spanned = self.tokens.get(self.index);
        if spanned.is_some() {
            self.index += 1;
        }
        spanned
    }

    /// Run `f` one nesting level deeper, failing past [`MAX_NESTING`].
    fn nested<T>(
        &mut self,
        position: usize,
        f: impl FnOnce(&mut Self) -> Result<T, TemplateError>,
    ) -> Result<T, TemplateError> {
        if self.depth >= MAX_NESTING {
            return Err(TemplateError::new(position, "expression nested too deeply"));
        }
        self.depth += 1;
        let result = f(self);
        self.depth -= 1;
        result
    }

    fn peek_keyword(&self, keyword: &str) -> bool {
        matches!(self.peek(), Some(Token::Ident(name)) if name == keyword)
    }

    fn expect(&mut self, expected: &Token, what: &str) -> Result<(), TemplateError> {
        match self.peek() {
            Some(token) if token == expected => {
                self.index += 1;
                Ok(())
            }
            Some(other) => Err(TemplateError::new(
                self.position(),
                format!("expected {what}, found {}", describe(other)),
            )),
            None => Err(TemplateError::new(
                self.position(),
                format!("expected {what} before '}}}}'"),
            )),
        }
    }

    fn or_expr(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.and_expr()?;
        while self.peek_keyword("or") {
            let position = self.position();
            self.index += 1;
            let rhs = self.and_expr()?;
            lhs = binary(BinaryOp::Or, lhs, rhs, position);
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.not_expr()?;
        while self.peek_keyword("and") {
            let position = self.position();
            self.index += 1;
            let rhs = self.not_expr()?;
            lhs = binary(BinaryOp::And, lhs, rhs, position);
        }
        Ok(lhs)
    }

    fn not_expr(&mut self) -> Result<Expr, TemplateError> {
        if self.peek_keyword("not") {
            let position = self.position();
            self.index += 1;
            let operand = self.nested(position, Self::not_expr)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
                position,
            });
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Expr, TemplateError> {
        let lhs = self.additive()?;
        let op = match self.peek() {
            Some(Token::EqEq) => BinaryOp::Eq,
            Some(Token::NotEq) => BinaryOp::Ne,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(lhs),
        };
        let position = self.position();
        self.index += 1;
        let rhs = self.additive()?;
        Ok(binary(op, lhs, rhs, position))
    }

    fn additive(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(lhs),
            };
            let position = self.position();
            self.index += 1;
            let rhs = self.multiplicative()?;
            lhs = binary(op, lhs, rhs, position);
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, TemplateError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                Some(Token::Percent) => BinaryOp::Rem,
                _ => return Ok(lhs),
            };
            let position = self.position();
            self.index += 1;
            let rhs = self.unary()?;
            lhs = binary(op, lhs, rhs, position);
        }
    }

    fn unary(&mut self) -> Result<Expr, TemplateError> {
        if matches!(self.peek(), Some(Token::Minus)) {
            let position = self.position();
            self.index += 1;
            let operand = self.nested(position, Self::unary)?;
            return Ok(Expr::Unary {
                op: UnaryOp::Neg,
                operand: Box::new(operand),
                position,
            });
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, TemplateError> {
        let position = self.position();
        let Some(spanned) = self.advance() else {
            return Err(TemplateError::new(position, "expected a value"));
        };

        match spanned.token.clone() {
            Token::Int(n) => Ok(Expr::Int(n)),
            Token::Float(f) => Ok(Expr::Float(f)),
            Token::Str(s) => Ok(Expr::Str(s)),
            Token::LParen => {
                let inner = self.nested(position, Self::or_expr)?;
                self.expect(&Token::RParen, "')'")?;
                Ok(inner)
            }
            Token::Ident(name) => self.identifier(name, position),
            other => Err(TemplateError::new(
                position,
                format!("unexpected {}", describe(&other)),
            )),
        }
    }

    fn identifier(&mut self, name: String, position: usize) -> Result<Expr, TemplateError> {
        match name.as_str() {
            "true" => return Ok(Expr::Bool(true)),
            "false" => return Ok(Expr::Bool(false)),
            _ => {}
        }

        if !matches!(self.peek(), Some(Token::LParen)) {
            return Err(TemplateError::new(
                position,
                format!("unknown name '{name}', only whitelisted functions are available"),
            ));
        }

        let Some(function) = Builtin::from_name(&name) else {
            return Err(TemplateError::new(
                position,
                format!("unknown function '{name}', only whitelisted functions are available"),
            ));
        };

        self.index += 1;
        let mut args = Vec::new();
        if !matches!(self.peek(), Some(Token::RParen)) {
            loop {
                args.push(self.nested(position, Self::or_expr)?);
                if matches!(self.peek(), Some(Token::Comma)) {
                    self.index += 1;
                    continue;
                }
                break;
            }
        }
        self.expect(&Token::RParen, "')'")?;

        if !function.accepts(args.len()) {
            return Err(TemplateError::new(
                position,
                format!(
                    "{}() does not take {} argument(s)",
                    function.name(),
                    args.len()
                ),
            ));
        }

        Ok(Expr::Call {
            function,
            args,
            position,
        })
    }
}

fn binary(op: BinaryOp, lhs: Expr, rhs: Expr, position: usize) -> Expr {
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
        position,
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Int(n) => format!("number {n}"),
        Token::Float(f) => format!("number {f}"),
        Token::Str(_) => "string".to_string(),
        Token::Ident(name) => format!("'{name}'"),
        Token::LParen => "'('".to_string(),
        Token::RParen => "')'".to_string(),
        Token::Comma => "','".to_string(),
        Token::Plus => "'+'".to_string(),
        Token::Minus => "'-'".to_string(),
        Token::Star => "'*'".to_string(),
        Token::Slash => "'/'".to_string(),
        Token::Percent => "'%'".to_string(),
        Token::EqEq => "'=='".to_string(),
        Token::NotEq => "'!='".to_string(),
        Token::Lt => "'<'".to_string(),
        Token::Le => "'<='".to_string(),
        Token::Gt => "'>'".to_string(),
        Token::Ge => "'>='".to_string(),
    }
}
