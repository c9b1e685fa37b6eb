//! ECMAScript/TypeScript lexer - tokenizes source code into tokens
//!
//! The lexer is context-free: `/` is always scanned as a division punctuator
//! and `}` as a closing brace. The parser asks for a rescan when it knows a
//! regular expression or a template continuation is expected at that spot.

use core_types::{JsError, SourcePosition};

/// Reserved words.
///
/// Contextual words (`let`, `async`, `await`, `yield`, `static`, `of`,
/// `get`, `set` and every TypeScript modifier) are scanned as identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    /// break keyword
    Break,
    /// case keyword
    Case,
    /// catch keyword
    Catch,
    /// class keyword
    Class,
    /// const keyword
    Const,
    /// continue keyword
    Continue,
    /// debugger keyword
    Debugger,
    /// default keyword
    Default,
    /// delete keyword
    Delete,
    /// do keyword
    Do,
    /// else keyword
    Else,
    /// enum keyword
    Enum,
    /// export keyword
    Export,
    /// extends keyword
    Extends,
    /// false keyword
    False,
    /// finally keyword
    Finally,
    /// for keyword
    For,
    /// function keyword
    Function,
    /// if keyword
    If,
    /// import keyword
    Import,
    /// in keyword
    In,
    /// instanceof keyword
    Instanceof,
    /// new keyword
    New,
    /// null keyword
    Null,
    /// return keyword
    Return,
    /// super keyword
    Super,
    /// switch keyword
    Switch,
    /// this keyword
    This,
    /// throw keyword
    Throw,
    /// true keyword
    True,
    /// try keyword
    Try,
    /// typeof keyword
    Typeof,
    /// var keyword
    Var,
    /// void keyword
    Void,
    /// while keyword
    While,
    /// with keyword
    With,
}

impl Keyword {
    fn lookup(word: &str) -> Option<Keyword> {
        let keyword = match word {
            "break" => Keyword::Break,
            "case" => Keyword::Case,
            "catch" => Keyword::Catch,
            "class" => Keyword::Class,
            "const" => Keyword::Const,
            "continue" => Keyword::Continue,
            "debugger" => Keyword::Debugger,
            "default" => Keyword::Default,
            "delete" => Keyword::Delete,
            "do" => Keyword::Do,
            "else" => Keyword::Else,
            "enum" => Keyword::Enum,
            "export" => Keyword::Export,
            "extends" => Keyword::Extends,
            "false" => Keyword::False,
            "finally" => Keyword::Finally,
            "for" => Keyword::For,
            "function" => Keyword::Function,
            "if" => Keyword::If,
            "import" => Keyword::Import,
            "in" => Keyword::In,
            "instanceof" => Keyword::Instanceof,
            "new" => Keyword::New,
            "null" => Keyword::Null,
            "return" => Keyword::Return,
            "super" => Keyword::Super,
            "switch" => Keyword::Switch,
            "this" => Keyword::This,
            "throw" => Keyword::Throw,
            "true" => Keyword::True,
            "try" => Keyword::Try,
            "typeof" => Keyword::Typeof,
            "var" => Keyword::Var,
            "void" => Keyword::Void,
            "while" => Keyword::While,
            "with" => Keyword::With,
            _ => return None,
        };
        Some(keyword)
    }

    /// The source spelling of this keyword
    pub fn as_str(&self) -> &'static str {
        match self {
            Keyword::Break => "break",
            Keyword::Case => "case",
            Keyword::Catch => "catch",
            Keyword::Class => "class",
            Keyword::Const => "const",
            Keyword::Continue => "continue",
            Keyword::Debugger => "debugger",
            Keyword::Default => "default",
            Keyword::Delete => "delete",
            Keyword::Do => "do",
            Keyword::Else => "else",
            Keyword::Enum => "enum",
            Keyword::Export => "export",
            Keyword::Extends => "extends",
            Keyword::False => "false",
            Keyword::Finally => "finally",
            Keyword::For => "for",
            Keyword::Function => "function",
            Keyword::If => "if",
            Keyword::Import => "import",
            Keyword::In => "in",
            Keyword::Instanceof => "instanceof",
            Keyword::New => "new",
            Keyword::Null => "null",
            Keyword::Return => "return",
            Keyword::Super => "super",
            Keyword::Switch => "switch",
            Keyword::This => "this",
            Keyword::Throw => "throw",
            Keyword::True => "true",
            Keyword::Try => "try",
            Keyword::Typeof => "typeof",
            Keyword::Var => "var",
            Keyword::Void => "void",
            Keyword::While => "while",
            Keyword::With => "with",
        }
    }
}

/// Punctuators (operators and delimiters)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punctuator {
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `;`
    Semicolon,
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `...`
    Spread,
    /// `?.`
    OptionalChain,
    /// `:`
    Colon,
    /// `?`
    Question,
    /// `=`
    Assign,
    /// `=>`
    Arrow,
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `**`
    StarStar,
    /// `==`
    EqEq,
    /// `===`
    EqEqEq,
    /// `!=`
    NotEq,
    /// `!==`
    NotEqEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    AndAnd,
    /// `||`
    OrOr,
    /// `??`
    NullishCoalesce,
    /// `!`
    Not,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
    /// `~`
    Tilde,
    /// `<<`
    LtLt,
    /// `>>`
    GtGt,
    /// `>>>`
    GtGtGt,
    /// `+=`
    PlusEq,
    /// `-=`
    MinusEq,
    /// `*=`
    StarEq,
    /// `/=`
    SlashEq,
    /// `%=`
    PercentEq,
    /// `**=`
    StarStarEq,
    /// `&=`
    AndEq,
    /// `|=`
    OrEq,
    /// `^=`
    XorEq,
    /// `<<=`
    LtLtEq,
    /// `>>=`
    GtGtEq,
    /// `>>>=`
    GtGtGtEq,
    /// `&&=`
    AndAndEq,
    /// `||=`
    OrOrEq,
    /// `??=`
    NullishCoalesceEq,
    /// `++`
    PlusPlus,
    /// `--`
    MinusMinus,
    /// `@` (decorators, rejected by the parser)
    At,
}

impl Punctuator {
    /// The source spelling of this punctuator
    pub fn as_str(&self) -> &'static str {
        match self {
            Punctuator::LParen => "(",
            Punctuator::RParen => ")",
            Punctuator::LBrace => "{",
            Punctuator::RBrace => "}",
            Punctuator::LBracket => "[",
            Punctuator::RBracket => "]",
            Punctuator::Semicolon => ";",
            Punctuator::Comma => ",",
            Punctuator::Dot => ".",
            Punctuator::Spread => "...",
            Punctuator::OptionalChain => "?.",
            Punctuator::Colon => ":",
            Punctuator::Question => "?",
            Punctuator::Assign => "=",
            Punctuator::Arrow => "=>",
            Punctuator::Plus => "+",
            Punctuator::Minus => "-",
            Punctuator::Star => "*",
            Punctuator::Slash => "/",
            Punctuator::Percent => "%",
            Punctuator::StarStar => "**",
            Punctuator::EqEq => "==",
            Punctuator::EqEqEq => "===",
            Punctuator::NotEq => "!=",
            Punctuator::NotEqEq => "!==",
            Punctuator::Lt => "<",
            Punctuator::LtEq => "<=",
            Punctuator::Gt => ">",
            Punctuator::GtEq => ">=",
            Punctuator::AndAnd => "&&",
            Punctuator::OrOr => "||",
            Punctuator::NullishCoalesce => "??",
            Punctuator::Not => "!",
            Punctuator::And => "&",
            Punctuator::Or => "|",
            Punctuator::Xor => "^",
            Punctuator::Tilde => "~",
            Punctuator::LtLt => "<<",
            Punctuator::GtGt => ">>",
            Punctuator::GtGtGt => ">>>",
            Punctuator::PlusEq => "+=",
            Punctuator::MinusEq => "-=",
            Punctuator::StarEq => "*=",
            Punctuator::SlashEq => "/=",
            Punctuator::PercentEq => "%=",
            Punctuator::StarStarEq => "**=",
            Punctuator::AndEq => "&=",
            Punctuator::OrEq => "|=",
            Punctuator::XorEq => "^=",
            Punctuator::LtLtEq => "<<=",
            Punctuator::GtGtEq => ">>=",
            Punctuator::GtGtGtEq => ">>>=",
            Punctuator::AndAndEq => "&&=",
            Punctuator::OrOrEq => "||=",
            Punctuator::NullishCoalesceEq => "??=",
            Punctuator::PlusPlus => "++",
            Punctuator::MinusMinus => "--",
            Punctuator::At => "@",
        }
    }
}

/// One piece of a template literal between substitutions.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplatePart {
    /// Source text with line terminators normalized to `\n`
    pub raw: String,
    /// Escape-processed value; `None` when an escape is invalid
    pub cooked: Option<String>,
}

/// Token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Identifier, including contextual keywords
    Identifier(String),
    /// Private name `#name` (stored without the `#`)
    PrivateName(String),
    /// Number literal
    Number(f64),
    /// BigInt literal, digits with radix prefix and without the `n`
    BigInt(String),
    /// String literal (cooked value)
    String(String),
    /// Template without substitutions
    Template(TemplatePart),
    /// Template head: from `` ` `` to the first `${`
    TemplateHead(TemplatePart),
    /// Template middle: from `}` to the next `${`
    TemplateMiddle(TemplatePart),
    /// Template tail: from `}` to the closing `` ` ``
    TemplateTail(TemplatePart),
    /// Regular expression literal
    RegExp {
        /// Pattern source between the slashes
        pattern: String,
        /// Flags after the closing slash
        flags: String,
    },
    /// Keyword
    Keyword(Keyword),
    /// Punctuator/operator
    Punctuator(Punctuator),
    /// End of file
    EOF,
}

impl Token {
    /// Short human-readable description for error messages
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(name) => format!("identifier `{}`", name),
            Token::PrivateName(name) => format!("`#{}`", name),
            Token::Number(_) | Token::BigInt(_) => "number".to_string(),
            Token::String(_) => "string".to_string(),
            Token::Template(_)
            | Token::TemplateHead(_)
            | Token::TemplateMiddle(_)
            | Token::TemplateTail(_) => "template literal".to_string(),
            Token::RegExp { .. } => "regular expression".to_string(),
            Token::Keyword(k) => format!("`{}`", k.as_str()),
            Token::Punctuator(p) => format!("`{}`", p.as_str()),
            Token::EOF => "end of input".to_string(),
        }
    }
}

/// Saved lexer state for parser backtracking
#[derive(Debug, Clone)]
pub struct Checkpoint {
    position: usize,
    line: u32,
    column: u32,
    current_token: Option<Token>,
    token_start: (usize, u32, u32),
    line_terminator_before_token: bool,
    type_context: bool,
}

/// Lexer for ECMAScript/TypeScript source code
pub struct Lexer {
    chars: Vec<char>,
    position: usize,
    line: u32,
    column: u32,
    current_token: Option<Token>,
    token_start: (usize, u32, u32),
    /// True if a line terminator was crossed before the most recently scanned token
    pub line_terminator_before_token: bool,
    /// While set, `>` is never combined into `>>`, `>=` and friends
    pub type_context: bool,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        let mut lexer = Lexer {
            chars: source.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            current_token: None,
            token_start: (0, 1, 1),
            line_terminator_before_token: false,
            type_context: false,
        };
        lexer.skip_hashbang();
        lexer
    }

    fn skip_hashbang(&mut self) {
        if self.peek() == '#' && self.peek_next() == Some('!') {
            while !self.is_at_end() && !is_line_terminator(self.peek()) {
                self.advance();
            }
        }
    }

    /// Get the next token from the source
    pub fn next_token(&mut self) -> Result<Token, JsError> {
        if let Some(token) = self.current_token.take() {
            return Ok(token);
        }
        self.scan_token()
    }

    /// Peek at the next token without consuming it
    pub fn peek_token(&mut self) -> Result<&Token, JsError> {
        if self.current_token.is_none() {
            let token = self.scan_token()?;
            self.current_token = Some(token);
        }
        match &self.current_token {
            Some(token) => Ok(token),
            None => Err(JsError::syntax("Lexer lost its lookahead", Some(self.token_position()))),
        }
    }

    /// Position where the most recently scanned token starts
    pub fn token_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.token_start.1,
            column: self.token_start.2,
            offset: self.token_start.0,
        }
    }

    /// Save the lexer state
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            position: self.position,
            line: self.line,
            column: self.column,
            current_token: self.current_token.clone(),
            token_start: self.token_start,
            line_terminator_before_token: self.line_terminator_before_token,
            type_context: self.type_context,
        }
    }

    /// Restore a saved lexer state
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.position = checkpoint.position;
        self.line = checkpoint.line;
        self.column = checkpoint.column;
        self.current_token = checkpoint.current_token;
        self.token_start = checkpoint.token_start;
        self.line_terminator_before_token = checkpoint.line_terminator_before_token;
        self.type_context = checkpoint.type_context;
    }

    /// Drop the lookahead and move back to where it started
    fn rewind_to_token_start(&mut self) {
        self.current_token = None;
        self.position = self.token_start.0;
        self.line = self.token_start.1;
        self.column = self.token_start.2;
    }

    /// Rescan the current `/` or `/=` lookahead as a regular expression literal
    pub fn rescan_as_regexp(&mut self) -> Result<Token, JsError> {
        self.rewind_to_token_start();
        let start = self.current_position();
        self.advance(); // opening '/'

        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            if self.is_at_end() || is_line_terminator(self.peek()) {
                return Err(JsError::syntax("Unterminated regular expression", Some(start)));
            }
            let ch = self.advance();
            match ch {
                '\\' => {
                    pattern.push(ch);
                    if self.is_at_end() || is_line_terminator(self.peek()) {
                        return Err(JsError::syntax("Unterminated regular expression", Some(start)));
                    }
                    pattern.push(self.advance());
                }
                '[' => {
                    in_class = true;
                    pattern.push(ch);
                }
                ']' => {
                    in_class = false;
                    pattern.push(ch);
                }
                '/' if !in_class => break,
                _ => pattern.push(ch),
            }
        }

        let mut flags = String::new();
        while !self.is_at_end() && is_id_continue(self.peek()) {
            flags.push(self.advance());
        }
        Ok(Token::RegExp { pattern, flags })
    }

    /// Rescan the current `}` lookahead as the continuation of a template literal
    pub fn rescan_template_continuation(&mut self) -> Result<Token, JsError> {
        self.rewind_to_token_start();
        if self.peek() != '}' {
            return Err(JsError::syntax(
                "Expected `}` after template substitution",
                Some(self.current_position()),
            ));
        }
        self.advance();
        self.scan_template_part(false)
    }

    fn scan_token(&mut self) -> Result<Token, JsError> {
        let line_before = self.line;
        self.skip_whitespace_and_comments()?;
        self.line_terminator_before_token = self.line > line_before;
        self.token_start = (self.position, self.line, self.column);

        if self.is_at_end() {
            return Ok(Token::EOF);
        }

        let start_pos = self.current_position();
        let ch = self.advance();

        let punct = match ch {
            '(' => Punctuator::LParen,
            ')' => Punctuator::RParen,
            '{' => Punctuator::LBrace,
            '}' => Punctuator::RBrace,
            '[' => Punctuator::LBracket,
            ']' => Punctuator::RBracket,
            ';' => Punctuator::Semicolon,
            ',' => Punctuator::Comma,
            ':' => Punctuator::Colon,
            '~' => Punctuator::Tilde,
            '@' => Punctuator::At,

            '.' => {
                if self.peek() == '.' && self.peek_next() == Some('.') {
                    self.advance();
                    self.advance();
                    Punctuator::Spread
                } else if self.peek().is_ascii_digit() {
                    return self.scan_number('.');
                } else {
                    Punctuator::Dot
                }
            }

            '?' => {
                if self.match_char('?') {
                    if self.match_char('=') {
                        Punctuator::NullishCoalesceEq
                    } else {
                        Punctuator::NullishCoalesce
                    }
                } else if self.peek() == '.'
                    && !self.peek_next().is_some_and(|c| c.is_ascii_digit())
                {
                    self.advance();
                    Punctuator::OptionalChain
                } else {
                    Punctuator::Question
                }
            }

            '=' => {
                if self.match_char('>') {
                    Punctuator::Arrow
                } else if self.match_char('=') {
                    if self.match_char('=') {
                        Punctuator::EqEqEq
                    } else {
                        Punctuator::EqEq
                    }
                } else {
                    Punctuator::Assign
                }
            }

            '+' => {
                if self.match_char('+') {
                    Punctuator::PlusPlus
                } else if self.match_char('=') {
                    Punctuator::PlusEq
                } else {
                    Punctuator::Plus
                }
            }

            '-' => {
                if self.match_char('-') {
                    Punctuator::MinusMinus
                } else if self.match_char('=') {
                    Punctuator::MinusEq
                } else {
                    Punctuator::Minus
                }
            }

            '*' => {
                if self.match_char('*') {
                    if self.match_char('=') {
                        Punctuator::StarStarEq
                    } else {
                        Punctuator::StarStar
                    }
                } else if self.match_char('=') {
                    Punctuator::StarEq
                } else {
                    Punctuator::Star
                }
            }

            '/' => {
                if self.match_char('=') {
                    Punctuator::SlashEq
                } else {
                    Punctuator::Slash
                }
            }

            '%' => {
                if self.match_char('=') {
                    Punctuator::PercentEq
                } else {
                    Punctuator::Percent
                }
            }

            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        Punctuator::NotEqEq
                    } else {
                        Punctuator::NotEq
                    }
                } else {
                    Punctuator::Not
                }
            }

            '<' => {
                if self.match_char('<') {
                    if self.match_char('=') {
                        Punctuator::LtLtEq
                    } else {
                        Punctuator::LtLt
                    }
                } else if self.match_char('=') {
                    Punctuator::LtEq
                } else {
                    Punctuator::Lt
                }
            }

            '>' => {
                if self.type_context {
                    Punctuator::Gt
                } else if self.match_char('>') {
                    if self.match_char('>') {
                        if self.match_char('=') {
                            Punctuator::GtGtGtEq
                        } else {
                            Punctuator::GtGtGt
                        }
                    } else if self.match_char('=') {
                        Punctuator::GtGtEq
                    } else {
                        Punctuator::GtGt
                    }
                } else if self.match_char('=') {
                    Punctuator::GtEq
                } else {
                    Punctuator::Gt
                }
            }

            '&' => {
                if self.match_char('&') {
                    if self.match_char('=') {
                        Punctuator::AndAndEq
                    } else {
                        Punctuator::AndAnd
                    }
                } else if self.match_char('=') {
                    Punctuator::AndEq
                } else {
                    Punctuator::And
                }
            }

            '|' => {
                if self.match_char('|') {
                    if self.match_char('=') {
                        Punctuator::OrOrEq
                    } else {
                        Punctuator::OrOr
                    }
                } else if self.match_char('=') {
                    Punctuator::OrEq
                } else {
                    Punctuator::Or
                }
            }

            '^' => {
                if self.match_char('=') {
                    Punctuator::XorEq
                } else {
                    Punctuator::Xor
                }
            }

            '`' => return self.scan_template_part(true),
            '"' | '\'' => return self.scan_string(ch, start_pos),
            _ if ch.is_ascii_digit() => return self.scan_number(ch),
            '#' => {
                let name = self.scan_identifier_name(None, start_pos)?;
                return Ok(Token::PrivateName(name.0));
            }
            _ if is_id_start(ch) || ch == '\\' => {
                let (name, escaped) = self.scan_identifier_name(Some(ch), start_pos)?;
                if !escaped {
                    if let Some(keyword) = Keyword::lookup(&name) {
                        return Ok(Token::Keyword(keyword));
                    }
                }
                return Ok(Token::Identifier(name));
            }
            _ => {
                return Err(JsError::syntax(
                    format!("Unexpected character '{}'", ch),
                    Some(start_pos),
                ))
            }
        };
        Ok(Token::Punctuator(punct))
    }

    fn scan_string(&mut self, quote: char, start: SourcePosition) -> Result<Token, JsError> {
        let mut value = String::new();
        loop {
            if self.is_at_end() {
                return Err(JsError::syntax("Unterminated string literal", Some(start)));
            }
            let ch = self.peek();
            if ch == quote {
                self.advance();
                break;
            }
            if ch == '\n' || ch == '\r' {
                return Err(JsError::syntax("Unterminated string literal", Some(start)));
            }
            self.advance();
            if ch == '\\' {
                match self.scan_escape()? {
                    Some(cooked) => value.push_str(&cooked),
                    None => {
                        return Err(JsError::syntax(
                            "Invalid escape sequence in string literal",
                            Some(self.current_position()),
                        ))
                    }
                }
            } else {
                value.push(ch);
            }
        }
        Ok(Token::String(value))
    }

    /// Scan template characters after `` ` `` (head) or `}` (continuation).
    fn scan_template_part(&mut self, is_head: bool) -> Result<Token, JsError> {
        let start = self.current_position();
        let mut raw = String::new();
        let mut cooked = Some(String::new());

        loop {
            if self.is_at_end() {
                return Err(JsError::syntax("Unterminated template literal", Some(start)));
            }
            let ch = self.advance();
            match ch {
                '`' => {
                    let part = TemplatePart { raw, cooked };
                    return Ok(if is_head {
                        Token::Template(part)
                    } else {
                        Token::TemplateTail(part)
                    });
                }
                '$' if self.peek() == '{' => {
                    self.advance();
                    let part = TemplatePart { raw, cooked };
                    return Ok(if is_head {
                        Token::TemplateHead(part)
                    } else {
                        Token::TemplateMiddle(part)
                    });
                }
                '\\' => {
                    let escape_start = self.position;
                    let value = self.scan_escape()?;
                    raw.push('\\');
                    for c in &self.chars[escape_start..self.position] {
                        if *c != '\r' {
                            raw.push(*c);
                        }
                    }
                    match (value, cooked.as_mut()) {
                        (Some(value), Some(buffer)) => buffer.push_str(&value),
                        _ => cooked = None,
                    }
                }
                '\r' => {
                    if self.peek() == '\n' {
                        self.advance();
                    }
                    self.new_line();
                    raw.push('\n');
                    if let Some(buffer) = cooked.as_mut() {
                        buffer.push('\n');
                    }
                }
                _ => {
                    if is_line_terminator(ch) {
                        self.new_line();
                    }
                    raw.push(ch);
                    if let Some(buffer) = cooked.as_mut() {
                        buffer.push(ch);
                    }
                }
            }
        }
    }

    /// Scan an escape sequence after the backslash.
    ///
    /// Returns `None` for escapes that are malformed, which strings reject and
    /// tagged templates tolerate.
    fn scan_escape(&mut self) -> Result<Option<String>, JsError> {
        if self.is_at_end() {
            return Err(JsError::syntax("Unterminated escape sequence", Some(self.current_position())));
        }
        let ch = self.advance();
        let value = match ch {
            'n' => "\n".to_string(),
            't' => "\t".to_string(),
            'r' => "\r".to_string(),
            'b' => "\u{0008}".to_string(),
            'f' => "\u{000C}".to_string(),
            'v' => "\u{000B}".to_string(),
            '0' if !self.peek().is_ascii_digit() => "\0".to_string(),
            '1'..='7' | '0' => {
                let mut code = ch.to_digit(8).unwrap_or(0);
                for _ in 0..2 {
                    match self.peek().to_digit(8) {
                        Some(d) if code * 8 + d <= 0o377 => {
                            code = code * 8 + d;
                            self.advance();
                        }
                        _ => break,
                    }
                }
                char::from_u32(code).map(String::from).unwrap_or_default()
            }
            'x' => match self.scan_hex_digits(2) {
                Some(code) => char::from_u32(code).map(String::from).unwrap_or_default(),
                None => return Ok(None),
            },
            'u' => match self.scan_unicode_escape_body() {
                Some(c) => c.to_string(),
                None => return Ok(None),
            },
            '\r' => {
                if self.peek() == '\n' {
                    self.advance();
                }
                self.new_line();
                String::new()
            }
            '\n' | '\u{2028}' | '\u{2029}' => {
                self.new_line();
                String::new()
            }
            other => other.to_string(),
        };
        Ok(Some(value))
    }

    fn scan_hex_digits(&mut self, count: usize) -> Option<u32> {
        let mut value = 0u32;
        for _ in 0..count {
            let digit = self.peek().to_digit(16)?;
            self.advance();
            value = value * 16 + digit;
        }
        Some(value)
    }

    /// Body of `\uXXXX` or `\u{X...}` after the `u`, combining surrogate pairs.
    fn scan_unicode_escape_body(&mut self) -> Option<char> {
        let code = if self.peek() == '{' {
            self.advance();
            let mut value = 0u32;
            let mut digits = 0;
            while let Some(d) = self.peek().to_digit(16) {
                self.advance();
                value = value.checked_mul(16)?.checked_add(d)?;
                digits += 1;
            }
            if digits == 0 || !self.match_char('}') || value > 0x10FFFF {
                return None;
            }
            value
        } else {
            self.scan_hex_digits(4)?
        };

        if (0xD800..0xDC00).contains(&code)
            && self.peek() == '\\'
            && self.peek_next() == Some('u')
        {
            let saved = (self.position, self.column);
            self.advance();
            self.advance();
            if let Some(low) = self.scan_hex_digits(4) {
                if (0xDC00..0xE000).contains(&low) {
                    let combined = 0x10000 + ((code - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(combined);
                }
            }
            self.position = saved.0;
            self.column = saved.1;
        }
        Some(char::from_u32(code).unwrap_or('\u{FFFD}'))
    }

    fn scan_number(&mut self, first: char) -> Result<Token, JsError> {
        let start = self.current_position();
        let mut digits = String::new();

        if first == '0' && matches!(self.peek(), 'x' | 'X' | 'o' | 'O' | 'b' | 'B') {
            let prefix = self.advance().to_ascii_lowercase();
            let radix = match prefix {
                'x' => 16,
                'o' => 8,
                _ => 2,
            };
            while self.peek().is_digit(radix) || self.peek() == '_' {
                let c = self.advance();
                if c != '_' {
                    digits.push(c);
                }
            }
            if digits.is_empty() {
                return Err(JsError::syntax("Invalid number literal", Some(start)));
            }
            if self.match_char('n') {
                return Ok(Token::BigInt(format!("0{}{}", prefix, digits)));
            }
            self.reject_identifier_after_number(start)?;
            let value = digits
                .chars()
                .fold(0f64, |acc, c| acc * radix as f64 + c.to_digit(radix).unwrap_or(0) as f64);
            return Ok(Token::Number(value));
        }

        // Legacy octal (017) and non-octal-decimal (08)
        if first == '0' && self.peek().is_ascii_digit() {
            while self.peek().is_ascii_digit() {
                digits.push(self.advance());
            }
            self.reject_identifier_after_number(start)?;
            if digits.chars().all(|c| c < '8') {
                let value = digits
                    .chars()
                    .fold(0f64, |acc, c| acc * 8.0 + c.to_digit(8).unwrap_or(0) as f64);
                return Ok(Token::Number(value));
            }
            return digits
                .parse::<f64>()
                .map(Token::Number)
                .map_err(|_| JsError::syntax("Invalid number literal", Some(start)));
        }

        let mut is_integer = true;
        if first == '.' {
            digits.push_str("0.");
            is_integer = false;
        } else {
            digits.push(first);
        }
        self.scan_decimal_digits(&mut digits);

        if first != '.' && self.peek() == '.' {
            self.advance();
            digits.push('.');
            is_integer = false;
            self.scan_decimal_digits(&mut digits);
        }

        if matches!(self.peek(), 'e' | 'E') {
            let next = self.peek_next();
            let has_sign = matches!(next, Some('+') | Some('-'));
            let after = if has_sign {
                self.chars.get(self.position + 2).copied()
            } else {
                next
            };
            if after.is_some_and(|c| c.is_ascii_digit()) {
                is_integer = false;
                digits.push(self.advance());
                if has_sign {
                    digits.push(self.advance());
                }
                self.scan_decimal_digits(&mut digits);
            }
        }

        if is_integer && self.match_char('n') {
            return Ok(Token::BigInt(digits));
        }
        self.reject_identifier_after_number(start)?;

        digits
            .parse::<f64>()
            .map(Token::Number)
            .map_err(|_| JsError::syntax("Invalid number literal", Some(start)))
    }

    fn scan_decimal_digits(&mut self, out: &mut String) {
        while self.peek().is_ascii_digit()
            || (self.peek() == '_' && self.peek_next().is_some_and(|c| c.is_ascii_digit()))
        {
            let c = self.advance();
            if c != '_' {
                out.push(c);
            }
        }
    }

    fn reject_identifier_after_number(&self, start: SourcePosition) -> Result<(), JsError> {
        if !self.is_at_end() && (is_id_start(self.peek()) || self.peek().is_ascii_digit()) {
            return Err(JsError::syntax(
                "Identifier starts immediately after numeric literal",
                Some(start),
            ));
        }
        Ok(())
    }

    /// Scan an identifier name. `first` is the already consumed start
    /// character, or `None` for private names after `#`.
    fn scan_identifier_name(
        &mut self,
        first: Option<char>,
        start: SourcePosition,
    ) -> Result<(String, bool), JsError> {
        let mut name = String::new();
        let mut escaped = false;

        let mut pending = first;
        loop {
            let ch = match pending.take() {
                Some(c) => c,
                None => {
                    if self.is_at_end() {
                        break;
                    }
                    let c = self.peek();
                    let allowed = if name.is_empty() {
                        is_id_start(c) || c == '\\'
                    } else {
                        is_id_continue(c) || c == '\\'
                    };
                    if !allowed {
                        break;
                    }
                    self.advance()
                }
            };
            if ch == '\\' {
                if !self.match_char('u') {
                    return Err(JsError::syntax("Invalid identifier escape", Some(start)));
                }
                match self.scan_unicode_escape_body() {
                    Some(c) if is_id_continue(c) => {
                        name.push(c);
                        escaped = true;
                    }
                    _ => return Err(JsError::syntax("Invalid identifier escape", Some(start))),
                }
            } else {
                name.push(ch);
            }
        }

        if name.is_empty() {
            return Err(JsError::syntax("Expected identifier name", Some(start)));
        }
        Ok((name, escaped))
    }

    fn skip_whitespace_and_comments(&mut self) -> Result<(), JsError> {
        while !self.is_at_end() {
            let ch = self.peek();
            match ch {
                '\r' => {
                    self.advance();
                    if self.peek() == '\n' {
                        self.advance();
                    }
                    self.new_line();
                }
                '\n' | '\u{2028}' | '\u{2029}' => {
                    self.advance();
                    self.new_line();
                }
                '/' if self.peek_next() == Some('/') => {
                    while !self.is_at_end() && !is_line_terminator(self.peek()) {
                        self.advance();
                    }
                }
                '/' if self.peek_next() == Some('*') => {
                    let start = self.current_position();
                    self.advance();
                    self.advance();
                    loop {
                        if self.is_at_end() {
                            return Err(JsError::syntax("Unterminated comment", Some(start)));
                        }
                        let c = self.advance();
                        if c == '*' && self.peek() == '/' {
                            self.advance();
                            break;
                        }
                        if c == '\r' {
                            if self.peek() == '\n' {
                                self.advance();
                            }
                            self.new_line();
                        } else if is_line_terminator(c) {
                            self.new_line();
                        }
                    }
                }
                _ if is_whitespace(ch) => {
                    self.advance();
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn new_line(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    fn is_at_end(&self) -> bool {
        self.position >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.position).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> Option<char> {
        self.chars.get(self.position + 1).copied()
    }

    fn advance(&mut self) -> char {
        let ch = self.peek();
        self.position += 1;
        self.column += 1;
        ch
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.chars[self.position] != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn current_position(&self) -> SourcePosition {
        SourcePosition {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }
}

fn is_line_terminator(c: char) -> bool {
    matches!(c, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

fn is_whitespace(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\u{000B}' | '\u{000C}' | '\u{00A0}' | '\u{FEFF}')
        || (c as u32 > 0x7F && c.is_whitespace() && !is_line_terminator(c))
}

/// True if `ch` may start an identifier
pub fn is_id_start(ch: char) -> bool {
    ch == '$' || ch == '_' || ch.is_ascii_alphabetic() || (!ch.is_ascii() && ch.is_alphabetic())
}

/// True if `ch` may continue an identifier
pub fn is_id_continue(ch: char) -> bool {
    is_id_start(ch)
        || ch.is_ascii_digit()
        || ch == '\u{200C}'
        || ch == '\u{200D}'
        || (!ch.is_ascii() && ch.is_alphanumeric())
}

/// True if `name` can be written as a bare identifier
pub fn is_identifier_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_id_start(first) => chars.all(is_id_continue),
        _ => false,
    }
}

/// True if `name` can be used as a binding identifier
pub fn is_binding_identifier(name: &str) -> bool {
    is_identifier_name(name) && Keyword::lookup(name).is_none()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut out = Vec::new();
        loop {
            let token = lexer.next_token().unwrap();
            if token == Token::EOF {
                break;
            }
            out.push(token);
        }
        out
    }

    #[test]
    fn test_lexer_empty_source() {
        let mut lexer = Lexer::new("");
        assert_eq!(lexer.next_token().unwrap(), Token::EOF);
    }

    #[test]
    fn test_lexer_contextual_words_are_identifiers() {
        let toks = tokens("let async await of");
        assert!(toks.iter().all(|t| matches!(t, Token::Identifier(_))));
    }

    #[test]
    fn test_lexer_keywords() {
        assert_eq!(
            tokens("const function export"),
            vec![
                Token::Keyword(Keyword::Const),
                Token::Keyword(Keyword::Function),
                Token::Keyword(Keyword::Export)
            ]
        );
    }

    #[test]
    fn test_lexer_numbers() {
        assert_eq!(tokens("0x1F"), vec![Token::Number(31.0)]);
        assert_eq!(tokens("1_000"), vec![Token::Number(1000.0)]);
        assert_eq!(tokens(".5"), vec![Token::Number(0.5)]);
        assert_eq!(tokens("1e3"), vec![Token::Number(1000.0)]);
        assert_eq!(tokens("017"), vec![Token::Number(15.0)]);
        assert_eq!(tokens("10n"), vec![Token::BigInt("10".to_string())]);
        assert_eq!(tokens("0b101n"), vec![Token::BigInt("0b101".to_string())]);
    }

    #[test]
    fn test_lexer_number_followed_by_identifier_fails() {
        let mut lexer = Lexer::new("3in");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_lexer_string_escapes() {
        assert_eq!(
            tokens(r#"'a\n\x41\u{1F600}B'"#),
            vec![Token::String("a\nA\u{1F600}B".to_string())]
        );
    }

    #[test]
    fn test_lexer_unterminated_string() {
        let mut lexer = Lexer::new("\"abc\n\"");
        assert!(lexer.next_token().is_err());
    }

    #[test]
    fn test_lexer_template_parts() {
        let mut lexer = Lexer::new("`a${x}b\\n`");
        match lexer.next_token().unwrap() {
            Token::TemplateHead(part) => assert_eq!(part.raw, "a"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("x".to_string()));
        assert_eq!(lexer.peek_token().unwrap(), &Token::Punctuator(Punctuator::RBrace));
        match lexer.rescan_template_continuation().unwrap() {
            Token::TemplateTail(part) => {
                assert_eq!(part.raw, "b\\n");
                assert_eq!(part.cooked.as_deref(), Some("b\n"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_lexer_regexp_rescan() {
        let mut lexer = Lexer::new("/[/]+/gi.test");
        assert_eq!(lexer.peek_token().unwrap(), &Token::Punctuator(Punctuator::Slash));
        assert_eq!(
            lexer.rescan_as_regexp().unwrap(),
            Token::RegExp {
                pattern: "[/]+".to_string(),
                flags: "gi".to_string()
            }
        );
        assert_eq!(lexer.next_token().unwrap(), Token::Punctuator(Punctuator::Dot));
    }

    #[test]
    fn test_lexer_line_terminator_tracking() {
        let mut lexer = Lexer::new("a\n/* x\n */ b c");
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        assert!(lexer.line_terminator_before_token);
        lexer.next_token().unwrap();
        assert!(!lexer.line_terminator_before_token);
    }

    #[test]
    fn test_lexer_type_context_splits_greater_than() {
        let mut lexer = Lexer::new(">>=");
        lexer.type_context = true;
        assert_eq!(lexer.next_token().unwrap(), Token::Punctuator(Punctuator::Gt));
        lexer.type_context = false;
        assert_eq!(lexer.next_token().unwrap(), Token::Punctuator(Punctuator::GtEq));
    }

    #[test]
    fn test_lexer_checkpoint_restore() {
        let mut lexer = Lexer::new("a b");
        let saved = lexer.checkpoint();
        lexer.next_token().unwrap();
        lexer.next_token().unwrap();
        lexer.restore(saved);
        assert_eq!(lexer.next_token().unwrap(), Token::Identifier("a".to_string()));
    }

    #[test]
    fn test_lexer_optional_chain_vs_ternary_decimal() {
        assert_eq!(
            tokens("a?.b"),
            vec![
                Token::Identifier("a".to_string()),
                Token::Punctuator(Punctuator::OptionalChain),
                Token::Identifier("b".to_string())
            ]
        );
        assert_eq!(tokens("a?.5:1")[1], Token::Punctuator(Punctuator::Question));
    }

    #[test]
    fn test_lexer_private_name_and_hashbang() {
        assert_eq!(
            tokens("#!/usr/bin/env node\n#secret"),
            vec![Token::PrivateName("secret".to_string())]
        );
    }

    #[test]
    fn test_binding_identifier_excludes_reserved_words() {
        assert!(is_binding_identifier("value"));
        assert!(!is_binding_identifier("default"));
        assert!(!is_binding_identifier("my-name"));
    }
}
