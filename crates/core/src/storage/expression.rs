//! Placeholder-based expression building and parsing.
//!
//! [`ExpressionBuilder`] renders key conditions, filters and update actions
//! into DynamoDB expression syntax, with every attribute name behind a `#nN`
//! placeholder and every value behind a `:vN` placeholder so reserved words
//! never collide. [`parse_update_expression`] goes the other way for native
//! updates handed to a backend that cannot execute them directly.

use std::collections::HashMap;

use serde_json::{Number, Value};

use super::query::{Filter, Index, KeyCondition, SortCondition};
use super::update::UpdateAction;
use super::{RepositoryError, Result};

// ============================================================================
// Builder
// ============================================================================

/// Placeholder maps collected while building one request's expressions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpressionAttributes {
    /// `#nN` -> attribute name
    pub names: HashMap<String, String>,
    /// `:vN` -> value
    pub values: HashMap<String, Value>,
}

#[derive(Debug, Default)]
pub struct ExpressionBuilder {
    attributes: ExpressionAttributes,
    placeholders: HashMap<String, String>,
    next_value: usize,
}

impl ExpressionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Placeholder for an attribute name; the same name reuses its placeholder.
    pub fn name(&mut self, attribute: &str) -> String {
        if let Some(existing) = self.placeholders.get(attribute) {
            return existing.clone();
        }
        let placeholder = format!("#n{}", self.placeholders.len());
        self.placeholders
            .insert(attribute.to_string(), placeholder.clone());
        self.attributes
            .names
            .insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    pub fn value(&mut self, value: Value) -> String {
        let placeholder = format!(":v{}", self.next_value);
        self.next_value += 1;
        self.attributes.values.insert(placeholder.clone(), value);
        placeholder
    }

    pub fn key_condition(&mut self, index: Index, condition: &KeyCondition) -> String {
        let pk = self.name(index.partition_attribute());
        let pk_value = self.value(Value::String(condition.partition.clone()));
        let partition = format!("{pk} = {pk_value}");

        let Some(sort) = &condition.sort else {
            return partition;
        };

        let sk = self.name(index.sort_attribute());
        let sort = match sort {
            SortCondition::Equals(v) => self.comparison(&sk, "=", v),
            SortCondition::LessThan(v) => self.comparison(&sk, "<", v),
            SortCondition::LessOrEqual(v) => self.comparison(&sk, "<=", v),
            SortCondition::GreaterThan(v) => self.comparison(&sk, ">", v),
            SortCondition::GreaterOrEqual(v) => self.comparison(&sk, ">=", v),
            SortCondition::Between(low, high) => {
                let low = self.value(Value::String(low.clone()));
                let high = self.value(Value::String(high.clone()));
                format!("{sk} BETWEEN {low} AND {high}")
            }
            SortCondition::BeginsWith(prefix) => {
                let prefix = self.value(Value::String(prefix.clone()));
                format!("begins_with({sk}, {prefix})")
            }
        };
        format!("{partition} AND {sort}")
    }

    fn comparison(&mut self, name: &str, operator: &str, value: &str) -> String {
        let value = self.value(Value::String(value.to_string()));
        format!("{name} {operator} {value}")
    }

    /// Renders a filter. Empty `And`/`Or` groups are rejected.
    pub fn filter(&mut self, filter: &Filter) -> Result<String> {
        let rendered = match filter {
            Filter::Equals(attr, value) => {
                let name = self.name(attr);
                let value = self.value(value.clone());
                format!("{name} = {value}")
            }
            Filter::NotEquals(attr, value) => {
                let name = self.name(attr);
                let value = self.value(value.clone());
                format!("{name} <> {value}")
            }
            Filter::BeginsWith(attr, prefix) => {
                let name = self.name(attr);
                let value = self.value(Value::String(prefix.clone()));
                format!("begins_with({name}, {value})")
            }
            Filter::Contains(attr, value) => {
                let name = self.name(attr);
                let value = self.value(value.clone());
                format!("contains({name}, {value})")
            }
            Filter::Exists(attr) => format!("attribute_exists({})", self.name(attr)),
            Filter::NotExists(attr) => format!("attribute_not_exists({})", self.name(attr)),
            Filter::And(filters) => self.group(filters, "AND")?,
            Filter::Or(filters) => self.group(filters, "OR")?,
        };
        Ok(rendered)
    }

    fn group(&mut self, filters: &[Filter], joiner: &str) -> Result<String> {
        if filters.is_empty() {
            return Err(RepositoryError::InvalidData(format!(
                "{joiner} filter needs at least one condition"
            )));
        }
        let parts = filters
            .iter()
            .map(|f| self.filter(f).map(|s| format!("({s})")))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(&format!(" {joiner} ")))
    }

    /// Renders update actions as `SET ... REMOVE ... ADD ...` clauses.
    pub fn update(&mut self, actions: &[UpdateAction]) -> String {
        let mut set = Vec::new();
        let mut remove = Vec::new();
        let mut add = Vec::new();

        for action in actions {
            match action {
                UpdateAction::Set { attribute, value } => {
                    let name = self.name(attribute);
                    let value = self.value(value.clone());
                    set.push(format!("{name} = {value}"));
                }
                UpdateAction::SetIfAbsent { attribute, value } => {
                    let name = self.name(attribute);
                    let value = self.value(value.clone());
                    set.push(format!("{name} = if_not_exists({name}, {value})"));
                }
                UpdateAction::Append { attribute, values } => {
                    let name = self.name(attribute);
                    let empty = self.value(Value::Array(Vec::new()));
                    let values = self.value(Value::Array(values.clone()));
                    set.push(format!(
                        "{name} = list_append(if_not_exists({name}, {empty}), {values})"
                    ));
                }
                UpdateAction::Add { attribute, value } => {
                    let name = self.name(attribute);
                    let value = self.value(Value::Number(value.clone()));
                    add.push(format!("{name} {value}"));
                }
                UpdateAction::Remove { attribute } => remove.push(self.name(attribute)),
            }
        }

        [("SET", set), ("REMOVE", remove), ("ADD", add)]
            .into_iter()
            .filter(|(_, items)| !items.is_empty())
            .map(|(keyword, items)| format!("{keyword} {}", items.join(", ")))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn finish(self) -> ExpressionAttributes {
        self.attributes
    }
}

// ============================================================================
// Parser
// ============================================================================

/// Parses a native update expression into normalized actions.
///
/// Supported forms, per clause:
/// - `SET path = :v`
/// - `SET path = path + :v` / `path - :v` (numeric increment)
/// - `SET path = if_not_exists(path, :v)`
/// - `SET path = list_append(path, :v)`, optionally with `if_not_exists`
/// - `REMOVE path`
/// - `ADD path :v` (numbers only)
///
/// Paths are top-level attribute names, written bare or as `#name`
/// placeholders.
pub fn parse_update_expression(
    expression: &str,
    names: &HashMap<String, String>,
    values: &HashMap<String, Value>,
) -> Result<Vec<UpdateAction>> {
    let tokens = tokenize(expression)?;
    Parser {
        tokens,
        pos: 0,
        names,
        values,
    }
    .parse()
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Word(String),
    Name(String),
    Value(String),
    Equals,
    Plus,
    Minus,
    Comma,
    LParen,
    RParen,
}

fn tokenize(expression: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = expression.chars().peekable();

    while let Some(&c) = chars.peek() {
        let token = match c {
            c if c.is_whitespace() => {
                chars.next();
                continue;
            }
            '=' => Token::Equals,
            '+' => Token::Plus,
            '-' => Token::Minus,
            ',' => Token::Comma,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '#' | ':' => {
                chars.next();
                let word = take_word(&mut chars);
                if word.is_empty() {
                    return Err(invalid(format!("dangling '{c}' in update expression")));
                }
                let placeholder = format!("{c}{word}");
                tokens.push(if c == '#' {
                    Token::Name(placeholder)
                } else {
                    Token::Value(placeholder)
                });
                continue;
            }
            c if is_word_char(c) => {
                tokens.push(Token::Word(take_word(&mut chars)));
                continue;
            }
            other => {
                return Err(invalid(format!(
                    "unexpected character '{other}' in update expression"
                )))
            }
        };
        chars.next();
        tokens.push(token);
    }

    Ok(tokens)
}

fn take_word(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if !is_word_char(c) {
            break;
        }
        word.push(c);
        chars.next();
    }
    word
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn invalid(message: String) -> RepositoryError {
    RepositoryError::InvalidData(message)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Clause {
    Set,
    Remove,
    Add,
}

#[derive(Debug, Clone, PartialEq)]
enum Operand {
    Path(String),
    Value(Value),
    IfNotExists(String, Box<Operand>),
    ListAppend(Box<Operand>, Box<Operand>),
}

struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    names: &'a HashMap<String, String>,
    values: &'a HashMap<String, Value>,
}

impl Parser<'_> {
    fn parse(mut self) -> Result<Vec<UpdateAction>> {
        let mut actions = Vec::new();

        while self.pos < self.tokens.len() {
            let clause = match self.next() {
                Some(Token::Word(word)) => match word.to_ascii_uppercase().as_str() {
                    "SET" => Clause::Set,
                    "REMOVE" => Clause::Remove,
                    "ADD" => Clause::Add,
                    other => return Err(invalid(format!("unsupported update clause '{other}'"))),
                },
                other => return Err(invalid(format!("expected update clause, got {other:?}"))),
            };

            loop {
                actions.push(self.item(clause)?);
                if self.peek() == Some(&Token::Comma) {
                    self.pos += 1;
                } else {
                    break;
                }
            }
        }

        Ok(actions)
    }

    fn item(&mut self, clause: Clause) -> Result<UpdateAction> {
        let attribute = self.path()?;
        match clause {
            Clause::Remove => Ok(UpdateAction::Remove { attribute }),
            Clause::Add => match self.operand()? {
                Operand::Value(Value::Number(value)) => Ok(UpdateAction::Add { attribute, value }),
                other => Err(invalid(format!(
                    "ADD on '{attribute}' needs a numeric value, got {other:?}"
                ))),
            },
            Clause::Set => {
                self.expect(Token::Equals)?;
                let left = self.operand()?;
                let arithmetic = match self.peek() {
                    Some(Token::Plus) | Some(Token::Minus) => {
                        let negate = self.next() == Some(Token::Minus);
                        Some((negate, self.operand()?))
                    }
                    _ => None,
                };
                lower_set(attribute, left, arithmetic)
            }
        }
    }

    fn operand(&mut self) -> Result<Operand> {
        match self.next() {
            Some(Token::Value(placeholder)) => self
                .values
                .get(&placeholder)
                .cloned()
                .map(Operand::Value)
                .ok_or_else(|| invalid(format!("unknown value placeholder '{placeholder}'"))),
            Some(Token::Name(placeholder)) => self.resolve_name(&placeholder).map(Operand::Path),
            Some(Token::Word(word)) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                let first = self.operand()?;
                self.expect(Token::Comma)?;
                let second = self.operand()?;
                self.expect(Token::RParen)?;
                match word.as_str() {
                    "if_not_exists" => match first {
                        Operand::Path(path) => Ok(Operand::IfNotExists(path, Box::new(second))),
                        other => Err(invalid(format!(
                            "if_not_exists needs a path first, got {other:?}"
                        ))),
                    },
                    "list_append" => Ok(Operand::ListAppend(Box::new(first), Box::new(second))),
                    other => Err(invalid(format!("unsupported function '{other}'"))),
                }
            }
            Some(Token::Word(word)) => Ok(Operand::Path(word)),
            other => Err(invalid(format!("expected operand, got {other:?}"))),
        }
    }

    fn path(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Name(placeholder)) => self.resolve_name(&placeholder),
            Some(Token::Word(word)) => Ok(word),
            other => Err(invalid(format!("expected attribute path, got {other:?}"))),
        }
    }

    fn resolve_name(&self, placeholder: &str) -> Result<String> {
        self.names
            .get(placeholder)
            .cloned()
            .ok_or_else(|| invalid(format!("unknown name placeholder '{placeholder}'")))
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            other => Err(invalid(format!("expected {expected:?}, got {other:?}"))),
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }
}

fn lower_set(
    attribute: String,
    left: Operand,
    arithmetic: Option<(bool, Operand)>,
) -> Result<UpdateAction> {
    match (left, arithmetic) {
        (Operand::Value(value), None) => Ok(UpdateAction::Set { attribute, value }),
        (Operand::Path(path), Some((negate, Operand::Value(Value::Number(n)))))
            if path == attribute =>
        {
            let value = if negate { negate_number(&n)? } else { n };
            Ok(UpdateAction::Add { attribute, value })
        }
        (Operand::IfNotExists(path, default), None) if path == attribute => match *default {
            Operand::Value(value) => Ok(UpdateAction::SetIfAbsent { attribute, value }),
            other => Err(invalid(format!(
                "if_not_exists default must be a value, got {other:?}"
            ))),
        },
        (Operand::ListAppend(list, tail), None) if targets(&list, &attribute) => match *tail {
            Operand::Value(Value::Array(values)) => Ok(UpdateAction::Append { attribute, values }),
            Operand::Value(value) => Ok(UpdateAction::Append {
                attribute,
                values: vec![value],
            }),
            other => Err(invalid(format!(
                "list_append needs a value to append, got {other:?}"
            ))),
        },
        (left, arithmetic) => Err(invalid(format!(
            "unsupported SET form for '{attribute}': {left:?} {arithmetic:?}"
        ))),
    }
}

fn targets(operand: &Operand, attribute: &str) -> bool {
    match operand {
        Operand::Path(path) | Operand::IfNotExists(path, _) => path == attribute,
        _ => false,
    }
}

fn negate_number(n: &Number) -> Result<Number> {
    if let Some(i) = n.as_i64() {
        return Ok(Number::from(-i));
    }
    n.as_f64()
        .and_then(|f| Number::from_f64(-f))
        .ok_or_else(|| invalid(format!("cannot negate {n}")))
}
