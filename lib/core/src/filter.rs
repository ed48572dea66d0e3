// Record filters for in-process connectors.
// Both predicate dialects compile down to the same FilterCondition tree.

use crate::error::{Error, Result};
use crate::record::Record;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::OnceLock;

pub trait Filter {
    fn matches(&self, record: &Record) -> bool;
}

#[derive(Debug, Clone)]
pub enum FilterCondition {
    Equals { field: String, value: Value },
    NotEquals { field: String, value: Value },
    GreaterThan { field: String, value: f64 },
    LessThan { field: String, value: f64 },
    GreaterEqual { field: String, value: f64 },
    LessEqual { field: String, value: f64 },
    Matches { field: String, pattern: Regex },
    In { field: String, values: Vec<Value> },
    And(Vec<FilterCondition>),
    Or(Vec<FilterCondition>),
}

/// A compiled predicate plus an optional row cap (`LIMIT n`)
#[derive(Debug, Clone)]
pub struct RecordFilter {
    condition: FilterCondition,
    limit: Option<usize>,
}

impl RecordFilter {
    pub fn new(condition: FilterCondition) -> Self {
        Self { condition, limit: None }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Compile a JSON filter document.
    ///
    /// Supports plain equality, `$eq $ne $gt $gte $lt $lte $regex $in`
    /// operators and `$and` / `$or` arrays.
    pub fn from_document(doc: &Map<String, Value>) -> Result<Self> {
        Ok(Self::new(compile_document(doc)?))
    }

    /// Compile a textual predicate: `[SELECT .. FROM .. WHERE] cond [AND|OR cond].. [LIMIT n]`
    pub fn parse_where(text: &str) -> Result<Self> {
        let mut body = text.trim().trim_end_matches(';').trim();

        let mut limit = None;
        if let Some(caps) = limit_regex().captures(body) {
            limit = caps[1].parse::<usize>().ok();
            let start = caps.get(0).map(|m| m.start()).unwrap_or(body.len());
            body = body[..start].trim();
        }

        if let Some(m) = where_regex().find(body) {
            body = body[m.end()..].trim();
        } else if select_regex().is_match(body) {
            // SELECT without WHERE selects everything
            return Ok(Self {
                condition: FilterCondition::And(Vec::new()),
                limit,
            });
        }

        let tokens = tokenize(body)?;
        let mut parser = WhereParser { tokens, pos: 0 };
        let condition = parser.parse_or()?;
        if parser.pos != parser.tokens.len() {
            return Err(Error::InvalidPredicate(format!(
                "unexpected token near position {} in '{}'",
                parser.pos, text
            )));
        }

        Ok(Self { condition, limit })
    }

    fn matches_condition(condition: &FilterCondition, record: &Record) -> bool {
        match condition {
            FilterCondition::Equals { field, value } => record
                .get(field)
                .map(|v| loose_eq(v, value))
                .unwrap_or(false),
            FilterCondition::NotEquals { field, value } => record
                .get(field)
                .map(|v| !loose_eq(v, value))
                .unwrap_or(true),
            FilterCondition::GreaterThan { field, value } => {
                numeric_field(record, field).map(|v| v > *value).unwrap_or(false)
            }
            FilterCondition::LessThan { field, value } => {
                numeric_field(record, field).map(|v| v < *value).unwrap_or(false)
            }
            FilterCondition::GreaterEqual { field, value } => {
                numeric_field(record, field).map(|v| v >= *value).unwrap_or(false)
            }
            FilterCondition::LessEqual { field, value } => {
                numeric_field(record, field).map(|v| v <= *value).unwrap_or(false)
            }
            FilterCondition::Matches { field, pattern } => record
                .get(field)
                .and_then(text_of)
                .map(|s| pattern.is_match(&s))
                .unwrap_or(false),
            FilterCondition::In { field, values } => record
                .get(field)
                .map(|v| values.iter().any(|candidate| loose_eq(v, candidate)))
                .unwrap_or(false),
            FilterCondition::And(conditions) => {
                conditions.iter().all(|c| Self::matches_condition(c, record))
            }
            FilterCondition::Or(conditions) => {
                conditions.iter().any(|c| Self::matches_condition(c, record))
            }
        }
    }
}

impl Filter for RecordFilter {
    fn matches(&self, record: &Record) -> bool {
        Self::matches_condition(&self.condition, record)
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn numeric_field(record: &Record, field: &str) -> Option<f64> {
    record.get(field).and_then(as_number)
}

fn text_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// "1899" and 1899 compare equal: document stores often ship numbers as text.
fn loose_eq(actual: &Value, expected: &Value) -> bool {
    if actual == expected {
        return true;
    }
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => (a - b).abs() < f64::EPSILON,
        _ => false,
    }
}

fn compile_document(doc: &Map<String, Value>) -> Result<FilterCondition> {
    let mut conditions = Vec::with_capacity(doc.len());

    for (key, value) in doc {
        match key.as_str() {
            "$and" | "$or" => {
                let Value::Array(items) = value else {
                    return Err(Error::InvalidPredicate(format!("{} expects an array", key)));
                };
                let mut nested = Vec::with_capacity(items.len());
                for item in items {
                    let Value::Object(sub) = item else {
                        return Err(Error::InvalidPredicate(format!(
                            "{} items must be objects",
                            key
                        )));
                    };
                    nested.push(compile_document(sub)?);
                }
                if key == "$and" {
                    conditions.push(FilterCondition::And(nested));
                } else {
                    conditions.push(FilterCondition::Or(nested));
                }
            }
            op if op.starts_with('$') => {
                return Err(Error::InvalidPredicate(format!("unsupported operator {}", op)));
            }
            field => match value {
                Value::Object(ops) if ops.keys().all(|k| k.starts_with('$')) && !ops.is_empty() => {
                    for (op, operand) in ops {
                        conditions.push(compile_operator(field, op, operand)?);
                    }
                }
                other => conditions.push(FilterCondition::Equals {
                    field: field.to_string(),
                    value: other.clone(),
                }),
            },
        }
    }

    Ok(FilterCondition::And(conditions))
}

fn compile_operator(field: &str, op: &str, operand: &Value) -> Result<FilterCondition> {
    let field = field.to_string();
    let number = || {
        as_number(operand).ok_or_else(|| {
            Error::InvalidPredicate(format!("{} on '{}' expects a number", op, field))
        })
    };

    Ok(match op {
        "$eq" => FilterCondition::Equals { field, value: operand.clone() },
        "$ne" => FilterCondition::NotEquals { field, value: operand.clone() },
        "$gt" => FilterCondition::GreaterThan { value: number()?, field },
        "$gte" => FilterCondition::GreaterEqual { value: number()?, field },
        "$lt" => FilterCondition::LessThan { value: number()?, field },
        "$lte" => FilterCondition::LessEqual { value: number()?, field },
        "$regex" => {
            let source = operand.as_str().ok_or_else(|| {
                Error::InvalidPredicate(format!("$regex on '{}' expects a string", field))
            })?;
            let pattern = Regex::new(source)
                .map_err(|e| Error::InvalidPredicate(format!("bad regex: {}", e)))?;
            FilterCondition::Matches { field, pattern }
        }
        "$in" => {
            let values = operand.as_array().cloned().ok_or_else(|| {
                Error::InvalidPredicate(format!("$in on '{}' expects an array", field))
            })?;
            FilterCondition::In { field, values }
        }
        other => return Err(Error::InvalidPredicate(format!("unsupported operator {}", other))),
    })
}

fn where_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^(?:select\b.*?\b)?where\b").expect("valid regex"))
}

fn select_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?is)^select\b").expect("valid regex"))
}

fn limit_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s*\blimit\s+(\d+)\s*$").expect("valid regex"))
}

fn token_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"^\s*(?:(?P<str>'(?:[^']|'')*')|(?P<num>-?\d+(?:\.\d+)?)|(?P<op><=|>=|<>|!=|=|<|>)|(?P<ident>[A-Za-z_][A-Za-z0-9_.]*|"[^"]+"|`[^`]+`))"#,
        )
        .expect("valid regex")
    })
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Str(String),
    Num(f64),
    Op(String),
    And,
    Or,
    Like,
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut rest = input;

    while !rest.trim().is_empty() {
        let caps = token_regex().captures(rest).ok_or_else(|| {
            Error::InvalidPredicate(format!("cannot tokenize near '{}'", rest.trim()))
        })?;
        let whole = caps.get(0).map(|m| m.end()).unwrap_or(rest.len());

        let token = if let Some(s) = caps.name("str") {
            let inner = &s.as_str()[1..s.as_str().len() - 1];
            Token::Str(inner.replace("''", "'"))
        } else if let Some(n) = caps.name("num") {
            Token::Num(n.as_str().parse::<f64>().map_err(|e| {
                Error::InvalidPredicate(format!("bad number '{}': {}", n.as_str(), e))
            })?)
        } else if let Some(op) = caps.name("op") {
            Token::Op(op.as_str().to_string())
        } else if let Some(ident) = caps.name("ident") {
            let raw = ident.as_str();
            match raw.to_ascii_uppercase().as_str() {
                "AND" => Token::And,
                "OR" => Token::Or,
                "LIKE" => Token::Like,
                _ => Token::Ident(raw.trim_matches(|c| c == '"' || c == '`').to_string()),
            }
        } else {
            return Err(Error::InvalidPredicate(format!("cannot tokenize '{}'", rest)));
        };

        tokens.push(token);
        rest = &rest[whole..];
    }

    Ok(tokens)
}

struct WhereParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl WhereParser {
    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn parse_or(&mut self) -> Result<FilterCondition> {
        let mut branches = vec![self.parse_and()?];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            branches.push(self.parse_and()?);
        }
        Ok(if branches.len() == 1 {
            branches.remove(0)
        } else {
            FilterCondition::Or(branches)
        })
    }

    fn parse_and(&mut self) -> Result<FilterCondition> {
        let mut conditions = vec![self.parse_comparison()?];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            conditions.push(self.parse_comparison()?);
        }
        Ok(if conditions.len() == 1 {
            conditions.remove(0)
        } else {
            FilterCondition::And(conditions)
        })
    }

    fn parse_comparison(&mut self) -> Result<FilterCondition> {
        let field = match self.next() {
            Some(Token::Ident(name)) => name,
            other => {
                return Err(Error::InvalidPredicate(format!(
                    "expected a field name, found {:?}",
                    other
                )))
            }
        };

        match self.next() {
            Some(Token::Like) => match self.next() {
                Some(Token::Str(pattern)) => Ok(FilterCondition::Matches {
                    field,
                    pattern: like_to_regex(&pattern)?,
                }),
                other => Err(Error::InvalidPredicate(format!(
                    "LIKE expects a quoted pattern, found {:?}",
                    other
                ))),
            },
            Some(Token::Op(op)) => {
                let literal = match self.next() {
                    Some(Token::Str(s)) => Value::String(s),
                    Some(Token::Num(n)) => serde_json::Number::from_f64(n)
                        .map(Value::Number)
                        .ok_or_else(|| Error::InvalidPredicate(format!("bad number {}", n)))?,
                    other => {
                        return Err(Error::InvalidPredicate(format!(
                            "expected a literal after {}, found {:?}",
                            op, other
                        )))
                    }
                };
                comparison(field, &op, literal)
            }
            other => Err(Error::InvalidPredicate(format!(
                "expected an operator after '{}', found {:?}",
                field, other
            ))),
        }
    }
}

fn comparison(field: String, op: &str, literal: Value) -> Result<FilterCondition> {
    let number = || {
        as_number(&literal).ok_or_else(|| {
            Error::InvalidPredicate(format!("'{}' {} expects a number", field, op))
        })
    };
    Ok(match op {
        "=" => FilterCondition::Equals { field, value: literal },
        "!=" | "<>" => FilterCondition::NotEquals { field, value: literal },
        ">" => FilterCondition::GreaterThan { value: number()?, field },
        ">=" => FilterCondition::GreaterEqual { value: number()?, field },
        "<" => FilterCondition::LessThan { value: number()?, field },
        "<=" => FilterCondition::LessEqual { value: number()?, field },
        other => return Err(Error::InvalidPredicate(format!("unsupported operator {}", other))),
    })
}

/// SQL LIKE pattern to an anchored, case-insensitive regex.
fn like_to_regex(pattern: &str) -> Result<Regex> {
    let mut out = String::from("(?i)^");
    for c in pattern.chars() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    Regex::new(&out).map_err(|e| Error::InvalidPredicate(format!("bad LIKE pattern: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(v: Value) -> Record {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn test_document_equality_and_ranges() {
        let doc = json!({"colour": "blue", "cost": {"$gte": 1000, "$lte": 2000}});
        let filter = RecordFilter::from_document(doc.as_object().unwrap()).unwrap();

        assert!(filter.matches(&row(json!({"colour": "blue", "cost": "1899"}))));
        assert!(!filter.matches(&row(json!({"colour": "blue", "cost": 2999}))));
        assert!(!filter.matches(&row(json!({"colour": "navy", "cost": 1500}))));
    }

    #[test]
    fn test_document_or_and_in() {
        let doc = json!({"$or": [{"size": {"$in": ["S", "M"]}}, {"stock": {"$gt": 10}}]});
        let filter = RecordFilter::from_document(doc.as_object().unwrap()).unwrap();

        assert!(filter.matches(&row(json!({"size": "M", "stock": 0}))));
        assert!(filter.matches(&row(json!({"size": "XL", "stock": 20}))));
        assert!(!filter.matches(&row(json!({"size": "XL", "stock": 2}))));
    }

    #[test]
    fn test_document_rejects_unknown_operator() {
        let doc = json!({"price": {"$near": 5}});
        assert!(RecordFilter::from_document(doc.as_object().unwrap()).is_err());
    }

    #[test]
    fn test_where_clause() {
        let filter = RecordFilter::parse_where(
            "SELECT * FROM products WHERE retail_price >= 1000 AND color_variant = 'blue' LIMIT 5;",
        )
        .unwrap();

        assert_eq!(filter.limit(), Some(5));
        assert!(filter.matches(&row(json!({"retail_price": 1899, "color_variant": "blue"}))));
        assert!(!filter.matches(&row(json!({"retail_price": 899, "color_variant": "blue"}))));
    }

    #[test]
    fn test_where_like_and_or() {
        let filter =
            RecordFilter::parse_where("type LIKE '%shirt%' OR size = 'XL'").unwrap();

        assert!(filter.matches(&row(json!({"type": "Formal Shirt", "size": "M"}))));
        assert!(filter.matches(&row(json!({"type": "Trousers", "size": "XL"}))));
        assert!(!filter.matches(&row(json!({"type": "Trousers", "size": "M"}))));
    }

    #[test]
    fn test_select_without_where_matches_all() {
        let filter = RecordFilter::parse_where("SELECT * FROM clothing_inventory").unwrap();
        assert!(filter.matches(&row(json!({"anything": 1}))));
    }

    #[test]
    fn test_quoted_string_with_escape() {
        let filter = RecordFilter::parse_where("name = 'Men''s Polo'").unwrap();
        assert!(filter.matches(&row(json!({"name": "Men's Polo"}))));
    }

    #[test]
    fn test_where_rejects_garbage() {
        assert!(RecordFilter::parse_where("price >").is_err());
        assert!(RecordFilter::parse_where("price = 1 price").is_err());
    }
}
