//! Message templates: parsing `{name}` holes and binding positional arguments.

use serde_json::Value;
use std::collections::BTreeMap;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Text(String),
    Hole(String),
}

/// A parsed message template. Immutable once parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageTemplate {
    text: String,
    tokens: Vec<Token>,
}

/// A template together with the properties its arguments were bound to.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundTemplate {
    pub template: MessageTemplate,
    pub properties: BTreeMap<String, Value>,
}

impl MessageTemplate {
    /// Parse template text.
    ///
    /// `{{` and `}}` are escaped braces. Returns `None` for an unterminated
    /// or empty hole, or a hole containing `{`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut chars = text.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '{' => {
                    let mut name = String::new();
                    let mut closed = false;
                    for inner in chars.by_ref() {
                        match inner {
                            '}' => {
                                closed = true;
                                break;
                            }
                            '{' => return None,
                            other => name.push(other),
                        }
                    }
                    let name = name.trim();
                    if !closed || name.is_empty() {
                        return None;
                    }
                    if !literal.is_empty() {
                        tokens.push(Token::Text(std::mem::take(&mut literal)));
                    }
                    tokens.push(Token::Hole(name.to_string()));
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            tokens.push(Token::Text(literal));
        }

        Some(Self {
            text: text.to_string(),
            tokens,
        })
    }

    /// A template with no holes whose only token is `text` itself.
    pub fn literal(text: &str) -> Self {
        let tokens = if text.is_empty() {
            Vec::new()
        } else {
            vec![Token::Text(text.to_string())]
        };
        Self {
            text: text.to_string(),
            tokens,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Distinct hole names in order of first appearance.
    pub fn holes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for token in &self.tokens {
            if let Token::Hole(name) = token {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Bind positional arguments to the distinct holes in order.
    /// Extra arguments are dropped; holes without an argument stay unbound.
    pub fn bind(&self, args: &[Value]) -> BoundTemplate {
        let properties = self
            .holes()
            .into_iter()
            .zip(args.iter())
            .map(|(name, value)| (name.to_string(), value.clone()))
            .collect();
        BoundTemplate {
            template: self.clone(),
            properties,
        }
    }

    /// Render against `properties`. Unbound holes render as `{name}`.
    pub fn render(&self, properties: &BTreeMap<String, Value>) -> String {
        let mut out = String::with_capacity(self.text.len());
        for token in &self.tokens {
            match token {
                Token::Text(text) => out.push_str(text),
                Token::Hole(name) => match properties.get(name) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(other) => out.push_str(&other.to_string()),
                    None => {
                        out.push('{');
                        out.push_str(name);
                        out.push('}');
                    }
                },
            }
        }
        out
    }
}
