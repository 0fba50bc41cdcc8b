//! Restricted placeholder templates.
//!
//! Two flavours share one `{{ ... }}` tag syntax:
//!
//! - **Pattern templates** build the ticket-matching regex. The only
//!   placeholders are `projectKey`, `fixKeywords` and `closeKeywords`; keyword
//!   lists expand to an alternation (`#fix|#fixes|#fixed`).
//! - **Text templates** render comments from a JSON record:
//!   `{{ path.to.field }}`, `{{ path | filter }}` and
//!   `{{#each path as item}} ... {{/each}}`.
//!
//! Both are compiled once, up front. Any malformed template is rejected at
//! compile time; rendering a compiled text template cannot fail.

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use crate::error::TemplateError;

// ── Tokenizer ──

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Text(&'a str),
    Tag { content: &'a str, offset: usize },
}

fn tokenize(src: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let mut rest = src;
    let mut consumed = 0;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            segments.push(Segment::Text(&rest[..start]));
        }
        let offset = consumed + start;
        let after_start = &rest[start + 2..];
        let end = after_start
            .find("}}")
            .ok_or(TemplateError::UnclosedTag { offset })?;
        let content = after_start[..end].trim();
        if content.is_empty() {
            return Err(TemplateError::EmptyTag { offset });
        }
        segments.push(Segment::Tag { content, offset });
        let advance = start + 2 + end + 2;
        consumed += advance;
        rest = &rest[advance..];
    }
    if !rest.is_empty() {
        segments.push(Segment::Text(rest));
    }
    Ok(segments)
}

// ── Pattern templates ──

/// Variables available to pattern templates.
#[derive(Debug, Clone, Copy)]
pub struct PatternVars<'a> {
    pub project_key: &'a str,
    pub fix_keywords: &'a [String],
    pub close_keywords: &'a [String],
}

fn alternation(keywords: &[String]) -> String {
    keywords
        .iter()
        .map(|k| regex::escape(k))
        .collect::<Vec<_>>()
        .join("|")
}

/// Expand a pattern template into regex source.
pub fn expand_pattern(template: &str, vars: &PatternVars<'_>) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    for segment in tokenize(template)? {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Tag { content, .. } => match content {
                "projectKey" => out.push_str(&regex::escape(vars.project_key)),
                "fixKeywords" => out.push_str(&alternation(vars.fix_keywords)),
                "closeKeywords" => out.push_str(&alternation(vars.close_keywords)),
                other => {
                    return Err(TemplateError::UnknownVariable {
                        name: other.to_string(),
                    })
                }
            },
        }
    }
    Ok(out)
}

/// Compile a pattern template into a case-sensitive regex in which `.` also
/// matches newlines, so multi-line commit messages are scanned as one string.
pub fn compile_pattern(template: &str, vars: &PatternVars<'_>) -> Result<Regex, TemplateError> {
    let source = expand_pattern(template, vars)?;
    let regex = RegexBuilder::new(&source)
        .dot_matches_new_line(true)
        .build()?;
    tracing::debug!(pattern = %source, "compiled ticket pattern");
    Ok(regex)
}

// ── Text templates ──

#[derive(Debug, Clone, PartialEq)]
enum Filter {
    Truncate(usize),
    FirstLine,
}

impl Filter {
    fn parse(expr: &str) -> Result<Self, TemplateError> {
        let expr = expr.trim();
        let (name, arg) = match expr.split_once('(') {
            Some((name, rest)) => {
                let arg = rest.strip_suffix(')').ok_or_else(|| {
                    TemplateError::InvalidFilterArgument {
                        filter: name.trim().to_string(),
                        arg: rest.to_string(),
                    }
                })?;
                (name.trim(), Some(arg.trim()))
            }
            None => (expr, None),
        };

        match (name, arg) {
            ("truncate", Some(arg)) => arg.parse().map(Filter::Truncate).map_err(|_| {
                TemplateError::InvalidFilterArgument {
                    filter: name.to_string(),
                    arg: arg.to_string(),
                }
            }),
            ("truncate", None) => Err(TemplateError::InvalidFilterArgument {
                filter: name.to_string(),
                arg: String::new(),
            }),
            ("first_line", None) => Ok(Filter::FirstLine),
            ("first_line", Some(arg)) => Err(TemplateError::InvalidFilterArgument {
                filter: name.to_string(),
                arg: arg.to_string(),
            }),
            (other, _) => Err(TemplateError::UnknownFilter {
                name: other.to_string(),
            }),
        }
    }

    fn apply(&self, text: String) -> String {
        match self {
            Filter::Truncate(n) => text.chars().take(*n).collect(),
            Filter::FirstLine => text.lines().next().unwrap_or_default().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Value {
        path: Vec<String>,
        filters: Vec<Filter>,
    },
    Each {
        path: Vec<String>,
        binding: String,
        body: Vec<Node>,
    },
}

/// An open `{{#each}}` block while parsing.
struct Frame {
    path: Vec<String>,
    binding: String,
    nodes: Vec<Node>,
}

/// A compiled comment template.
#[derive(Debug, Clone, PartialEq)]
pub struct TextTemplate {
    nodes: Vec<Node>,
}

impl TextTemplate {
    /// Compile `src`, accepting only variables whose first path segment is in
    /// `roots` (or bound by an enclosing `each`).
    pub fn compile(src: &str, roots: &[&str]) -> Result<Self, TemplateError> {
        let mut root_nodes = Vec::new();
        let mut stack: Vec<Frame> = Vec::new();

        for segment in tokenize(src)? {
            let node = match segment {
                Segment::Text(text) => Node::Text(text.to_string()),
                Segment::Tag { content, offset } => {
                    if let Some(block) = content.strip_prefix('#') {
                        let (path, binding) = parse_each(block)?;
                        check_root(&path, roots, &stack)?;
                        stack.push(Frame {
                            path,
                            binding,
                            nodes: Vec::new(),
                        });
                        continue;
                    }
                    if let Some(end) = content.strip_prefix('/') {
                        if end.trim() != "each" {
                            return Err(TemplateError::MalformedBlock {
                                tag: content.to_string(),
                            });
                        }
                        let frame = stack
                            .pop()
                            .ok_or(TemplateError::UnexpectedEndEach { offset })?;
                        Node::Each {
                            path: frame.path,
                            binding: frame.binding,
                            body: frame.nodes,
                        }
                    } else {
                        let mut parts = content.split('|');
                        let path = parse_path(parts.next().unwrap_or_default())?;
                        check_root(&path, roots, &stack)?;
                        let filters = parts.map(Filter::parse).collect::<Result<Vec<_>, _>>()?;
                        Node::Value { path, filters }
                    }
                }
            };
            match stack.last_mut() {
                Some(frame) => frame.nodes.push(node),
                None => root_nodes.push(node),
            }
        }

        if let Some(frame) = stack.pop() {
            return Err(TemplateError::UnclosedEach {
                path: frame.path.join("."),
            });
        }
        Ok(Self { nodes: root_nodes })
    }

    /// Render against a record. Missing values render as empty text.
    pub fn render(&self, scope: &Value) -> String {
        let mut out = String::new();
        let mut bindings = Vec::new();
        render_nodes(&self.nodes, scope, &mut bindings, &mut out);
        out
    }
}

fn parse_path(expr: &str) -> Result<Vec<String>, TemplateError> {
    let expr = expr.trim();
    let path: Vec<String> = expr.split('.').map(|s| s.trim().to_string()).collect();
    if path.iter().any(|s| s.is_empty()) {
        return Err(TemplateError::UnknownVariable {
            name: expr.to_string(),
        });
    }
    Ok(path)
}

/// `each <path> as <name>`
fn parse_each(block: &str) -> Result<(Vec<String>, String), TemplateError> {
    let words: Vec<&str> = block.split_whitespace().collect();
    match words.as_slice() {
        ["each", path, "as", binding] if is_identifier(binding) => {
            Ok((parse_path(path)?, binding.to_string()))
        }
        _ => Err(TemplateError::MalformedBlock {
            tag: format!("#{block}"),
        }),
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn check_root(path: &[String], roots: &[&str], stack: &[Frame]) -> Result<(), TemplateError> {
    let root = path[0].as_str();
    let known = roots.contains(&root) || stack.iter().any(|f| f.binding == root);
    if known {
        Ok(())
    } else {
        Err(TemplateError::UnknownVariable {
            name: path.join("."),
        })
    }
}

fn render_nodes<'a>(
    nodes: &'a [Node],
    scope: &'a Value,
    bindings: &mut Vec<(&'a str, &'a Value)>,
    out: &mut String,
) {
    for node in nodes {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Value { path, filters } => {
                if let Some(value) = lookup(path, scope, bindings) {
                    let text = filters
                        .iter()
                        .fold(display(value), |text, filter| filter.apply(text));
                    out.push_str(&text);
                }
            }
            Node::Each {
                path,
                binding,
                body,
            } => {
                let Some(Value::Array(items)) = lookup(path, scope, bindings) else {
                    continue;
                };
                for item in items {
                    bindings.push((binding.as_str(), item));
                    render_nodes(body, scope, bindings, out);
                    bindings.pop();
                }
            }
        }
    }
}

fn lookup<'a>(
    path: &[String],
    scope: &'a Value,
    bindings: &[(&'a str, &'a Value)],
) -> Option<&'a Value> {
    let (first, rest) = path.split_first()?;
    let mut value = bindings
        .iter()
        .rev()
        .find(|(name, _)| *name == first.as_str())
        .map(|(_, v)| *v)
        .or_else(|| scope.get(first.as_str()))?;

    for segment in rest {
        value = match value {
            Value::Object(map) => map.get(segment.as_str())?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}
