use crate::request::error::TemplateError;
use model::pagination::offset::Offset;
use std::{fmt, str::FromStr};

/// Prefix accepted in front of placeholder names, e.g. `${offset.key}`.
const OFFSET_PREFIX: &str = "offset.";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder {
        name: String,
        default: Option<String>,
    },
}

/// A string with offset placeholders, parsed once at configuration time.
///
/// Recognized placeholder forms:
///
/// * `${name}` and `${name:-fallback}`,
/// * `{name}` where `name` only contains `[A-Za-z0-9_.-]`, so JSON bodies
///   such as `{"a": 1}` stay literal.
///
/// Rendering never fails: a placeholder whose field is missing renders its
/// fallback, or nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut rest = source;

        while let Some(pos) = rest.find(['$', '{']) {
            let (head, tail) = rest.split_at(pos);
            literal.push_str(head);
            let position = source.len() - tail.len();

            if let Some(body) = tail.strip_prefix("${") {
                let end = body
                    .find('}')
                    .ok_or(TemplateError::Unterminated { position })?;
                let (name, default) = split_placeholder(&body[..end]);
                if name.is_empty() {
                    return Err(TemplateError::EmptyPlaceholder { position });
                }
                flush(&mut literal, &mut segments);
                segments.push(Segment::Placeholder { name, default });
                rest = &body[end + 1..];
            } else if let Some(body) = tail.strip_prefix('{') {
                match body.find('}') {
                    Some(end) if is_bare_name(&body[..end]) => {
                        flush(&mut literal, &mut segments);
                        segments.push(Segment::Placeholder {
                            name: body[..end].to_string(),
                            default: None,
                        });
                        rest = &body[end + 1..];
                    }
                    _ => {
                        literal.push('{');
                        rest = body;
                    }
                }
            } else {
                literal.push('$');
                rest = &tail[1..];
            }
        }

        literal.push_str(rest);
        flush(&mut literal, &mut segments);

        Ok(Template {
            source: source.to_string(),
            segments,
        })
    }

    /// Renders the template against `offset`.
    pub fn apply(&self, offset: &Offset) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder { name, default } => match resolve(offset, name) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(default.as_deref().unwrap_or_default()),
                },
            }
        }
        out
    }

    /// Placeholder names (without the `offset.` prefix) and whether each has a fallback.
    pub fn placeholders(&self) -> impl Iterator<Item = (&str, bool)> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder { name, default } => {
                Some((field_name(name), default.is_some()))
            }
            Segment::Literal(_) => None,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl FromStr for Template {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::parse(s)
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

fn flush(literal: &mut String, segments: &mut Vec<Segment>) {
    if !literal.is_empty() {
        segments.push(Segment::Literal(std::mem::take(literal)));
    }
}

fn split_placeholder(body: &str) -> (String, Option<String>) {
    match body.split_once(":-") {
        Some((name, default)) => (name.trim().to_string(), Some(default.to_string())),
        None => (body.trim().to_string(), None),
    }
}

fn is_bare_name(candidate: &str) -> bool {
    !candidate.is_empty()
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

fn field_name(name: &str) -> &str {
    name.strip_prefix(OFFSET_PREFIX).unwrap_or(name)
}

fn resolve(offset: &Offset, name: &str) -> Option<String> {
    offset
        .get(name)
        .or_else(|| offset.get(field_name(name)))
        .map(ToString::to_string)
}
