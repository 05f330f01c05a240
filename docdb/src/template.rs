//! Brace-interpolation key formatter.
//!
//! Compiles a template string like `"{cat}|{name}"` or `"{age:03}"` into a
//! pure `Document -> Option<Vec<u8>>` function, eagerly validated at
//! compile time so malformed templates are rejected at index-creation time
//! rather than on the first write.

use serde_json::Value;

use crate::document::Document;
use crate::error::Error;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq)]
enum FieldSpec {
    /// No `:spec` suffix: natural formatting for the value's own type.
    Natural,
    /// `{field:0N}`: zero-padded decimal integer, width `N`.
    ZeroPadded(usize),
    /// `{field:N}`: fixed-width string, space-padded/truncated to `N` chars.
    FixedWidth(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Segment {
    Literal(Vec<u8>),
    Field { name: String, spec: FieldSpec },
}

/// A compiled key-derivation template.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    /// Whether this template backs an integer-keyed index (`Table::index`
    /// called with `integer: true`). Integer templates must resolve to a
    /// single field and emit an 8-byte big-endian encoding instead of
    /// formatted text.
    integer: bool,
}

impl Template {
    /// Compile `source` into a [`Template`]. Eager: any malformed brace
    /// expression is reported here, never deferred to a write.
    pub fn compile(source: &str, integer: bool) -> Result<Self> {
        if source.starts_with('!') {
            return Err(Error::TemplateSyntax {
                template: source.to_string(),
                reason: "function-body (\"!...\") templates are not supported; use a brace template".to_string(),
            });
        }

        let mut segments = Vec::new();
        let mut literal = Vec::new();
        let mut chars = source.char_indices().peekable();

        while let Some((_, c)) = chars.next() {
            if c == '}' {
                return Err(Error::TemplateSyntax {
                    template: source.to_string(),
                    reason: "unmatched '}'".to_string(),
                });
            }
            if c != '{' {
                let mut buf = [0u8; 4];
                literal.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
                continue;
            }

            if !literal.is_empty() {
                segments.push(Segment::Literal(std::mem::take(&mut literal)));
            }

            let mut field = String::new();
            let mut spec_str: Option<String> = None;
            let mut closed = false;
            while let Some((_, c)) = chars.next() {
                match c {
                    '}' => {
                        closed = true;
                        break;
                    }
                    ':' => {
                        let mut spec = String::new();
                        for (_, c) in chars.by_ref() {
                            if c == '}' {
                                closed = true;
                                break;
                            }
                            spec.push(c);
                        }
                        spec_str = Some(spec);
                        break;
                    }
                    c => field.push(c),
                }
            }
            if !closed {
                return Err(Error::TemplateSyntax {
                    template: source.to_string(),
                    reason: "unmatched '{'".to_string(),
                });
            }
            if field.is_empty() {
                return Err(Error::TemplateSyntax {
                    template: source.to_string(),
                    reason: "empty field name in '{}'".to_string(),
                });
            }

            let spec = match spec_str {
                None => FieldSpec::Natural,
                Some(spec) => parse_spec(source, &spec)?,
            };
            segments.push(Segment::Field { name: field, spec });
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        let field_count = segments
            .iter()
            .filter(|s| matches!(s, Segment::Field { .. }))
            .count();
        if integer && field_count != 1 {
            return Err(Error::TemplateSyntax {
                template: source.to_string(),
                reason: format!(
                    "integer-keyed index template must reference exactly one field, found {field_count}"
                ),
            });
        }
        if field_count == 0 {
            return Err(Error::TemplateSyntax {
                template: source.to_string(),
                reason: "template references no fields".to_string(),
            });
        }

        Ok(Self {
            source: source.to_string(),
            segments,
            integer,
        })
    }

    /// The original template source, for error messages and catalog
    /// round-tripping.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Derive the key bytes for `doc`, or `None` if any referenced field is
    /// absent (a partial-index skip).
    pub fn format(&self, doc: &Document) -> Option<Vec<u8>> {
        if self.integer {
            return self.format_integer(doc);
        }

        let mut out = Vec::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(bytes) => out.extend_from_slice(bytes),
                Segment::Field { name, spec } => {
                    let value = doc.get(name)?;
                    out.extend_from_slice(&format_field(value, spec)?);
                }
            }
        }
        Some(out)
    }

    fn format_integer(&self, doc: &Document) -> Option<Vec<u8>> {
        let name = self.segments.iter().find_map(|s| match s {
            Segment::Field { name, .. } => Some(name),
            Segment::Literal(_) => None,
        })?;
        let value = doc.get(name)?;
        let n = value.as_i64()?;
        let unsigned = u64::try_from(n).ok()?;
        Some(unsigned.to_be_bytes().to_vec())
    }
}

fn parse_spec(template: &str, spec: &str) -> Result<FieldSpec> {
    if spec.is_empty() {
        return Err(Error::TemplateSyntax {
            template: template.to_string(),
            reason: "empty format spec after ':'".to_string(),
        });
    }
    if !spec.chars().all(|c| c.is_ascii_digit()) {
        return Err(Error::TemplateSyntax {
            template: template.to_string(),
            reason: format!("unknown format spec \"{spec}\""),
        });
    }
    let width: usize = spec.parse().map_err(|_| Error::TemplateSyntax {
        template: template.to_string(),
        reason: format!("format spec width \"{spec}\" out of range"),
    })?;
    if spec.starts_with('0') && spec.len() > 1 {
        Ok(FieldSpec::ZeroPadded(width))
    } else {
        Ok(FieldSpec::FixedWidth(width))
    }
}

fn format_field(value: &Value, spec: &FieldSpec) -> Option<Vec<u8>> {
    match spec {
        FieldSpec::Natural => match value {
            Value::String(s) => Some(s.as_bytes().to_vec()),
            Value::Number(n) => Some(n.to_string().into_bytes()),
            Value::Bool(b) => Some(b.to_string().into_bytes()),
            _ => None,
        },
        FieldSpec::ZeroPadded(width) => {
            let n = value.as_i64()?;
            Some(format!("{n:0width$}").into_bytes())
        }
        FieldSpec::FixedWidth(width) => {
            let s = value.as_str()?;
            let chars = s.chars().count();
            if chars >= *width {
                Some(s.chars().take(*width).collect::<String>().into_bytes())
            } else {
                let padding = " ".repeat(width - chars);
                Some(format!("{s}{padding}").into_bytes())
            }
        }
    }
}
