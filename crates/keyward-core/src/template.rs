//! Text templates filled from named values.
//!
//! `{name}` inserts a value as-is. `{name:from=to}` replaces every `from`
//! with `to` before insertion, and substitutions can be chained:
//! `{item:/=-:.txt=.html}`.

use std::collections::HashMap;

use crate::pattern::InvalidPattern;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field {
        name: String,
        replacements: Vec<(String, String)>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextTemplate {
    text: String,
    segments: Vec<Segment>,
}

impl TextTemplate {
    pub fn parse(template: &str) -> Result<Self, InvalidPattern> {
        let mut segments = Vec::new();
        let mut rest = template;

        while !rest.is_empty() {
            let open_at = match rest.find('{') {
                Some(idx) if !rest[..idx].contains('}') => idx,
                _ => {
                    segments.push(Segment::Literal(rest.to_string()));
                    break;
                }
            };
            if open_at > 0 {
                segments.push(Segment::Literal(rest[..open_at].to_string()));
            }
            let (field, tail) = parse_field(template, &rest[open_at + 1..])?;
            segments.push(field);
            rest = tail;
        }

        Ok(Self {
            text: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Fill the template. Returns `None` when a referenced value is missing.
    pub fn fill(&self, values: &HashMap<String, String>) -> Option<String> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field { name, replacements } => {
                    let mut value = values.get(name)?.clone();
                    for (from, to) in replacements {
                        value = value.replace(from.as_str(), to);
                    }
                    out.push_str(&value);
                }
            }
        }
        Some(out)
    }
}

/// Parse `name(:from=to)*}` and return the field plus the text after `}`.
fn parse_field<'a>(template: &str, body: &'a str) -> Result<(Segment, &'a str), InvalidPattern> {
    let bad = || InvalidPattern::new(template, "bad replacement field");

    let name_len = body
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(body.len());
    let name = &body[..name_len];
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return Err(bad());
    }

    let mut rest = &body[name_len..];
    let mut replacements = Vec::new();
    while let Some(subst) = rest.strip_prefix(':') {
        let from_len = subst.find(['{', '}', ':', '=']).ok_or_else(bad)?;
        if from_len == 0 || !subst[from_len..].starts_with('=') {
            return Err(bad());
        }
        let to_part = &subst[from_len + 1..];
        let to_len = to_part.find(['{', '}', ':', '=']).ok_or_else(bad)?;
        if to_part[to_len..].starts_with(['{', '=']) {
            return Err(bad());
        }
        replacements.push((subst[..from_len].to_string(), to_part[..to_len].to_string()));
        rest = &to_part[to_len..];
    }

    let tail = rest.strip_prefix('}').ok_or_else(bad)?;
    Ok((
        Segment::Field {
            name: name.to_string(),
            replacements,
        },
        tail,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_simple_fill() {
        let tf = TextTemplate::parse("{some}/text/to/{fill}").unwrap();
        assert_eq!(
            tf.fill(&values(&[("some", "prefix"), ("fill", "suffix")])).as_deref(),
            Some("prefix/text/to/suffix")
        );
    }

    #[test]
    fn test_repeated_values_and_extra_keys() {
        let tf = TextTemplate::parse("{some}/text/to/{some}").unwrap();
        assert_eq!(
            tf.fill(&values(&[("some", "ab/c/d"), ("fill", "x")])).as_deref(),
            Some("ab/c/d/text/to/ab/c/d")
        );
    }

    #[test]
    fn test_substitutions() {
        let tf = TextTemplate::parse("{prefix:_=___}/goto/{suffix:/=-}").unwrap();
        assert_eq!(
            tf.fill(&values(&[("prefix", "some_prefix"), ("suffix", "some/long/suffix")]))
                .as_deref(),
            Some("some___prefix/goto/some-long-suffix")
        );

        let tf = TextTemplate::parse("{prefix:/home/=}/docs/{suffix:.txt=.html}").unwrap();
        assert_eq!(
            tf.fill(&values(&[("prefix", "/home/joe"), ("suffix", "some/document.txt")]))
                .as_deref(),
            Some("joe/docs/some/document.html")
        );
    }

    #[test]
    fn test_chained_substitutions() {
        let tf = TextTemplate::parse(r"/goto/{item:/=-:\=_}/").unwrap();
        assert_eq!(
            tf.fill(&values(&[("item", r"this/is\mixed")])).as_deref(),
            Some("/goto/this-is_mixed/")
        );
    }

    #[test]
    fn test_missing_key() {
        let tf = TextTemplate::parse("{some}/text/to/{fill}").unwrap();
        assert_eq!(tf.fill(&values(&[("some", "prefix"), ("badfill", "x")])), None);
    }

    #[test]
    fn test_bad_templates() {
        assert!(TextTemplate::parse("{some/text/to/{fill}").is_err());
        assert!(TextTemplate::parse("{some}/text/to/{fill:}").is_err());
        assert!(TextTemplate::parse("{_hidden}").is_err());
        assert!(TextTemplate::parse("{unterminated").is_err());
    }

    #[test]
    fn test_plain_text() {
        let tf = TextTemplate::parse("https://example.com/static").unwrap();
        assert_eq!(
            tf.fill(&HashMap::new()).as_deref(),
            Some("https://example.com/static")
        );
    }
}
