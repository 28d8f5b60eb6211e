//! Template resolver: scans for `{key}` / `{key:4.1f}` placeholders, resolves
//! the referenced keys through the registry and substitutes the formatted
//! results. Everything outside a well-formed placeholder (markup included) is
//! opaque literal text; malformed placeholders pass through unchanged.

use crate::metrics::{MetricRegistry, MetricValue};
use crate::sampler::SampleSource;

/// Parsed `width.precision` + `f` specifier, printf-style: width is the
/// minimum total field width (right-aligned, space-padded).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormatSpec {
    pub width: Option<usize>,
    pub precision: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Literal(String),
    Placeholder { key: String, spec: Option<FormatSpec> },
}

/// A template parsed once into a token list; the per-tick pass only walks the
/// tokens.
pub struct Template {
    tokens: Vec<Token>,
    source_len: usize,
}

impl Template {
    pub fn parse(text: &str) -> Self {
        let mut tokens = Vec::new();
        let mut literal = String::new();
        let mut rest = text;

        while let Some(open) = rest.find('{') {
            let (before, from_open) = rest.split_at(open);
            literal.push_str(before);
            match from_open[1..].find(['{', '}']) {
                // well-formed candidate: `{inner}` with no nested brace
                Some(i) if from_open.as_bytes()[1 + i] == b'}' => {
                    let inner = &from_open[1..1 + i];
                    match parse_placeholder(inner) {
                        Some((key, spec)) => {
                            if !literal.is_empty() {
                                tokens.push(Token::Literal(std::mem::take(&mut literal)));
                            }
                            tokens.push(Token::Placeholder {
                                key: key.to_string(),
                                spec,
                            });
                        }
                        // malformed content degrades to literal passthrough
                        None => literal.push_str(&from_open[..2 + i]),
                    }
                    rest = &from_open[2 + i..];
                }
                // `{` followed by another `{`: emit it literally, rescan from
                // the next brace
                Some(i) => {
                    literal.push_str(&from_open[..1 + i]);
                    rest = &from_open[1 + i..];
                }
                // unmatched brace: the remainder is literal
                None => {
                    literal.push_str(from_open);
                    rest = "";
                }
            }
        }
        literal.push_str(rest);
        if !literal.is_empty() {
            tokens.push(Token::Literal(literal));
        }
        Self {
            tokens,
            source_len: text.len(),
        }
    }

    /// Distinct keys referenced by the template, in first-appearance order.
    pub fn keys(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for tok in &self.tokens {
            if let Token::Placeholder { key, .. } = tok {
                if !out.contains(&key.as_str()) {
                    out.push(key);
                }
            }
        }
        out
    }

    /// One resolution pass over the token list; call within an active tick.
    pub fn render<S: SampleSource>(&self, registry: &mut MetricRegistry<S>) -> String {
        let mut out = String::with_capacity(self.source_len);
        for tok in &self.tokens {
            match tok {
                Token::Literal(s) => out.push_str(s),
                Token::Placeholder { key, spec } => {
                    out.push_str(&format_value(&registry.resolve(key), *spec));
                }
            }
        }
        out
    }
}

/// Convenience for one-shot use; prefer a cached [`Template`] when the
/// template text is static across ticks.
pub fn resolve_template<S: SampleSource>(text: &str, registry: &mut MetricRegistry<S>) -> String {
    Template::parse(text).render(registry)
}

// Split `inner` into key and optional specifier. The separator is the last
// `:` whose suffix looks like a specifier attempt (digits/dots plus one
// trailing letter), so keys like `custom:gpu_temp` still work bare while an
// unknown specifier such as `4.1x` is malformed rather than part of the key.
fn parse_placeholder(inner: &str) -> Option<(&str, Option<FormatSpec>)> {
    if let Some((key, spec_str)) = inner.rsplit_once(':') {
        if looks_like_spec(spec_str) {
            let spec = parse_format_spec(spec_str)?;
            return valid_key(key).then_some((key, Some(spec)));
        }
    }
    valid_key(inner).then_some((inner, None))
}

fn looks_like_spec(s: &str) -> bool {
    match s.chars().last() {
        Some(last) => {
            last.is_ascii_alphabetic()
                && s[..s.len() - 1]
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == '.')
        }
        None => false,
    }
}

fn valid_key(key: &str) -> bool {
    !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ':' | '.' | '-'))
}

// `[width][.precision]f`, e.g. `4.1f`, `.2f`, `6f`, `f`.
fn parse_format_spec(s: &str) -> Option<FormatSpec> {
    let body = s.strip_suffix('f')?;
    let (width_str, precision) = match body.split_once('.') {
        Some((w, p)) => (w, Some(p.parse::<usize>().ok()?)),
        None => (body, None),
    };
    let width = if width_str.is_empty() {
        None
    } else {
        Some(width_str.parse::<usize>().ok()?)
    };
    Some(FormatSpec { width, precision })
}

/// Numeric values honor the specifier; everything else uses its default
/// string conversion.
pub fn format_value(value: &MetricValue, spec: Option<FormatSpec>) -> String {
    match (value, spec) {
        (MetricValue::Float(v), Some(s)) => format_float(*v, s),
        (MetricValue::Int(v), Some(s)) => format_float(*v as f64, s),
        (MetricValue::Float(v), None) => format!("{v}"),
        (MetricValue::Int(v), None) => v.to_string(),
        (MetricValue::Text(s), _) | (MetricValue::Image(s), _) => s.clone(),
    }
}

fn format_float(v: f64, spec: FormatSpec) -> String {
    match (spec.width, spec.precision) {
        (Some(w), Some(p)) => format!("{v:w$.p$}"),
        (Some(w), None) => format!("{v:w$}"),
        (None, Some(p)) => format!("{v:.p$}"),
        (None, None) => format!("{v}"),
    }
}
