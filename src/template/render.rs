//! Placeholder substitution engine for template subjects and bodies.
//!
//! Placeholders look like `{{ name }}`, `{{ .name }}` or `{{ .user.name }}`.
//! HTML rendering escapes substituted values; text rendering inserts them
//! verbatim. Literal template text is never altered.

use super::types::{RenderedTemplate, TemplateError, TemplateResult, TemplateVersion};
use super::value::{TemplateData, TemplateValue};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Escape {
    None,
    Html,
}

#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Literal(&'a str),
    Placeholder(Vec<&'a str>),
}

/// Renders template strings against a data mapping.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    strict: bool,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Renderer {
    /// With `strict` set, a placeholder naming a missing field is an error;
    /// otherwise it renders as the empty string.
    pub fn new(strict: bool) -> Self {
        Self { strict }
    }

    /// Substitute placeholders without escaping.
    pub fn render_text(&self, template: &str, data: &TemplateData) -> TemplateResult<String> {
        self.render(template, data, Escape::None)
    }

    /// Substitute placeholders, escaping values for inclusion in HTML markup.
    pub fn render_html(&self, template: &str, data: &TemplateData) -> TemplateResult<String> {
        self.render(template, data, Escape::Html)
    }

    /// Render every part of a version. The subject is always plain text.
    pub fn render_version(
        &self,
        version: &TemplateVersion,
        data: &TemplateData,
    ) -> TemplateResult<RenderedTemplate> {
        let subject = self.render_text(&version.subject, data)?;
        let body_html = version
            .body_html
            .as_deref()
            .map(|tpl| self.render_html(tpl, data))
            .transpose()?;
        let body_text = version
            .body_text
            .as_deref()
            .map(|tpl| self.render_text(tpl, data))
            .transpose()?;

        Ok(RenderedTemplate {
            subject,
            body_html,
            body_text,
        })
    }

    fn render(&self, template: &str, data: &TemplateData, escape: Escape) -> TemplateResult<String> {
        let segments = parse(template)?;
        let mut out = String::with_capacity(template.len());

        for segment in segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(path) => {
                    match TemplateValue::lookup(data, &path) {
                        Some(value) => {
                            let rendered = value.to_string();
                            match escape {
                                Escape::None => out.push_str(&rendered),
                                Escape::Html => escape_html_into(&rendered, &mut out),
                            }
                        }
                        None if self.strict => {
                            return Err(TemplateError::UndefinedVariable(path.join(".")));
                        }
                        None => {}
                    }
                }
            }
        }

        Ok(out)
    }
}

/// Check a template string for syntax errors without rendering it.
pub fn validate(template: &str) -> TemplateResult<()> {
    parse(template).map(|_| ())
}

fn parse(template: &str) -> TemplateResult<Vec<Segment<'_>>> {
    let mut segments = Vec::new();
    let mut rest = template;
    let mut base = 0;

    while let Some(start) = rest.find(OPEN) {
        if start > 0 {
            segments.push(Segment::Literal(&rest[..start]));
        }

        let offset = base + start;
        let after_open = &rest[start + OPEN.len()..];
        let end = after_open
            .find(CLOSE)
            .ok_or_else(|| TemplateError::syntax(offset, "unclosed placeholder"))?;

        let path = parse_expression(&after_open[..end], offset)?;
        segments.push(Segment::Placeholder(path));

        let consumed = start + OPEN.len() + end + CLOSE.len();
        rest = &rest[consumed..];
        base += consumed;
    }

    if !rest.is_empty() {
        segments.push(Segment::Literal(rest));
    }

    Ok(segments)
}

fn parse_expression(raw: &str, offset: usize) -> TemplateResult<Vec<&str>> {
    let expr = raw.trim();
    if expr.is_empty() {
        return Err(TemplateError::syntax(offset, "empty placeholder"));
    }

    let expr = expr.strip_prefix('.').unwrap_or(expr);
    let path: Vec<&str> = expr.split('.').collect();

    for segment in &path {
        if !is_identifier(segment) {
            return Err(TemplateError::syntax(
                offset,
                format!("invalid field reference `{}`", raw.trim()),
            ));
        }
    }

    Ok(path)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_alphanumeric() || c == '_' || c == '-')
}

fn escape_html_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
}
