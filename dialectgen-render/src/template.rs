use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("template references undefined variable @{name}@")]
    UndefinedVariable { name: String },
}

/// Substitute `@NAME@` placeholders, where `NAME` is `[A-Za-z0-9_]+`.
///
/// An `@` that does not open a well-formed placeholder is copied through unchanged, so
/// e-mail addresses and `@@` survive. A well-formed placeholder with no value is an error.
pub fn render_template(
    template: &str,
    vars: &BTreeMap<String, String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(at) = rest.find('@') {
        out.push_str(&rest[..at]);
        let after = &rest[at + 1..];

        let name_len = after
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(after.len());
        let closed = name_len > 0 && after[name_len..].starts_with('@');

        if !closed {
            out.push('@');
            rest = after;
            continue;
        }

        let name = &after[..name_len];
        let value = vars
            .get(name)
            .ok_or_else(|| TemplateError::UndefinedVariable {
                name: name.to_string(),
            })?;
        out.push_str(value);
        rest = &after[name_len + 1..];
    }

    out.push_str(rest);
    Ok(out)
}
