//! Layered prompt builder.
//!
//! A system prompt is a stack of text sections: a base template followed by
//! whichever conditional instruction blocks apply to the current turn.
//! Sections are trimmed, empty ones are dropped, and the rest are joined with
//! a blank line.
//!
//! Only sections added with [`template()`](PromptBuilder::template) are
//! scanned for `{{key}}` placeholders, in one left-to-right pass, so a
//! substituted value is never expanded again.  Text added with
//! [`append()`](PromptBuilder::append) and every variable value may carry
//! request data; their `{{`/`}}` pairs are collapsed to single braces so they
//! can never read as placeholders.

use std::collections::HashMap;

const SEPARATOR: &str = "\n\n";

#[derive(Debug)]
enum Section {
    Template(String),
    Text(String),
}

/// Fluent builder that assembles a prompt from text sections.
///
/// ```rust
/// use mentavo_tutor::tutor::prompt::PromptBuilder;
///
/// let prompt = PromptBuilder::new()
///     .template("Dziś: {{topic}}")
///     .append_if(true, "## UMIEJĘTNOŚĆ")
///     .var("topic", "pochodne")
///     .build();
/// assert_eq!(prompt, "Dziś: pochodne\n\n## UMIEJĘTNOŚĆ");
/// ```
#[derive(Debug, Default)]
pub struct PromptBuilder {
    sections: Vec<Section>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section whose `{{key}}` placeholders are substituted.
    pub fn template(mut self, text: impl AsRef<str>) -> Self {
        if let Some(t) = non_empty(text.as_ref()) {
            self.sections.push(Section::Template(t));
        }
        self
    }

    /// Append a literal text section.
    pub fn append(mut self, text: impl AsRef<str>) -> Self {
        if let Some(t) = non_empty(text.as_ref()) {
            self.sections.push(Section::Text(neutralize(&t)));
        }
        self
    }

    /// Append `text` only when `cond` holds.
    pub fn append_if(self, cond: bool, text: impl AsRef<str>) -> Self {
        if cond { self.append(text) } else { self }
    }

    /// Register a single `{{key}}` → `value` substitution.
    pub fn var(mut self, key: &str, value: impl AsRef<str>) -> Self {
        self.vars.insert(key.to_string(), neutralize(value.as_ref()));
        self
    }

    /// Join all sections with blank lines, substituting template sections.
    pub fn build(self) -> String {
        let vars = self.vars;
        self.sections
            .into_iter()
            .map(|section| match section {
                Section::Template(t) => substitute(&t, &vars),
                Section::Text(t) => t,
            })
            .collect::<Vec<_>>()
            .join(SEPARATOR)
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Collapse `{{` and `}}` until none remain.
fn neutralize(text: &str) -> String {
    let mut out = text.to_string();
    while out.contains("{{") || out.contains("}}") {
        out = out.replace("{{", "{").replace("}}", "}");
    }
    out
}

/// Single pass over `template`; unknown placeholders are kept verbatim.
fn substitute(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let key = &after[..end];
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => {
                out.push_str("{{");
                out.push_str(key);
                out.push_str("}}");
            }
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}
