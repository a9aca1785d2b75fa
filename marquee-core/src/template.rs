use anyhow::{Context as _, Result};
use tera::Tera;

use crate::prompt::Prompt;

/// A `Template` defines a template for a prompt
///
/// Templates are rendered with [tera], so jinja style substitutions like `{{ text }}` are
/// available. A template rendered without any context is returned as is.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Template {
    String(String),
    Static(&'static str),
}

impl Template {
    pub fn from_string(template: impl Into<String>) -> Template {
        Template::String(template.into())
    }

    /// Renders the template with the given context
    ///
    /// # Errors
    ///
    /// - The template has syntax errors
    /// - Context is missing that is required by the template
    pub fn render(&self, context: &tera::Context) -> Result<String> {
        Tera::one_off(self.as_str(), context, false).context("Failed to render one-off template")
    }

    /// The raw, unrendered template
    pub fn as_str(&self) -> &str {
        match self {
            Template::String(template) => template,
            Template::Static(template) => template,
        }
    }

    /// Builds a Prompt from a template with an empty context
    pub fn to_prompt(&self) -> Prompt {
        self.into()
    }
}

impl From<&'static str> for Template {
    fn from(template: &'static str) -> Self {
        Template::Static(template)
    }
}

impl From<String> for Template {
    fn from(template: String) -> Self {
        Template::String(template)
    }
}
