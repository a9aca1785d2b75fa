//! Prompts sent to chat completion models
//!
//! A [`Prompt`] is a user message with an optional system message. The user message is a
//! [`Template`] and can carry context for substitution:
//!
//! ```
//! # use marquee_core::template::Template;
//! let prompt = Template::from("Summarize {{ title }}")
//!     .to_prompt()
//!     .with_system("You are a film critic.")
//!     .with_context_value("title", "Alien");
//!
//! assert_eq!(prompt.render().unwrap(), "Summarize Alien");
//! assert_eq!(
//!     prompt.render_system().unwrap().as_deref(),
//!     Some("You are a film critic.")
//! );
//! ```
use anyhow::Result;

use crate::template::Template;

/// A Prompt can be used with large language models to prompt.
#[derive(Clone, Debug)]
pub struct Prompt {
    system: Option<Template>,
    template: Template,
    context: Option<tera::Context>,
}

impl Prompt {
    /// Sets the system message, rendered with the same context as the user message
    #[must_use]
    pub fn with_system(mut self, system: impl Into<Template>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Adds anything that implements [Into<tera::Context>] to the Prompt
    #[must_use]
    pub fn with_context(mut self, new_context: impl Into<tera::Context>) -> Self {
        let context = self.context.get_or_insert_with(tera::Context::default);
        context.extend(new_context.into());

        self
    }

    /// Adds a key-value pair to the context of the Prompt
    #[must_use]
    pub fn with_context_value(mut self, key: &str, value: impl Into<tera::Value>) -> Self {
        let context = self.context.get_or_insert_with(tera::Context::default);
        context.insert(key, &value.into());
        self
    }

    /// Renders the user message
    ///
    /// If no context is provided, the prompt will be rendered as is.
    ///
    /// # Errors
    ///
    /// See `Template::render`
    pub fn render(&self) -> Result<String> {
        render_with(&self.template, self.context.as_ref())
    }

    /// Renders the system message, if there is one
    ///
    /// # Errors
    ///
    /// See `Template::render`
    pub fn render_system(&self) -> Result<Option<String>> {
        self.system
            .as_ref()
            .map(|system| render_with(system, self.context.as_ref()))
            .transpose()
    }
}

fn render_with(template: &Template, context: Option<&tera::Context>) -> Result<String> {
    match context {
        Some(context) => template.render(context),
        None => Ok(template.as_str().to_string()),
    }
}

impl From<&'static str> for Prompt {
    fn from(prompt: &'static str) -> Self {
        Template::Static(prompt).into()
    }
}

impl From<String> for Prompt {
    fn from(prompt: String) -> Self {
        Template::String(prompt).into()
    }
}

impl From<Template> for Prompt {
    fn from(template: Template) -> Self {
        Prompt {
            system: None,
            template,
            context: None,
        }
    }
}

impl From<&Template> for Prompt {
    fn from(template: &Template) -> Self {
        template.clone().into()
    }
}
