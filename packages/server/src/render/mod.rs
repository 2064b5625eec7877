//! Template rendering with site-wide option injection.
//!
//! Handlers render HTML through [`Renderer`], which merges process-wide
//! [`SiteOptions`] into the page data before executing the named template.
//! Whether injection happens is decided by the type of the render call, not
//! by a runtime shape test: [`Renderer::render_page`] takes a [`Page`] and
//! injects; [`Renderer::render_raw`] takes any serializable value and does
//! not.

pub mod engine;
pub mod helpers;

pub use engine::{CachedEngine, ReloadEngine, TemplateEngine};

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::response::Html;
use serde::Serialize;
use serde_json::Value;
use tera::Context;

use crate::config::AppConfig;
use crate::error::AppError;

/// Site-option keys injected into every page render, overwriting any
/// handler-supplied values at the same keys.
pub const INJECTED_KEYS: [&str; 11] = [
    "title",
    "favicon",
    "analytic",
    "site_url",
    "logo_url",
    "keywords",
    "miitbeian",
    "weibo_url",
    "custom_js",
    "github_url",
    "description",
];

/// Process-wide site configuration values, populated once at startup and
/// read-only thereafter. Shared by all concurrent renders.
#[derive(Debug, Clone, Default)]
pub struct SiteOptions {
    options: HashMap<String, String>,
}

impl SiteOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option during startup population.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.insert(key.into(), value.into());
    }

    /// Looks up an option; missing keys resolve to the empty string so a
    /// render never fails on an absent option.
    #[must_use]
    pub fn get_or_default(&self, key: &str) -> &str {
        self.options.get(key).map_or("", String::as_str)
    }
}

impl FromIterator<(String, String)> for SiteOptions {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().collect(),
        }
    }
}

/// Extensible key-value record for HTML page renders. This is the data
/// shape that receives site-option injection.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Page {
    #[serde(flatten)]
    values: BTreeMap<String, Value>,
}

impl Page {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a value, replacing any existing value at `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }
}

/// Renders named templates, injecting site options into page data.
///
/// The engine strategy (cached vs reload-per-render) is fixed at
/// construction from the run mode.
pub struct Renderer {
    engine: Box<dyn TemplateEngine>,
    site: Arc<SiteOptions>,
}

impl Renderer {
    /// Compiles the template set under the configured directory and selects
    /// the engine strategy for the run mode.
    ///
    /// # Errors
    ///
    /// Returns an error when any template fails to parse.
    pub fn new(config: &AppConfig, site: Arc<SiteOptions>) -> tera::Result<Self> {
        let glob = config.templates.glob();
        let engine: Box<dyn TemplateEngine> = if config.mode.is_dev() {
            Box::new(ReloadEngine::new(&glob)?)
        } else {
            Box::new(CachedEngine::new(&glob)?)
        };
        Ok(Self { engine, site })
    }

    /// Renders `name` after injecting the site options into `page`,
    /// overwriting any values the handler put at the injected keys.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Render`] when the template is missing or
    /// execution fails.
    pub fn render_page(&self, name: &str, mut page: Page) -> Result<Html<String>, AppError> {
        for key in INJECTED_KEYS {
            page.values.insert(
                key.to_owned(),
                Value::String(self.site.get_or_default(key).to_owned()),
            );
        }
        let ctx = Context::from_serialize(&page)?;
        Ok(Html(self.engine.render(name, &ctx)?))
    }

    /// Renders `name` against arbitrary data with no injection.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Render`] when serialization, template lookup, or
    /// execution fails.
    pub fn render_raw<T: Serialize>(&self, name: &str, data: &T) -> Result<Html<String>, AppError> {
        let ctx = Context::from_serialize(data)?;
        Ok(Html(self.engine.render(name, &ctx)?))
    }
}
