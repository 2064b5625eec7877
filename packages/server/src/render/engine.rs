//! Template engine strategies.
//!
//! The run mode selects one of two [`TemplateEngine`] implementations at
//! construction time, so the render path itself carries no mode branch:
//!
//! - [`CachedEngine`]: compiled once at startup, lock-free concurrent reads.
//!   On-disk edits are invisible until restart.
//! - [`ReloadEngine`]: recompiles the template set and re-registers the
//!   helper table from disk before every render, so edits show up
//!   immediately. The rebuild is guarded by a lock so concurrent renders
//!   never observe a half-built set. Acceptable only at development traffic.

use parking_lot::Mutex;
use tera::{Context, Tera};

use super::helpers;

/// Executes a named template against a render context.
pub trait TemplateEngine: Send + Sync {
    /// Renders `name` with `ctx`.
    ///
    /// # Errors
    ///
    /// Returns an error when the template is missing or execution fails.
    fn render(&self, name: &str, ctx: &Context) -> tera::Result<String>;
}

/// Production strategy: one compiled set for the process lifetime.
pub struct CachedEngine {
    tera: Tera,
}

impl CachedEngine {
    /// Compiles every template matching `glob` and registers the helper
    /// table.
    ///
    /// # Errors
    ///
    /// Returns an error when any template fails to parse.
    pub fn new(glob: &str) -> tera::Result<Self> {
        let mut tera = Tera::new(glob)?;
        helpers::register(&mut tera);
        Ok(Self { tera })
    }
}

impl TemplateEngine for CachedEngine {
    fn render(&self, name: &str, ctx: &Context) -> tera::Result<String> {
        self.tera.render(name, ctx)
    }
}

/// Development strategy: rebuild from disk on every render.
pub struct ReloadEngine {
    tera: Mutex<Tera>,
}

impl ReloadEngine {
    /// Compiles the initial set; later renders recompile from the same glob.
    ///
    /// # Errors
    ///
    /// Returns an error when any template fails to parse.
    pub fn new(glob: &str) -> tera::Result<Self> {
        let mut tera = Tera::new(glob)?;
        helpers::register(&mut tera);
        Ok(Self {
            tera: Mutex::new(tera),
        })
    }
}

impl TemplateEngine for ReloadEngine {
    fn render(&self, name: &str, ctx: &Context) -> tera::Result<String> {
        let mut tera = self.tera.lock();
        tera.full_reload()?;
        helpers::register(&mut tera);
        tera.render(name, ctx)
    }
}
