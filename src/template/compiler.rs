//! Template compilation and caching

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use handlebars::{Context, Handlebars, RenderError, Template};
use serde::Serialize;

use super::helpers::register_helpers;
use super::{validate_template_key, TemplateError, TemplateResult};
use crate::locale::Translator;
use crate::metrics::RenderMetrics;

/// Registry name prefix for top-level templates, keeping them apart from partials
const TEMPLATE_PREFIX: &str = "template:";

/// File extension of template and partial sources
const TEMPLATE_EXTENSION: &str = "hbs";

/// Template location settings
#[derive(Debug, Clone)]
pub struct TemplateConfig {
    /// Directory holding `<key>.hbs` files
    pub templates_dir: PathBuf,

    /// Directory holding reusable partials (optional on disk)
    pub partials_dir: PathBuf,
}

impl TemplateConfig {
    /// Templates in `templates_dir`, partials in `templates_dir/partials`
    pub fn new(templates_dir: impl Into<PathBuf>) -> Self {
        let templates_dir = templates_dir.into();
        let partials_dir = templates_dir.join("partials");
        Self {
            templates_dir,
            partials_dir,
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CompilerStats {
    /// Compiled templates currently cached
    pub cached: usize,
    /// Registered partials
    pub partials: usize,
    /// Total compilations since startup
    pub compilations: u64,
}

/// Compiles template sources on first use and keeps them until cleared.
///
/// Each compiler owns its registry and helper set. Compiling the same key
/// concurrently is harmless: the second registration overwrites the first
/// with an identical template.
pub struct TemplateCompiler {
    config: TemplateConfig,
    registry: RwLock<Handlebars<'static>>,
    compilations: AtomicU64,
}

impl TemplateCompiler {
    /// Build a compiler with helpers and partials registered
    pub fn new(config: TemplateConfig, translator: Arc<Translator>) -> TemplateResult<Self> {
        let mut registry = Handlebars::new();
        register_helpers(&mut registry, translator);

        let partials = read_partials(&config.partials_dir)?;
        let count = register_partials(&mut registry, partials)?;
        tracing::info!(count = count, "Handlebars partials registered");

        Ok(Self {
            config,
            registry: RwLock::new(registry),
            compilations: AtomicU64::new(0),
        })
    }

    pub fn config(&self) -> &TemplateConfig {
        &self.config
    }

    /// Make sure `key` is compiled and cached
    pub fn compile(&self, key: &str) -> TemplateResult<()> {
        self.with_compiled(key, |_, _| ())
    }

    /// Render `key` against a prepared context, compiling it on a miss.
    ///
    /// The outer error covers loading and compiling; the inner one is the
    /// execution result.
    pub fn render(&self, key: &str, context: &Context) -> TemplateResult<Result<String, RenderError>> {
        self.with_compiled(key, |registry, name| registry.render_with_context(name, context))
    }

    /// Run `f` against the registry while `key` is guaranteed to be registered.
    ///
    /// The lock taken for the lookup (or the compile) is held until `f`
    /// returns, so a concurrent `clear_cache` cannot drop the template in
    /// between.
    fn with_compiled<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Handlebars<'static>, &str) -> T,
    ) -> TemplateResult<T> {
        validate_template_key(key)?;
        let name = registry_name(key);

        {
            let registry = self.read();
            if registry.has_template(&name) {
                return Ok(f(&*registry, name.as_str()));
            }
        }

        let template = self.load(key)?;

        let mut registry = self.write();
        registry.register_template(&name, template);
        let cached = count_templates(&registry);

        self.compilations.fetch_add(1, Ordering::Relaxed);
        RenderMetrics::record_compilation(cached);
        tracing::debug!(template = %key, "Template compiled");

        Ok(f(&*registry, name.as_str()))
    }

    fn load(&self, key: &str) -> TemplateResult<Template> {
        let path = self.template_path(key);
        let source = std::fs::read_to_string(&path).map_err(|e| {
            tracing::debug!(template = %key, path = %path.display(), error = %e, "Template source unreadable");
            TemplateError::NotFound(key.to_string())
        })?;

        Template::compile(&source).map_err(|source| TemplateError::Compile {
            key: key.to_string(),
            source,
        })
    }

    /// Whether a source file exists for `key`; does not compile
    pub fn has_template(&self, key: &str) -> bool {
        validate_template_key(key).is_ok() && self.template_path(key).is_file()
    }

    /// Drop every compiled template and reload partials from disk.
    ///
    /// Returns the number of partials registered.
    pub fn clear_cache(&self) -> TemplateResult<usize> {
        let partials = read_partials(&self.config.partials_dir)?;

        let count = {
            let mut registry = self.write();
            registry.clear_templates();
            register_partials(&mut registry, partials)?
        };

        RenderMetrics::record_cache_cleared();
        tracing::info!(partials = count, "Template cache cleared");

        Ok(count)
    }

    pub fn stats(&self) -> CompilerStats {
        let registry = self.read();
        let cached = count_templates(&registry);
        CompilerStats {
            cached,
            partials: registry.get_templates().len() - cached,
            compilations: self.compilations.load(Ordering::Relaxed),
        }
    }

    fn template_path(&self, key: &str) -> PathBuf {
        self.config
            .templates_dir
            .join(format!("{}.{}", key, TEMPLATE_EXTENSION))
    }

    fn read(&self) -> RwLockReadGuard<'_, Handlebars<'static>> {
        self.registry.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Handlebars<'static>> {
        self.registry.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn registry_name(key: &str) -> String {
    format!("{}{}", TEMPLATE_PREFIX, key)
}

fn count_templates(registry: &Handlebars<'_>) -> usize {
    registry
        .get_templates()
        .keys()
        .filter(|name| name.starts_with(TEMPLATE_PREFIX))
        .count()
}

/// Read `(name, source)` for every `*.hbs` in `dir`; a missing directory yields none
fn read_partials(dir: &Path) -> TemplateResult<Vec<(String, String)>> {
    if !dir.is_dir() {
        tracing::info!(path = %dir.display(), "No partials directory found, skipping partial registration");
        return Ok(Vec::new());
    }

    let entries = std::fs::read_dir(dir).map_err(|source| TemplateError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut partials = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| TemplateError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();

        if path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION) {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };

        let source = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        partials.push((name.to_string(), source));
    }

    Ok(partials)
}

fn register_partials(
    registry: &mut Handlebars<'static>,
    partials: Vec<(String, String)>,
) -> TemplateResult<usize> {
    let count = partials.len();
    for (name, source) in partials {
        registry
            .register_partial(&name, source)
            .map_err(|source| TemplateError::Partial { name, source })?;
    }
    Ok(count)
}
