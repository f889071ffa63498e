//! Render orchestration

use std::sync::Arc;
use std::time::Instant;

use handlebars::Context;
use serde_json::{Map, Value};

use super::compiler::{CompilerStats, TemplateCompiler, TemplateConfig};
use super::{TemplateError, TemplateResult, I18N_KEY, META_KEY};
use crate::locale::{LocaleStore, MetaResolver, SubjectResolver, Translator};
use crate::metrics::RenderMetrics;
use crate::normalize::DataNormalizer;

/// Renders email templates for a locale and payload.
///
/// Owns the compiler and every locale-dependent resolver; cheap to share
/// behind an `Arc`.
pub struct EmailRenderer {
    compiler: TemplateCompiler,
    store: Arc<LocaleStore>,
    meta: MetaResolver,
    subjects: SubjectResolver,
    normalizer: DataNormalizer,
}

impl EmailRenderer {
    /// Build a renderer; fails if a partial cannot be read or compiled
    pub fn new(
        config: TemplateConfig,
        store: Arc<LocaleStore>,
        logo_url: Option<String>,
    ) -> TemplateResult<Self> {
        let translator = Arc::new(Translator::new(store.clone()));
        let compiler = TemplateCompiler::new(config, translator)?;

        Ok(Self {
            compiler,
            meta: MetaResolver::new(store.clone(), logo_url),
            subjects: SubjectResolver::new(store.clone()),
            store,
            normalizer: DataNormalizer::new(),
        })
    }

    /// Render `key` for `locale` with `data`.
    ///
    /// Payload keys named `__i18n` or `__meta` are replaced by the engine's
    /// own values.
    pub fn render(&self, key: &str, locale: &str, data: &Map<String, Value>) -> TemplateResult<String> {
        let started = Instant::now();

        let result = self.render_inner(key, locale, data);

        match &result {
            Ok(_) => RenderMetrics::record_success(key, started.elapsed().as_secs_f64()),
            Err(_) => RenderMetrics::record_failure(key),
        }

        result
    }

    fn render_inner(&self, key: &str, locale: &str, data: &Map<String, Value>) -> TemplateResult<String> {
        let mut context = self.normalizer.normalize(data);
        context.insert(I18N_KEY.to_string(), self.store.translations_for(locale).clone());
        context.insert(META_KEY.to_string(), locale_meta_value(&self.meta, locale));

        self.compiler
            .render(key, &Context::from(Value::Object(context)))?
            .map_err(|source| {
                tracing::error!(
                    template = %key,
                    locale = %locale,
                    error = %source,
                    "Template rendering failed"
                );
                TemplateError::Render {
                    key: key.to_string(),
                    locale: locale.to_string(),
                    source,
                }
            })
    }

    /// Whether a template source exists for `key`
    pub fn has_template(&self, key: &str) -> bool {
        self.compiler.has_template(key)
    }

    /// Localized default subject for `key`
    pub fn subject(&self, locale: &str, key: &str) -> String {
        self.subjects.resolve(locale, key)
    }

    /// Drop compiled templates and reload partials; returns the partial count
    pub fn clear_cache(&self) -> TemplateResult<usize> {
        self.compiler.clear_cache()
    }

    pub fn stats(&self) -> CompilerStats {
        self.compiler.stats()
    }
}

fn locale_meta_value(resolver: &MetaResolver, locale: &str) -> Value {
    // LocaleMeta holds only strings and unit enums
    serde_json::to_value(resolver.resolve(locale)).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::test_support::store_from;
    use serde_json::json;
    use std::fs;

    fn renderer(templates: &[(&str, &str)]) -> (tempfile::TempDir, EmailRenderer) {
        let dir = tempfile::tempdir().unwrap();
        for (name, source) in templates {
            fs::write(dir.path().join(format!("{}.hbs", name)), source).unwrap();
        }

        let store = store_from(
            json!({
                "meta": {"direction": "ltr", "align": "left", "fontFamily": "Arial"},
                "subjects": {"welcome": "Hoş geldiniz"},
                "welcome": {"title": "Merhaba {{name}}"}
            }),
            json!({
                "meta": {"direction": "ltr", "align": "left", "fontFamily": "Arial"},
                "subjects": {"welcome": "Welcome"},
                "welcome": {"title": "Hello {{name}}"}
            }),
            json!({
                "meta": {"direction": "rtl", "align": "right", "fontFamily": "Tahoma"},
                "welcome": {"title": "مرحبا {{name}}"}
            }),
            json!({"welcome": {}}),
        );

        let renderer = EmailRenderer::new(
            TemplateConfig::new(dir.path()),
            Arc::new(store),
            Some("cid:logo".to_string()),
        )
        .unwrap();
        (dir, renderer)
    }

    fn data(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_render_injects_translations_and_meta() {
        let (_dir, r) = renderer(&[(
            "welcome",
            r#"<html dir="{{__meta.direction}}" style="text-align: {{__meta.align}}">{{t "welcome.title" name=name}} {{__i18n.welcome.title}}</html>"#,
        )]);

        let html = r.render("welcome", "ar", &data(json!({"name": "Ava"}))).unwrap();
        assert_eq!(
            html,
            r#"<html dir="rtl" style="text-align: right">مرحبا Ava مرحبا {{name}}</html>"#
        );
    }

    #[test]
    fn test_render_normalizes_payload() {
        let (_dir, r) = renderer(&[("card", "{{cardLast4}}|{{cardLogoUrl}}")]);

        let html = r
            .render(
                "card",
                "en",
                &data(json!({"payment": {"cardLast4": "1234"}, "cardLogoUrl": "https://x.example/l.png"})),
            )
            .unwrap();
        assert_eq!(html, "1234|");
    }

    #[test]
    fn test_reserved_keys_are_overwritten() {
        let (_dir, r) = renderer(&[("meta", "{{__meta.locale}}|{{__meta.logoUrl}}")]);
        let html = r
            .render("meta", "tr", &data(json!({"__meta": {"locale": "xx"}})))
            .unwrap();
        assert_eq!(html, "tr|cid:logo");
    }

    #[test]
    fn test_unknown_template() {
        let (_dir, r) = renderer(&[]);
        assert!(matches!(
            r.render("missing", "en", &Map::new()),
            Err(TemplateError::NotFound(_))
        ));
        assert!(!r.has_template("missing"));
    }

    #[test]
    fn test_render_error_carries_context() {
        let (_dir, r) = renderer(&[("bad", "{{formatCurrency amount}}")]);
        let err = r
            .render("bad", "he", &data(json!({"amount": "lots"})))
            .unwrap_err();
        assert!(matches!(
            err,
            TemplateError::Render { ref key, ref locale, .. } if key == "bad" && locale == "he"
        ));
    }

    #[test]
    fn test_subject() {
        let (_dir, r) = renderer(&[]);
        assert_eq!(r.subject("tr", "welcome"), "Hoş geldiniz");
        assert_eq!(r.subject("ar", "welcome"), "Welcome");
        assert_eq!(r.subject("ar", "newsletter"), "newsletter");
    }

    #[test]
    fn test_render_twice_compiles_once() {
        let (_dir, r) = renderer(&[("welcome", "{{name}}")]);
        r.render("welcome", "en", &data(json!({"name": "A"}))).unwrap();
        r.render("welcome", "en", &data(json!({"name": "B"}))).unwrap();
        assert_eq!(r.stats().compilations, 1);

        r.clear_cache().unwrap();
        r.render("welcome", "en", &data(json!({"name": "C"}))).unwrap();
        assert_eq!(r.stats().compilations, 2);
    }
}
