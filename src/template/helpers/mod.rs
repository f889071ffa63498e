//! Template helper set.
//!
//! Helpers are constructed per [`super::TemplateCompiler`] and registered into
//! its own registry. Locale-sensitive helpers read the ambient `__meta` from
//! the current block scope first, then from the render root.

mod blocks;
mod currency;
mod dates;
mod salutation;
mod translate;
mod values;

pub use currency::format_currency;
pub use dates::{format_date, format_date_range, parse_date};
pub use salutation::{infer_salutation, Salutation};
pub use values::{add, first_non_empty, first_valid, is_placeholder, loose_equals, strict_equals};

use std::sync::Arc;

use handlebars::{Context, Handlebars, Helper, RenderContext};
use serde_json::Value;

use super::META_KEY;
use crate::locale::Translator;
use crate::metrics::RenderMetrics;

/// Register the full helper set
pub fn register_helpers(registry: &mut Handlebars<'_>, translator: Arc<Translator>) {
    registry.register_helper("t", Box::new(translate::TranslateHelper::new(translator)));
    registry.register_helper("ifRTL", Box::new(blocks::DirectionHelper));
    registry.register_helper("ifEquals", Box::new(blocks::EqualsHelper::strict()));
    registry.register_helper(
        "ifEqualsIgnoreCase",
        Box::new(blocks::EqualsHelper::ignore_case()),
    );
    registry.register_helper("formatDate", Box::new(dates::FormatDateHelper));
    registry.register_helper("formatDateRange", Box::new(dates::FormatDateRangeHelper));
    registry.register_helper("now", Box::new(dates::NowHelper));
    registry.register_helper("formatCurrency", Box::new(currency::FormatCurrencyHelper));
    registry.register_helper("add", Box::new(values::AddHelper));
    registry.register_helper("or", Box::new(values::FirstNonEmptyHelper));
    registry.register_helper("firstValid", Box::new(values::FirstValidHelper));
    registry.register_helper("concat", Box::new(values::ConcatHelper));
    registry.register_helper("safe", Box::new(values::SafeHelper));
    registry.register_helper("salutation", Box::new(salutation::SalutationHelper));
}

/// Locale metadata visible to a helper invocation
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct AmbientMeta {
    pub locale: Option<String>,
    pub direction: Option<String>,
    pub intl_locale: Option<String>,
}

impl AmbientMeta {
    /// `__meta` of the current scope, else of the render root
    pub(crate) fn resolve<'reg: 'rc, 'rc>(
        ctx: &'rc Context,
        rc: &RenderContext<'reg, 'rc>,
    ) -> Self {
        let scoped = rc
            .evaluate(ctx, META_KEY)
            .ok()
            .map(|json| json.as_json().clone())
            .filter(Value::is_object);

        let meta = scoped.or_else(|| ctx.data().get(META_KEY).filter(|v| v.is_object()).cloned());

        let Some(meta) = meta else {
            return Self::default();
        };

        let field = |name: &str| {
            meta.get(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        Self {
            locale: field("locale"),
            direction: field("direction"),
            intl_locale: field("intlLocale"),
        }
    }

    pub(crate) fn is_rtl(&self) -> bool {
        self.direction.as_deref() == Some("rtl")
    }
}

static NULL: Value = Value::Null;

/// Positional parameter value; missing parameters read as null
pub(crate) fn param<'a>(h: &'a Helper<'_>, index: usize) -> &'a Value {
    h.param(index).map(|p| p.value()).unwrap_or(&NULL)
}

/// Wrap a helper result as owned JSON
pub(crate) fn derived<'rc>(value: Value) -> handlebars::ScopedJson<'rc> {
    handlebars::ScopedJson::Derived(value)
}

/// Signal a helper that received nothing to work with
pub(crate) fn record_empty(helper: &'static str) {
    tracing::warn!(helper = helper, "Template helper received an empty value");
    RenderMetrics::record_empty_value(helper);
}

/// Render a JSON value as template text
pub(crate) fn to_text(value: &Value) -> String {
    crate::locale::stringify(value)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use handlebars::Handlebars;
    use serde_json::{json, Value};

    use crate::locale::test_support::store_from;
    use crate::locale::Translator;

    /// A registry with every helper and a small translation set
    pub fn registry() -> Handlebars<'static> {
        let store = store_from(
            json!({"greeting": "Merhaba {{name}}", "only_tr": "Yalnızca"}),
            json!({"greeting": "Hello {{name}}", "footer": "Thanks"}),
            json!({"greeting": "مرحبا {{name}}"}),
            json!({}),
        );
        let mut registry = Handlebars::new();
        super::register_helpers(&mut registry, Arc::new(Translator::new(Arc::new(store))));
        registry
    }

    /// Render an inline template with the given data
    pub fn render(template: &str, data: Value) -> String {
        registry().render_template(template, &data).unwrap()
    }

    /// Render an inline template and return the error message, if any
    pub fn render_err(template: &str, data: Value) -> Option<String> {
        registry().render_template(template, &data).err().map(|e| e.to_string())
    }

    /// `__meta` block for a locale
    pub fn meta(locale: &str, direction: &str, intl: &str) -> Value {
        json!({"locale": locale, "direction": direction, "intlLocale": intl})
    }
}
