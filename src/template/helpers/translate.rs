//! `t` helper

use std::sync::Arc;

use handlebars::{
    Context, Handlebars, Helper, HelperDef, RenderContext, RenderError, RenderErrorReason,
    ScopedJson,
};
use serde_json::{Map, Value};

use super::{derived, AmbientMeta};
use crate::locale::Translator;

/// `{{t "welcome.title" name=customerName}}`
pub(super) struct TranslateHelper {
    translator: Arc<Translator>,
}

impl TranslateHelper {
    pub(super) fn new(translator: Arc<Translator>) -> Self {
        Self { translator }
    }
}

impl HelperDef for TranslateHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        let key = h
            .param(0)
            .ok_or(RenderErrorReason::ParamNotFoundForIndex("t", 0))?
            .value()
            .as_str()
            .ok_or(RenderErrorReason::InvalidParamType("string"))?;

        let Some(locale) = AmbientMeta::resolve(ctx, rc).locale else {
            tracing::warn!(key = %key, "t helper missing locale");
            return Ok(derived(Value::String(String::new())));
        };

        let params: Map<String, Value> = h
            .hash()
            .iter()
            .map(|(name, value)| (name.to_string(), value.value().clone()))
            .collect();

        let translation = self.translator.resolve(&locale, key, Some(&params));
        Ok(derived(Value::String(translation)))
    }
}
