//! Conditional block helpers

use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    Renderable, ScopedJson,
};
use serde_json::Value;

use super::values::{loose_equals, strict_equals};
use super::{derived, param, AmbientMeta};

/// `{{#ifRTL}}...{{else}}...{{/ifRTL}}`
pub(super) struct DirectionHelper;

impl HelperDef for DirectionHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let branch = if AmbientMeta::resolve(ctx, rc).is_rtl() {
            h.template()
        } else {
            h.inverse()
        };

        match branch {
            Some(t) => t.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}

/// `ifEquals` / `ifEqualsIgnoreCase`.
///
/// As a block it picks a branch; inline or as a subexpression it yields a bool.
pub(super) struct EqualsHelper {
    compare: fn(&Value, &Value) -> bool,
}

impl EqualsHelper {
    pub(super) fn strict() -> Self {
        Self {
            compare: strict_equals,
        }
    }

    pub(super) fn ignore_case() -> Self {
        Self {
            compare: loose_equals,
        }
    }
}

impl HelperDef for EqualsHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> Result<ScopedJson<'rc>, RenderError> {
        Ok(derived(Value::Bool((self.compare)(param(h, 0), param(h, 1)))))
    }

    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        let equal = (self.compare)(param(h, 0), param(h, 1));

        if !h.is_block() {
            out.write(if equal { "true" } else { "false" })?;
            return Ok(());
        }

        let branch = if equal { h.template() } else { h.inverse() };
        match branch {
            Some(t) => t.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}
