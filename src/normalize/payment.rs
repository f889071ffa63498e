//! Payment field reconciliation

use serde_json::{Map, Value};

/// Top-level aliases per logical field, highest priority first
const PAYMENT_DATE: &[&str] = &["paymentDate", "payment_date", "paidAt", "paymentDateTime"];
const PAYMENT_STATUS: &[&str] = &["paymentStatus", "payment_status", "paymentState"];
const CARD_BRAND: &[&str] = &["cardBrand", "card_brand", "cardType", "cardScheme"];
const CARD_LAST4: &[&str] = &["cardLast4", "cardLastFour", "card_last4", "lastFourDigits", "last4"];
const CARD_HOLDER: &[&str] = &["cardHolder", "cardHolderName", "cardholderName", "card_holder"];
const CURRENCY: &[&str] = &["currency", "currencyCode", "currency_code"];
const TOTAL_AMOUNT: &[&str] = &["totalAmount", "total_amount", "totalPrice", "amount"];
const CARD_LOGO: &[&str] = &["cardLogoUrl", "cardLogo", "cardBrandLogo", "cardBrandLogoUrl"];

/// Aliases looked up under the nested `payment` object
const NESTED_PAYMENT_DATE: &[&str] = &["paymentDate", "date", "paidAt"];
const NESTED_PAYMENT_STATUS: &[&str] = &["paymentStatus", "status"];
const NESTED_CARD_BRAND: &[&str] = &["cardBrand", "brand", "cardType"];
const NESTED_CARD_LAST4: &[&str] = &["cardLast4", "cardLastFour", "last4", "lastFourDigits"];
const NESTED_CARD_HOLDER: &[&str] = &["cardHolder", "cardHolderName", "holderName"];
const NESTED_CURRENCY: &[&str] = &["currency", "currencyCode"];
const NESTED_TOTAL_AMOUNT: &[&str] = &["totalAmount", "amount", "total"];
const NESTED_CARD_LOGO: &[&str] = &["cardLogoUrl", "cardLogo", "logoUrl"];

/// Domain fallbacks, consulted after every alias
const CARD_HOLDER_FALLBACK: &[&str] = &["customerName"];
const TOTAL_AMOUNT_FALLBACK: &[&str] = &["approxAmount", "approximateAmount"];

/// Prefixes an inline image reference may start with
const SAFE_LOGO_PREFIXES: &[&str] = &["cid:", "data:", "/"];

/// Canonical output names
pub const PAYMENT_DATE_FIELD: &str = "paymentDate";
pub const PAYMENT_STATUS_FIELD: &str = "paymentStatus";
pub const CARD_BRAND_FIELD: &str = "cardBrand";
pub const CARD_LAST4_FIELD: &str = "cardLast4";
pub const CARD_HOLDER_FIELD: &str = "cardHolder";
pub const CURRENCY_FIELD: &str = "currency";
pub const TOTAL_AMOUNT_FIELD: &str = "totalAmount";
pub const CARD_LOGO_FIELD: &str = "cardLogoUrl";

/// Absent, null and `""` are empty; `0` and `false` are present.
pub fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

/// True for string values that reference an inline or same-origin image.
///
/// Protocol-relative references (`//host`, `/\host`) point at another
/// origin and are rejected.
pub fn is_safe_logo(value: &Value) -> bool {
    value.as_str().is_some_and(|s| {
        SAFE_LOGO_PREFIXES.iter().any(|prefix| s.starts_with(prefix))
            && !s.starts_with("//")
            && !s.starts_with("/\\")
    })
}

/// Reconciled payment fields, each present only if some candidate was non-empty
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentFields {
    pub payment_date: Option<Value>,
    pub payment_status: Option<Value>,
    pub card_brand: Option<Value>,
    pub card_last4: Option<Value>,
    pub card_holder: Option<Value>,
    pub currency: Option<Value>,
    pub total_amount: Option<Value>,
    pub card_logo_url: Option<Value>,
}

impl PaymentFields {
    /// Collect every logical field from a payload
    pub fn collect(payload: &Map<String, Value>) -> Self {
        let nested = payload.get("payment").and_then(Value::as_object);
        let pick = |top: &[&str], inner: &[&str], fallback: &[&str]| {
            first_present(Some(payload), top)
                .or_else(|| first_present(nested, inner))
                .or_else(|| first_present(Some(payload), fallback))
                .cloned()
        };

        Self {
            payment_date: pick(PAYMENT_DATE, NESTED_PAYMENT_DATE, &[]),
            payment_status: pick(PAYMENT_STATUS, NESTED_PAYMENT_STATUS, &[]),
            card_brand: pick(CARD_BRAND, NESTED_CARD_BRAND, &[]),
            card_last4: pick(CARD_LAST4, NESTED_CARD_LAST4, &[]),
            card_holder: pick(CARD_HOLDER, NESTED_CARD_HOLDER, CARD_HOLDER_FALLBACK),
            currency: pick(CURRENCY, NESTED_CURRENCY, &[]),
            total_amount: pick(TOTAL_AMOUNT, NESTED_TOTAL_AMOUNT, TOTAL_AMOUNT_FALLBACK),
            card_logo_url: pick(CARD_LOGO, NESTED_CARD_LOGO, &[]),
        }
    }

    /// Canonical name and value for every field except the logo
    pub fn canonical(&self) -> [(&'static str, Option<&Value>); 7] {
        [
            (PAYMENT_DATE_FIELD, self.payment_date.as_ref()),
            (PAYMENT_STATUS_FIELD, self.payment_status.as_ref()),
            (CARD_BRAND_FIELD, self.card_brand.as_ref()),
            (CARD_LAST4_FIELD, self.card_last4.as_ref()),
            (CARD_HOLDER_FIELD, self.card_holder.as_ref()),
            (CURRENCY_FIELD, self.currency.as_ref()),
            (TOTAL_AMOUNT_FIELD, self.total_amount.as_ref()),
        ]
    }
}

fn first_present<'a>(source: Option<&'a Map<String, Value>>, aliases: &[&str]) -> Option<&'a Value> {
    let source = source?;
    aliases
        .iter()
        .map(|alias| source.get(*alias))
        .find(|value| !is_empty(*value))
        .flatten()
}

/// Drop every logo alias, top-level and under `payment`
pub(super) fn strip_logo(payload: &mut Map<String, Value>) {
    for alias in CARD_LOGO {
        payload.remove(*alias);
    }

    if let Some(Value::Object(payment)) = payload.get_mut("payment") {
        for alias in NESTED_CARD_LOGO {
            payment.remove(*alias);
        }
    }
}
