//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}

/// Returns the content hash for main.css.
///
/// The hash is computed at build time from the CSS file content.
///
/// Usage in templates: `{{ ""|css_hash }}`
#[askama::filter_fn]
pub fn css_hash(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<&'static str> {
    Ok(env!("CSS_HASH"))
}

/// Returns the content hash for shop.js.
///
/// Usage in templates: `{{ ""|shop_js_hash }}`
#[askama::filter_fn]
pub fn shop_js_hash(
    _value: impl Display,
    _env: &dyn askama::Values,
) -> askama::Result<&'static str> {
    Ok(env!("SHOP_JS_HASH"))
}

/// Returns the content hash for dashboard.js.
///
/// Usage in templates: `{{ ""|dashboard_js_hash }}`
#[askama::filter_fn]
pub fn dashboard_js_hash(
    _value: impl Display,
    _env: &dyn askama::Values,
) -> askama::Result<&'static str> {
    Ok(env!("DASHBOARD_JS_HASH"))
}

/// Formats an amount with a currency sign.
///
/// Usage in templates: `{{ product.price|money }}`
#[askama::filter_fn]
pub fn money(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format!("${value}"))
}
