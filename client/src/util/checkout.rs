//! Payment checkout widget bridge.
//!
//! SYSTEM CONTEXT
//! ==============
//! The dashboard creates an order on the backend, opens the hosted checkout
//! widget (`window.Razorpay`, loaded by `index.html`) with it, and forwards
//! the widget's signed result to `/api/payment/verify`. Only the option
//! building is pure; opening the widget needs the browser.

#[cfg(test)]
#[path = "checkout_test.rs"]
mod checkout_test;

use serde_json::Value;

use crate::net::types::{CreateOrderResponse, PaymentVerification};

pub const CHECKOUT_TITLE: &str = "Group Chat Access";
pub const CHECKOUT_DESCRIPTION: &str = "Join our exclusive group chat";
const THEME_COLOR: &str = "#667eea";

/// Widget options for `order`, without the callbacks.
pub fn checkout_options(order: &CreateOrderResponse, name: &str, email: &str) -> Value {
    serde_json::json!({
        "key": order.key_id,
        "amount": order.amount,
        "currency": order.currency,
        "name": CHECKOUT_TITLE,
        "description": CHECKOUT_DESCRIPTION,
        "order_id": order.order_id,
        "prefill": { "name": name, "email": email },
        "theme": { "color": THEME_COLOR },
    })
}

/// Parse the object the widget passes to its success handler.
///
/// # Errors
///
/// Returns the decode error when a field is missing.
pub fn parse_checkout_result(raw: &str) -> Result<PaymentVerification, serde_json::Error> {
    serde_json::from_str(raw)
}

/// Open the checkout widget.
///
/// `on_success` receives the signed payment triple; `on_dismiss` runs when
/// the user closes the widget without paying.
///
/// # Errors
///
/// Returns an error string when the widget script is not loaded or the
/// options cannot be handed to it.
#[cfg(feature = "csr")]
pub fn open_checkout(
    options: &Value,
    on_success: impl FnOnce(Result<PaymentVerification, String>) + 'static,
    on_dismiss: impl FnOnce() + 'static,
) -> Result<(), String> {
    use js_sys::{Function, Object, Reflect};
    use wasm_bindgen::JsCast;
    use wasm_bindgen::JsValue;
    use wasm_bindgen::closure::Closure;

    let window = web_sys::window().ok_or("no window")?;
    let ctor = Reflect::get(&window, &JsValue::from_str("Razorpay"))
        .ok()
        .and_then(|v| v.dyn_into::<Function>().ok())
        .ok_or("checkout script not loaded")?;

    let js_options = js_sys::JSON::parse(&options.to_string()).map_err(|e| format!("{e:?}"))?;

    let handler = Closure::once_into_js(move |response: JsValue| {
        let parsed = js_sys::JSON::stringify(&response)
            .map_err(|e| format!("{e:?}"))
            .and_then(|raw| {
                let raw: String = raw.into();
                parse_checkout_result(&raw).map_err(|e| e.to_string())
            });
        on_success(parsed);
    });
    Reflect::set(&js_options, &JsValue::from_str("handler"), &handler).map_err(|e| format!("{e:?}"))?;

    let modal = Object::new();
    let ondismiss = Closure::once_into_js(on_dismiss);
    Reflect::set(&modal, &JsValue::from_str("ondismiss"), &ondismiss).map_err(|e| format!("{e:?}"))?;
    Reflect::set(&js_options, &JsValue::from_str("modal"), &modal).map_err(|e| format!("{e:?}"))?;

    let widget = Reflect::construct(&ctor, &js_sys::Array::of1(&js_options)).map_err(|e| format!("{e:?}"))?;
    let open = Reflect::get(&widget, &JsValue::from_str("open"))
        .ok()
        .and_then(|v| v.dyn_into::<Function>().ok())
        .ok_or("checkout widget has no open()")?;
    open.call0(&widget).map_err(|e| format!("{e:?}"))?;
    Ok(())
}
