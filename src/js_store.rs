use async_trait::async_trait;
use js_sys::{Function, Promise, Reflect};
use serde::Serialize;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;

use crate::error::StoreError;
use crate::records::RecordKind;
use crate::upload::RecordStore;

/// A [`RecordStore`] backed by a JS function `submit(table, record)`.
///
/// The function may return a value, a promise or any thenable (such as a
/// query builder). A rejection, a synchronous throw, or a resolved
/// `{ error: { message, code } }` object counts as a failed insert.
pub struct JsRecordStore {
    submit: Function,
}

impl JsRecordStore {
    pub fn new(submit: Function) -> Self {
        Self { submit }
    }
}

#[async_trait(?Send)]
impl RecordStore for JsRecordStore {
    async fn insert(&self, kind: RecordKind, record: serde_json::Value) -> Result<(), StoreError> {
        let js_record = record
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| StoreError::new(e.to_string()))?;

        let returned = self
            .submit
            .call2(&JsValue::NULL, &JsValue::from_str(kind.table_name()), &js_record)
            .map_err(store_error_from_js)?;

        let resolved = JsFuture::from(Promise::resolve(&returned))
            .await
            .map_err(store_error_from_js)?;

        match get_property(&resolved, "error") {
            Some(error) => Err(store_error_from_js(error)),
            None => Ok(()),
        }
    }
}

fn get_property(target: &JsValue, key: &str) -> Option<JsValue> {
    if !target.is_object() {
        return None;
    }
    Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn store_error_from_js(value: JsValue) -> StoreError {
    let message = get_property(&value, "message")
        .and_then(|m| m.as_string())
        .or_else(|| value.as_string())
        .unwrap_or_else(|| "Unknown error".to_string());

    let code = get_property(&value, "code").and_then(|c| {
        c.as_string()
            .or_else(|| c.as_f64().map(|n| n.to_string()))
    });

    StoreError { message, code }
}
