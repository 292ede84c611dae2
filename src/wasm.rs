//! Browser bindings: web storage media and a JS-facing store wrapper.

use wasm_bindgen::prelude::*;

use crate::config::StoreOptions;
use crate::error::StoreError;
use crate::medium::{StorageArea, StorageMedium};
use crate::store::Store;

#[wasm_bindgen(inline_js = "
export function local_storage_area() { return globalThis.localStorage ?? null; }
export function session_storage_area() { return globalThis.sessionStorage ?? null; }
")]
extern "C" {
    #[wasm_bindgen(catch)]
    fn local_storage_area() -> Result<Option<WebStorage>, JsValue>;

    #[wasm_bindgen(catch)]
    fn session_storage_area() -> Result<Option<WebStorage>, JsValue>;
}

#[wasm_bindgen]
extern "C" {
    /// The DOM `Storage` interface.
    #[wasm_bindgen(js_name = Storage)]
    pub type WebStorage;

    #[wasm_bindgen(method, catch, js_name = getItem)]
    fn get_item(this: &WebStorage, key: &str) -> Result<Option<String>, JsValue>;

    #[wasm_bindgen(method, catch, js_name = setItem)]
    fn set_item(this: &WebStorage, key: &str, value: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_name = removeItem)]
    fn remove_item(this: &WebStorage, key: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn clear(this: &WebStorage) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch)]
    fn key(this: &WebStorage, index: u32) -> Result<Option<String>, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn length(this: &WebStorage) -> u32;

    #[wasm_bindgen(js_namespace = Date, js_name = now)]
    pub fn date_now() -> f64;
}

fn js_detail(context: &str, err: JsValue) -> String {
    let detail = err.as_string().unwrap_or_else(|| format!("{err:?}"));
    format!("{context}: {detail}")
}

fn js_error(context: &str, err: JsValue) -> StoreError {
    StoreError::WebStorage(js_detail(context, err))
}

/// `localStorage` or `sessionStorage`.
pub struct WebMedium {
    storage: WebStorage,
}

impl WebMedium {
    /// Binds the storage area. Fails outside a browser or when access is
    /// denied (e.g. storage disabled by privacy settings).
    pub fn open(area: StorageArea) -> Result<Self, StoreError> {
        let storage = match area {
            StorageArea::Local => local_storage_area(),
            StorageArea::Session => session_storage_area(),
        }
        .map_err(|e| StoreError::MediumUnavailable(js_detail("storage access denied", e)))?
        .ok_or_else(|| StoreError::MediumUnavailable(format!("no {area} storage in this host")))?;
        Ok(Self { storage })
    }
}

impl StorageMedium for WebMedium {
    fn get_item(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.storage
            .get_item(key)
            .map_err(|e| js_error("getItem", e))
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.storage
            .set_item(key, value)
            .map_err(|e| js_error("setItem", e))
    }

    fn remove_item(&self, key: &str) -> Result<(), StoreError> {
        self.storage
            .remove_item(key)
            .map_err(|e| js_error("removeItem", e))
    }

    fn clear(&self) -> Result<(), StoreError> {
        self.storage.clear().map_err(|e| js_error("clear", e))
    }

    fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::with_capacity(self.storage.length() as usize);
        for index in 0..self.storage.length() {
            if let Some(key) = self.storage.key(index).map_err(|e| js_error("key", e))? {
                keys.push(key);
            }
        }
        Ok(keys)
    }
}

/// JS wrapper around [`Store`]. Values cross the boundary as JSON strings.
#[wasm_bindgen(js_name = NsStore)]
pub struct NsStoreWasm {
    inner: Store,
}

#[wasm_bindgen(js_class = NsStore)]
impl NsStoreWasm {
    #[wasm_bindgen(constructor)]
    pub fn new(namespace: &str, options_json: Option<String>) -> Result<NsStoreWasm, JsValue> {
        let options = match options_json {
            Some(json) => StoreOptions::from_json(&json)
                .map_err(|e| JsValue::from_str(&e.to_string()))?,
            None => StoreOptions::default(),
        };
        Ok(NsStoreWasm {
            inner: crate::create_store(namespace, options),
        })
    }

    #[wasm_bindgen(js_name = "set")]
    pub fn set(&self, key: &str, value_json: &str, ttl_secs: Option<f64>) -> Result<(), JsValue> {
        let value: serde_json::Value =
            serde_json::from_str(value_json).map_err(|e| JsValue::from_str(&e.to_string()))?;
        match ttl_secs {
            Some(ttl) => self.inner.set_with_ttl(key, value, ttl),
            None => self.inner.set(key, value),
        }
        .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = "get")]
    pub fn get(&self, key: &str) -> Option<String> {
        self.inner
            .get::<serde_json::Value>(key)
            .map(|value| value.to_string())
    }

    #[wasm_bindgen(js_name = "remove")]
    pub fn remove(&self, key: &str) -> Result<(), JsValue> {
        self.inner
            .remove(key)
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = "clear")]
    pub fn clear(&self) -> Result<(), JsValue> {
        self.inner
            .clear()
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = "has")]
    pub fn has(&self, key: &str) -> bool {
        self.inner.has(key)
    }

    #[wasm_bindgen(js_name = "keys")]
    pub fn keys(&self) -> Vec<String> {
        self.inner.keys()
    }

    /// Returns a JSON object of every live entry.
    #[wasm_bindgen(js_name = "getAll")]
    pub fn get_all(&self) -> String {
        let all = self.inner.get_all::<serde_json::Value>();
        serde_json::Value::Object(all.into_iter().collect()).to_string()
    }

    #[wasm_bindgen(js_name = "init")]
    pub fn init(&self) -> u32 {
        self.inner.init() as u32
    }
}
