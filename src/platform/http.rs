//! `fetch`-based backend client

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::web::js_reason;
use crate::api::{
    CHAT_PATH, ChatBackend, ChatRequest, ChatResponse, LOAD_CONTEXT_PATH, LoadContextRequest,
    LoadContextResponse, RESET_PATH, SAVE_PATH, SaveResponse, decode,
};
use crate::error::TransportError;
use crate::persistence::PersistedRecord;
use crate::settings::ClientConfig;

fn network(err: JsValue) -> TransportError {
    TransportError::Network(js_reason(&err))
}

fn encode<T: serde::Serialize>(body: &T) -> Result<String, TransportError> {
    serde_json::to_string(body).map_err(|e| TransportError::Encode(e.to_string()))
}

/// Talks to the chat service with JSON POSTs
pub struct FetchBackend {
    config: ClientConfig,
}

impl FetchBackend {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// POST and return the body text of a 2xx response
    async fn post(&self, path: &str, body: Option<String>) -> Result<String, TransportError> {
        let url = self.config.endpoint(path);

        let init = RequestInit::new();
        init.set_method("POST");
        if let Some(body) = &body {
            init.set_body(&JsValue::from_str(body));
        }
        let request = Request::new_with_str_and_init(&url, &init).map_err(network)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(network)?;

        let window = web_sys::window()
            .ok_or_else(|| TransportError::Network("no window".to_string()))?;
        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(network)?
            .dyn_into()
            .map_err(|_| TransportError::Decode("fetch did not return a Response".to_string()))?;

        if !response.ok() {
            log::warn!("POST {} -> {}", path, response.status());
            return Err(TransportError::Status(response.status()));
        }

        let text = JsFuture::from(response.text().map_err(network)?)
            .await
            .map_err(network)?;
        text.as_string()
            .ok_or_else(|| TransportError::Decode("response body is not text".to_string()))
    }
}

impl ChatBackend for FetchBackend {
    async fn chat(&self, message: &str) -> Result<ChatResponse, TransportError> {
        let body = encode(&ChatRequest { message })?;
        decode(&self.post(CHAT_PATH, Some(body)).await?)
    }

    async fn load_context(
        &self,
        record: &PersistedRecord,
    ) -> Result<LoadContextResponse, TransportError> {
        let body = encode(&LoadContextRequest {
            saved_data: record,
        })?;
        decode(&self.post(LOAD_CONTEXT_PATH, Some(body)).await?)
    }

    async fn request_save(&self) -> Result<SaveResponse, TransportError> {
        decode(&self.post(SAVE_PATH, None).await?)
    }

    async fn reset(&self) -> Result<(), TransportError> {
        self.post(RESET_PATH, None).await.map(|_| ())
    }
}
