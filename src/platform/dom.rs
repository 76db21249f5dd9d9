//! DOM-backed views

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement};

use super::web::js_reason;
use crate::ui::{ChatView, RestoreChoice, RestorePrompt, Role, SaveStatus, SaveStatusView};

fn document() -> Option<Document> {
    web_sys::window()?.document()
}

/// `#chat-history` transcript and the optional `#current-phase` label
pub struct DomChatView {
    document: Document,
    history: Element,
    phase: Option<Element>,
}

impl DomChatView {
    pub fn new() -> Option<Self> {
        let document = document()?;
        let history = document.get_element_by_id("chat-history")?;
        let phase = document.get_element_by_id("current-phase");
        Some(Self {
            document,
            history,
            phase,
        })
    }

    fn append(&self, role: Role, text: &str) -> Result<(), JsValue> {
        let row = self.document.create_element("div")?;
        row.set_class_name(&format!("message {}", role.css_class()));
        let bubble = self.document.create_element("div")?;
        bubble.set_class_name("message-bubble");
        bubble.set_text_content(Some(text));
        row.append_child(&bubble)?;
        self.history.append_child(&row)?;
        self.history.set_scroll_top(self.history.scroll_height());
        Ok(())
    }
}

impl ChatView for DomChatView {
    fn show_message(&self, role: Role, text: &str) {
        if let Err(e) = self.append(role, text) {
            log::error!("Could not render message: {}", js_reason(&e));
        }
    }

    fn clear(&self) {
        self.history.set_inner_html("");
    }

    fn show_phase(&self, label: &str) {
        if let Some(el) = &self.phase {
            el.set_text_content(Some(label));
        }
    }
}

/// `#save-conversation-button` + `#save-status`
pub struct DomSaveStatus {
    button: Option<HtmlButtonElement>,
    status: Option<Element>,
}

impl DomSaveStatus {
    pub fn new() -> Self {
        let document = document();
        let button = document
            .as_ref()
            .and_then(|d| d.get_element_by_id("save-conversation-button"))
            .and_then(|el| el.dyn_into::<HtmlButtonElement>().ok());
        let status = document.and_then(|d| d.get_element_by_id("save-status"));
        if button.is_none() || status.is_none() {
            log::warn!("Save button or status element not found in DOM");
        }
        Self { button, status }
    }
}

impl Default for DomSaveStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl SaveStatusView for DomSaveStatus {
    fn show_status(&self, status: &SaveStatus) {
        if let Some(button) = &self.button {
            button.set_disabled(status.is_busy());
            let label = if status.is_busy() {
                "Saving..."
            } else {
                "Save Conversation"
            };
            button.set_text_content(Some(label));
        }
        if let Some(el) = &self.status {
            el.set_text_content(Some(status.message()));
            el.set_class_name(status.css_class());
        }
    }
}

const RESTORE_DIALOG_HTML: &str = r#"
    <h3>Welcome Back!</h3>
    <p>We found a saved conversation about your family dynamics. Would you like to continue where you left off?</p>
    <div class="restore-buttons">
        <button id="restore-yes" class="primary-button">Yes, continue</button>
        <button id="restore-no" class="secondary-button">No, start new</button>
    </div>
"#;

/// Modal overlay asking whether to restore
pub struct DomRestorePrompt;

impl DomRestorePrompt {
    fn show(document: &Document) -> Result<Element, JsValue> {
        let overlay = document.create_element("div")?;
        overlay.set_class_name("restore-notification");
        let content = document.create_element("div")?;
        content.set_class_name("restore-content");
        content.set_inner_html(RESTORE_DIALOG_HTML);
        overlay.append_child(&content)?;
        document
            .body()
            .ok_or_else(|| JsValue::from_str("no body"))?
            .append_child(&overlay)?;
        Ok(overlay)
    }
}

impl RestorePrompt for DomRestorePrompt {
    async fn ask(&self) -> RestoreChoice {
        let Some(document) = document() else {
            return RestoreChoice::StartNew;
        };
        let overlay = match Self::show(&document) {
            Ok(overlay) => overlay,
            Err(e) => {
                log::error!("Could not show restore dialog: {}", js_reason(&e));
                return RestoreChoice::StartNew;
            }
        };

        let (tx, rx) = oneshot::channel();
        let tx = Rc::new(RefCell::new(Some(tx)));

        // Handlers stay alive until this future resolves, then drop with it
        let mut handlers = Vec::new();
        for (id, choice) in [
            ("restore-yes", RestoreChoice::Continue),
            ("restore-no", RestoreChoice::StartNew),
        ] {
            let tx = tx.clone();
            let handler = Closure::<dyn FnMut(_)>::new(move |_event: web_sys::MouseEvent| {
                if let Some(tx) = tx.borrow_mut().take() {
                    let _ = tx.send(choice);
                }
            });
            if let Some(btn) = document.get_element_by_id(id) {
                let _ = btn.add_event_listener_with_callback("click", handler.as_ref().unchecked_ref());
            }
            handlers.push(handler);
        }

        // No timeout: waits as long as the user does
        let choice = rx.await.unwrap_or(RestoreChoice::StartNew);
        overlay.remove();
        drop(handlers);
        choice
    }
}
