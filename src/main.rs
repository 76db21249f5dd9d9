//! Family Chat Client entry point
//!
//! Wires the browser adapters to the restore, save and chat flows.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_app {
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::spawn_local;
    use web_sys::{HtmlTextAreaElement, KeyboardEvent, MouseEvent};

    use family_chat_client::chat::ChatSession;
    use family_chat_client::platform::dom::{DomChatView, DomRestorePrompt, DomSaveStatus};
    use family_chat_client::platform::http::FetchBackend;
    use family_chat_client::platform::web::{TimeoutScheduler, browser_persistence, download};
    use family_chat_client::{ClientConfig, PersistenceManager, RestoreCoordinator, SaveOrchestrator};

    type Session = ChatSession<FetchBackend, DomChatView>;

    /// Attach a click handler to the element with `id`, if present
    fn on_click(id: &str, handler: impl FnMut(MouseEvent) + 'static) {
        let Some(el) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
        else {
            log::warn!("#{} not found", id);
            return;
        };
        let closure = Closure::<dyn FnMut(_)>::new(handler);
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    pub async fn run() {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            web_sys::console::warn_1(&"Logger already initialized".into());
        }

        log::info!("Family chat client starting...");

        let config = ClientConfig::load();
        let persistence = Rc::new(browser_persistence(&config));
        log::info!("Client id: {}", persistence.client_id());

        let backend = Rc::new(FetchBackend::new(&config));
        let Some(chat_view) = DomChatView::new() else {
            log::error!("#chat-history not found; client not started");
            return;
        };
        let chat_view = Rc::new(chat_view);

        // Restore gates the first assistant message; it may sit on the prompt
        // indefinitely, so it runs alongside the rest of the wiring
        {
            let persistence = persistence.clone();
            let backend = backend.clone();
            let chat_view = chat_view.clone();
            let greeting = config.greeting.clone();
            spawn_local(async move {
                let prompt = DomRestorePrompt;
                let mut coordinator = RestoreCoordinator::new(
                    &persistence,
                    backend.as_ref(),
                    chat_view.as_ref(),
                    &prompt,
                    &greeting,
                );
                let state = coordinator.run().await;
                log::info!("Restore finished: {:?}", state);
            });
        }

        let session = Rc::new(ChatSession::new(
            backend.clone(),
            chat_view.clone(),
            persistence.clone(),
            config.greeting.clone(),
        ));
        setup_chat_input(session.clone());
        setup_save_button(&config, persistence.clone(), backend);
        setup_new_conversation(session);
        setup_export(persistence);

        log::info!("Family chat client running!");
    }

    fn setup_chat_input(session: Rc<Session>) {
        let document = web_sys::window().and_then(|w| w.document());
        let input = document
            .as_ref()
            .and_then(|d| d.get_element_by_id("user-message"))
            .and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok());
        let Some(input) = input else {
            log::warn!("#user-message not found");
            return;
        };

        {
            let input = input.clone();
            on_click("send-button", move |_event| {
                let text = input.value();
                input.set_value("");
                let session = session.clone();
                spawn_local(async move {
                    session.send(&text).await;
                });
            });
        }

        // Ctrl+Enter / Cmd+Enter sends
        let closure = Closure::<dyn FnMut(_)>::new(move |event: KeyboardEvent| {
            if (event.ctrl_key() || event.meta_key()) && event.key() == "Enter" {
                event.prevent_default();
                if let Some(btn) = web_sys::window()
                    .and_then(|w| w.document())
                    .and_then(|d| d.get_element_by_id("send-button"))
                    .and_then(|el| el.dyn_into::<web_sys::HtmlElement>().ok())
                {
                    btn.click();
                }
            }
        });
        let _ = input.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_save_button(
        config: &ClientConfig,
        persistence: Rc<PersistenceManager>,
        backend: Rc<FetchBackend>,
    ) {
        let orchestrator = Rc::new(SaveOrchestrator::new(
            config.storage_mode,
            persistence,
            backend,
            Rc::new(DomSaveStatus::new()),
            Rc::new(TimeoutScheduler),
            config.status_revert_ms,
        ));

        on_click("save-conversation-button", move |_event| {
            let orchestrator = orchestrator.clone();
            spawn_local(async move {
                // Outcome is already on the status indicator
                let _ = orchestrator.save().await;
            });
        });
    }

    fn setup_new_conversation(session: Rc<Session>) {
        on_click("new-conversation", move |_event| {
            let confirmed = web_sys::window()
                .and_then(|w| {
                    w.confirm_with_message(
                        "Start a new conversation? This will reset the current chat and delete all saved family data.",
                    )
                    .ok()
                })
                .unwrap_or(false);
            if !confirmed {
                return;
            }
            let session = session.clone();
            spawn_local(async move {
                if let Err(e) = session.start_new_conversation().await {
                    log::error!("Error resetting conversation: {}", e);
                }
            });
        });
    }

    fn setup_export(persistence: Rc<PersistenceManager>) {
        on_click("export-data", move |_event| {
            let result = persistence
                .export_as_file()
                .map_err(|e| e.to_string())
                .and_then(|artifact| {
                    download(&artifact).map_err(|e| format!("{:?}", e))
                });
            if let Err(message) = result {
                log::warn!("Export failed: {}", message);
                if let Some(window) = web_sys::window() {
                    let _ = window.alert_with_message(&message);
                }
            }
        });
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn wasm_main() {
    wasm_app::run().await;
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use family_chat_client::platform::{MemoryCookieJar, MemoryTier, TierKind};
    use family_chat_client::{ClientConfig, PersistenceManager, StorageKeys, TieredStorage};

    env_logger::init();
    log::info!("Family chat client (native) starting...");
    log::info!("The client runs in the browser - build with `trunk serve` for the web version");

    // Exercise the persistence chain against in-memory tiers
    let config = ClientConfig::load();
    let storage = TieredStorage::new(
        Some(Box::new(MemoryTier::new(TierKind::Durable))),
        Some(Box::new(MemoryTier::new(TierKind::Session))),
        Box::new(MemoryCookieJar::new()),
    );
    let persistence = PersistenceManager::new(
        storage,
        StorageKeys::with_prefix(&config.key_prefix),
        config.cookie_days,
    );

    println!("\nRunning persistence smoke check...");
    let mut data = serde_json::Map::new();
    data.insert("members".to_string(), serde_json::json!(3));
    match persistence.save(data, "initial_data_collection") {
        Ok(record) => println!("✓ Saved record for client {}", record.client_id),
        Err(e) => {
            eprintln!("✗ Save failed: {}", e);
            return;
        }
    }
    match persistence.load() {
        Some(loaded) => println!("✓ Loaded record from {} storage", loaded.source),
        None => eprintln!("✗ Record not found after save"),
    }
    persistence.clear();
    println!(
        "✓ Cleared (record present: {}, client id kept: {})",
        persistence.has_record(),
        persistence.client_id()
    );
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
