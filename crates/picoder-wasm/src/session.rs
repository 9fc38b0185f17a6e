//! Session bindings.
//!
//! [`JsSession`] wraps the core [`Session`] for a single page. Settings
//! patches cross the boundary as plain JS objects (camelCase keys, the same
//! shape the UI keeps in its state), and the network-bound operations return
//! Promises.
//!
//! # Example
//!
//! ```typescript
//! const session = new JsSession();
//! session.setApiKeys([key]);
//! const artifact = session.load(bytes, file.name);
//! session.update({ maxWidth: 640 }, true);   // slider drag
//! session.commitGesture();                   // slider released
//! const edited = await session.aiEdit("make the sky purple");
//! ```

use std::cell::RefCell;
use std::fmt::Display;
use std::rc::Rc;

use picoder_core::export::{download_filename, share_text, ExportKind, SHARE_TITLE};
use picoder_core::{
    fetch_source, ChangeKind, Credential, GeminiClient, MaskShape, RemoteEditError,
    RoundRobinCredentials, Session, SessionConfig, SettingsPatch,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use crate::types::JsArtifact;

fn to_js(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

pub(crate) fn parse_mask(name: &str) -> Result<MaskShape, String> {
    match name.trim().to_ascii_lowercase().as_str() {
        "none" => Ok(MaskShape::None),
        "circle" => Ok(MaskShape::Circle),
        "rounded" => Ok(MaskShape::Rounded),
        other => Err(format!("Unknown mask shape: {}", other)),
    }
}

pub(crate) fn parse_export_kind(name: &str) -> Result<ExportKind, String> {
    ExportKind::parse(name).ok_or_else(|| format!("Unknown export kind: {}", name))
}

pub(crate) fn change_kind(live: bool) -> ChangeKind {
    if live {
        ChangeKind::Live
    } else {
        ChangeKind::Commit
    }
}

/// An editing session for JavaScript.
#[wasm_bindgen]
pub struct JsSession {
    inner: Rc<RefCell<Session>>,
    http: reqwest::Client,
    remote: Option<Rc<GeminiClient<RoundRobinCredentials>>>,
}

#[wasm_bindgen]
impl JsSession {
    /// Create a session. `config` is an optional `SessionConfig` object.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsSession, JsValue> {
        let config: SessionConfig = if config.is_undefined() || config.is_null() {
            SessionConfig::default()
        } else {
            serde_wasm_bindgen::from_value(config).map_err(to_js)?
        };

        Ok(JsSession {
            inner: Rc::new(RefCell::new(Session::new(config))),
            http: reqwest::Client::new(),
            remote: None,
        })
    }

    /// Configure the pool of API keys used for AI edits, rotated per request.
    #[wasm_bindgen(js_name = setApiKeys)]
    pub fn set_api_keys(&mut self, keys: Vec<String>) {
        let pool = RoundRobinCredentials::new(
            keys.into_iter()
                .filter(|k| !k.trim().is_empty())
                .map(Credential::new),
        );
        log::info!("wasm: {} API key(s) configured", pool.len());
        self.remote = Some(Rc::new(GeminiClient::with_config(
            self.http.clone(),
            Default::default(),
            pool,
        )));
    }

    /// Decode and render a new source image.
    pub fn load(&self, bytes: &[u8], name: &str) -> Result<JsArtifact, JsValue> {
        let mut session = self.inner.borrow_mut();
        session.load_source(bytes, name).map(JsArtifact::from).map_err(to_js)
    }

    pub fn clear(&self) {
        self.inner.borrow_mut().clear();
    }

    /// Merge a partial settings object and re-render.
    ///
    /// Pass `live = true` while a continuous gesture is in progress.
    pub fn update(&self, patch: JsValue, live: bool) -> Result<Option<JsArtifact>, JsValue> {
        let patch: SettingsPatch = serde_wasm_bindgen::from_value(patch).map_err(to_js)?;
        let mut session = self.inner.borrow_mut();
        session
            .update(&patch, change_kind(live))
            .map(|a| a.map(JsArtifact::from))
            .map_err(to_js)
    }

    #[wasm_bindgen(js_name = rotateLeft)]
    pub fn rotate_left(&self) -> Result<Option<JsArtifact>, JsValue> {
        let mut session = self.inner.borrow_mut();
        session.rotate_left().map(|a| a.map(JsArtifact::from)).map_err(to_js)
    }

    #[wasm_bindgen(js_name = rotateRight)]
    pub fn rotate_right(&self) -> Result<Option<JsArtifact>, JsValue> {
        let mut session = self.inner.borrow_mut();
        session.rotate_right().map(|a| a.map(JsArtifact::from)).map_err(to_js)
    }

    #[wasm_bindgen(js_name = flipHorizontal)]
    pub fn flip_horizontal(&self) -> Result<Option<JsArtifact>, JsValue> {
        let mut session = self.inner.borrow_mut();
        session.toggle_flip_h().map(|a| a.map(JsArtifact::from)).map_err(to_js)
    }

    #[wasm_bindgen(js_name = flipVertical)]
    pub fn flip_vertical(&self) -> Result<Option<JsArtifact>, JsValue> {
        let mut session = self.inner.borrow_mut();
        session.toggle_flip_v().map(|a| a.map(JsArtifact::from)).map_err(to_js)
    }

    /// Set the mask shape: `"none"`, `"circle"` or `"rounded"`.
    #[wasm_bindgen(js_name = setMask)]
    pub fn set_mask(&self, shape: &str) -> Result<Option<JsArtifact>, JsValue> {
        let shape = parse_mask(shape).map_err(to_js)?;
        let mut session = self.inner.borrow_mut();
        session.set_mask(shape).map(|a| a.map(JsArtifact::from)).map_err(to_js)
    }

    /// Record the current state at the end of a drag.
    #[wasm_bindgen(js_name = commitGesture)]
    pub fn commit_gesture(&self) -> bool {
        self.inner.borrow_mut().commit_gesture()
    }

    pub fn undo(&self) -> bool {
        self.inner.borrow_mut().undo()
    }

    pub fn redo(&self) -> bool {
        self.inner.borrow_mut().redo()
    }

    /// Call once the UI has applied the state restored by undo/redo.
    #[wasm_bindgen(js_name = restoreComplete)]
    pub fn restore_complete(&self) {
        self.inner.borrow_mut().restore_complete();
    }

    #[wasm_bindgen(getter, js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.inner.borrow().can_undo()
    }

    #[wasm_bindgen(getter, js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.inner.borrow().can_redo()
    }

    #[wasm_bindgen(getter, js_name = isProcessing)]
    pub fn is_processing(&self) -> bool {
        self.inner.borrow().is_remote_edit_pending()
    }

    #[wasm_bindgen(getter)]
    pub fn artifact(&self) -> Option<JsArtifact> {
        self.inner.borrow().artifact().map(JsArtifact::from)
    }

    /// Current settings as a plain object.
    pub fn settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(self.inner.borrow().settings()).map_err(to_js)
    }

    /// Snippet for `kind` (`"html"`, `"css"` or `"raw"`).
    pub fn export(&self, kind: &str) -> Result<Option<String>, JsValue> {
        let kind = parse_export_kind(kind).map_err(to_js)?;
        Ok(self.inner.borrow().export(kind))
    }

    /// Share payload for `kind`, truncated to the platform limit.
    #[wasm_bindgen(js_name = shareText)]
    pub fn share_text(&self, kind: &str) -> Result<Option<String>, JsValue> {
        let kind = parse_export_kind(kind).map_err(to_js)?;
        Ok(self.inner.borrow().artifact().map(|a| share_text(kind, a)))
    }

    /// Download metadata as `{ filename, mimeType }`.
    #[wasm_bindgen(js_name = downloadInfo)]
    pub fn download_info(&self, kind: &str, stem: &str) -> Result<JsValue, JsValue> {
        let kind = parse_export_kind(kind).map_err(to_js)?;
        let info = js_sys::Object::new();
        js_sys::Reflect::set(&info, &"filename".into(), &download_filename(kind, stem).into())?;
        js_sys::Reflect::set(&info, &"mimeType".into(), &kind.mime_type().into())?;
        js_sys::Reflect::set(&info, &"title".into(), &SHARE_TITLE.into())?;
        Ok(info.into())
    }

    /// Fetch an image by URL and load it. Resolves to a `JsArtifact`.
    #[wasm_bindgen(js_name = importUrl)]
    pub fn import_url(&self, url: String) -> js_sys::Promise {
        let session = Rc::clone(&self.inner);
        let http = self.http.clone();

        future_to_promise(async move {
            let file = fetch_source(&http, &url).await.map_err(to_js)?;
            let mut session = session.borrow_mut();
            let artifact = session.load_file(&file).map_err(to_js)?;
            Ok(JsArtifact::from(artifact).into())
        })
    }

    /// Run an AI edit of the current artifact. Resolves to the edited
    /// `JsArtifact`, or `undefined` if the source changed meanwhile.
    #[wasm_bindgen(js_name = aiEdit)]
    pub fn ai_edit(&self, prompt: String) -> js_sys::Promise {
        let session = Rc::clone(&self.inner);
        let remote = self.remote.clone();

        future_to_promise(async move {
            let ticket = session
                .borrow_mut()
                .begin_remote_edit()
                .ok_or_else(|| to_js("Nothing to edit, or an edit is already running"))?;

            // No borrow is held across the request
            let result = match remote {
                Some(client) => client.edit(ticket.image_data_uri(), &prompt).await,
                None => Err(RemoteEditError::NoCredentials),
            };

            let mut session = session.borrow_mut();
            let artifact = session.finish_remote_edit(ticket, result).map_err(to_js)?;
            Ok(artifact.map(JsArtifact::from).map(JsValue::from).unwrap_or(JsValue::UNDEFINED))
        })
    }
}
