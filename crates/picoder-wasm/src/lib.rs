//! PICoder WASM - WebAssembly bindings for PICoder
//!
//! This crate exposes the picoder-core session to JavaScript/TypeScript.
//!
//! # Module Structure
//!
//! - `session` - `JsSession`, the editing session (load, edit, undo/redo, export, AI edit)
//! - `types` - WASM-compatible wrapper types for output artifacts
//! - `logger` - `log` backend writing to the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsSession, format_size } from '@picoder/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const session = new JsSession();
//! const artifact = session.load(new Uint8Array(await file.arrayBuffer()), file.name);
//! console.log(`${artifact.width}x${artifact.height}, ${format_size(artifact.size)}`);
//! ```

use wasm_bindgen::prelude::*;

mod logger;
mod session;
mod types;

pub use session::JsSession;
pub use types::JsArtifact;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logger::install(log::LevelFilter::Info);
}

/// Change the console log level (`"off"`, `"error"`, `"warn"`, `"info"`,
/// `"debug"` or `"trace"`).
#[wasm_bindgen]
pub fn set_log_level(level: &str) {
    logger::install(logger::parse_level(level));
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Human-readable byte size, e.g. `format_size(1536) === "1.5 KB"`.
#[wasm_bindgen]
pub fn format_size(bytes: f64) -> String {
    let bytes = if bytes.is_finite() && bytes > 0.0 {
        bytes as u64
    } else {
        0
    };
    picoder_core::format_size(bytes)
}
