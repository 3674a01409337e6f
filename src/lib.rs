//! AnnoCore: Span Resolver + Highlight Renderer
//!
//! Rust/WASM core of the cue/scope annotation editor.
//!
//! # Architecture
//!
//! ## Span engine
//! - `span/` - `TextRange`, character offset index, overlapping substring search
//! - `resolver.rs` - SpanResolver: scope text descriptions → character ranges
//! - `render/` - HighlightRenderer: one linear markup pass over cue/scope marks,
//!   plus side-panel list data
//! - `validate.rs` - overlap test and edit validation
//!
//! ## Editing
//! - `model.rs` - Document / Cue / Scope records (serde, round-trip safe)
//! - `session.rs` - EditSession: navigation, edit map, save workflow
//! - `store.rs` - JSONL decoding, corpus stats, save responses
//! - `notify.rs` - user feedback sink
//! - `wasm.rs` - `AnnotationEditor` and standalone JS exports
//!
//! # Usage (Rust)
//! ```
//! use annocore::{EditSession, Document, Scope};
//!
//! let mut session = EditSession::default();
//! session.load(vec![
//!     Document::new(1, "The cat sat. The dog ran.").with_scopes(vec![Scope::described("cat, dog")]),
//! ]);
//! let view = session.render_current().unwrap();
//! assert_eq!(view.marks.len(), 2);
//! ```

pub mod log;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod render;
pub mod resolver;
pub mod session;
pub mod span;
pub mod store;
pub mod validate;
pub mod wasm;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::{AnnotationError, AnnotationKind};
pub use model::*;
pub use notify::*;
pub use render::*;
pub use resolver::*;
pub use session::*;
pub use span::*;
pub use store::*;
pub use validate::*;

use wasm_bindgen::prelude::*;

// When the `wee_alloc` feature is enabled, use `wee_alloc` as the global
// allocator for smaller WASM bundle size.
#[cfg(feature = "wee_alloc")]
#[global_allocator]
static ALLOC: wee_alloc::WeeAlloc = wee_alloc::WeeAlloc::INIT;

/// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Get version information
#[wasm_bindgen]
pub fn version() -> String {
    format!("annocore v{}", env!("CARGO_PKG_VERSION"))
}
