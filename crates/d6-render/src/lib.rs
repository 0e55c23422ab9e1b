//! D6 Renderer
//!
//! Turns a resolved response into page content:
//! - literal HTML responses are written as-is
//! - otherwise the named view renders the payload into HTML
//! - an unknown view falls back to a full browser navigation
//!
//! Writing extracts the `<title>`, strips inline scripts, injects the HTML
//! into the body or a target region, then runs the scripts in order.

mod markup;
mod page;
mod renderer;
mod views;

pub use markup::{extract_body, extract_scripts, extract_title};
pub use page::{MemoryDocument, MemoryPage, Page, Region, ScriptExecutor};
pub use renderer::{RenderOutcome, Renderer};
pub use views::{View, ViewRegistry};
