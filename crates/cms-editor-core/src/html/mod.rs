//! HTML import/export bridge.
//!
//! HTML fragments are the only serialization format of the editor: the
//! initial value is imported once at construction and every change is
//! exported for the embedding form. No `<html>`/`<body>` wrapper is produced
//! or required.

mod dom;
mod export;
mod import;
mod tokenizer;


pub use export::export_html;
pub use import::import_html;

pub(crate) use export::{ImageMarkup, write_document, write_img_tag};
