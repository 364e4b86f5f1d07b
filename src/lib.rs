//! Résumé-to-PDF rendering engine.
//!
//! A loosely-typed record goes in, a one-page US Letter PDF comes out:
//! [`record`] accepts the payload, [`sanitize`] cleans it, [`theme`] resolves
//! colors, [`layout`] composes a display list and [`pdf`] paints it.
//! [`render`] ties the stages together and [`routes`] serves them over HTTP.
//! [`assist`] holds the keyword helpers the editor calls while a record is
//! being written.

pub mod assist;
pub mod config;
pub mod error;
pub mod font_metrics;
pub mod layout;
pub mod pdf;
pub mod photo;
pub mod record;
pub mod render;
pub mod routes;
pub mod sanitize;
pub mod theme;

pub use error::{ErrorKind, RenderError, Result};
pub use record::RawRecord;
pub use render::{ArtifactStore, DocumentRenderer, InlineDocument};
pub use sanitize::{normalize, NormalizedRecord};
pub use theme::{ResolvedStyle, ThemeRequest, ThemeResolver};
