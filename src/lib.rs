//! Backend PDF para visores de documentos.
//!
//! Adapta una librería PDF (PDFium en producción) al contrato de plugin del
//! visor: abrir, guardar como y cerrar documentos, más una caché de firmas
//! digitales por página que se libera entera al cerrar.

pub mod cache;
pub mod config;
pub mod error;
pub mod locator;
pub mod pdf;
pub mod plugin;
pub mod session;

pub use cache::{SignatureCache, TeardownReport};
pub use config::BackendConfig;
pub use error::{BackendError, ErrorCode};
pub use locator::{Locator, LocatorError};
pub use pdf::{LibraryError, PdfLibrary, PdfSystem, SignatureInfo};
pub use plugin::{BackendDocument, HostDocument, PdfBackend};
pub use session::Session;
