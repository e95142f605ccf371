pub mod pdfium;
pub mod signatures;

pub use pdfium::PdfSystem;
pub use signatures::SignatureInfo;

use thiserror::Error;

use crate::locator::Locator;

/// Fallo reportado por la librería PDF. Solo distinguimos la causa que el
/// anfitrión necesita ver (documento cifrado); el resto va como texto.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LibraryError {
    #[error("documento cifrado: contraseña ausente o incorrecta")]
    Encrypted,
    #[error("{0}")]
    Other(String),
}

/// Lo que el backend necesita de la librería que realmente parsea PDFs.
///
/// Los documentos y los registros auxiliares (firmas) son recursos de la
/// librería: el backend los posee mientras el documento está abierto y los
/// devuelve exactamente una vez con `release_document` / `free_record`.
///
/// `'p` es lo que vive la contraseña. Hay librerías (PDFium) cuyos documentos
/// la toman prestada durante toda su vida, así que el anfitrión debe
/// mantenerla viva mientras el documento siga abierto.
pub trait PdfLibrary<'p> {
    /// Documento parseado.
    type Document;
    /// Metadatos de una firma encontrada en una página.
    type Record;

    fn open(&self, locator: &Locator, password: Option<&'p str>)
        -> Result<Self::Document, LibraryError>;

    fn page_count(&self, document: &Self::Document) -> usize;

    fn save(&self, document: &Self::Document, locator: &Locator) -> Result<(), LibraryError>;

    /// Recorre el documento y entrega cada firma con su página (base 0).
    /// Lo entregado antes de un error ya es del llamador.
    fn discover_signatures(
        &self,
        document: &Self::Document,
        sink: &mut dyn FnMut(usize, Self::Record),
    ) -> Result<(), LibraryError>;

    fn release_document(&self, document: Self::Document) {
        drop(document);
    }

    fn free_record(&self, record: Self::Record) {
        drop(record);
    }
}
