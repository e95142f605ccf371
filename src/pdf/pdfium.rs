use std::path::Path;
use std::sync::Arc;

use log::{debug, trace, warn};
use pdfium_render::prelude::*;

use super::signatures::{self, SignatureInfo};
use super::{LibraryError, PdfLibrary};
use crate::locator::Locator;

/// Estructura que mantiene viva la instancia de PDFium.
/// Los documentos abiertos toman prestado el sistema (`PdfDocument<'a>`),
/// así que debe vivir tanto como el backend que lo usa.
#[derive(Clone)]
pub struct PdfSystem {
    library: Arc<Pdfium>,
}

impl PdfSystem {
    /// Enlaza dinámicamente con la librería que descargó build.rs.
    /// Intentamos cargar localmente primero, luego en sistema.
    pub fn new() -> Result<Self, PdfiumError> {
        Self::with_library_dir(Path::new("./"))
    }

    pub fn with_library_dir(dir: &Path) -> Result<Self, PdfiumError> {
        let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path(dir))
            .or_else(|_| Pdfium::bind_to_system_library())?;

        Ok(Self {
            library: Arc::new(Pdfium::new(bindings)),
        })
    }
}

/// El documento de PDFium toma prestados el sistema y la contraseña durante
/// `'a`, de ahí que la contraseña comparta vida con el préstamo del sistema.
impl<'a> PdfLibrary<'a> for &'a PdfSystem {
    type Document = PdfDocument<'a>;
    type Record = SignatureInfo;

    fn open(&self, locator: &Locator, password: Option<&'a str>) -> Result<PdfDocument<'a>, LibraryError> {
        let system: &'a PdfSystem = *self;
        let path = locator
            .to_file_path()
            .map_err(|err| LibraryError::Other(err.to_string()))?;

        debug!("PDFium: cargando {}", path.display());
        system
            .library
            .load_pdf_from_file(&path, password)
            .map_err(classify)
    }

    fn page_count(&self, document: &PdfDocument<'a>) -> usize {
        usize::from(document.pages().len())
    }

    fn save(&self, document: &PdfDocument<'a>, locator: &Locator) -> Result<(), LibraryError> {
        let path = locator
            .to_file_path()
            .map_err(|err| LibraryError::Other(err.to_string()))?;
        document.save_to_file(&path).map_err(classify)
    }

    fn discover_signatures(
        &self,
        document: &PdfDocument<'a>,
        sink: &mut dyn FnMut(usize, SignatureInfo),
    ) -> Result<(), LibraryError> {
        // PDFium lista las firmas sin decir a qué campo pertenecen, así que
        // los campos se leen del árbol de objetos de una copia en memoria.
        let bytes = document.save_to_bytes().map_err(classify)?;
        let parsed = lopdf::Document::load_mem(&bytes)
            .map_err(|err| LibraryError::Other(format!("lopdf: {err}")))?;

        let found = signatures::scan(&parsed);
        let signed = found.iter().filter(|info| info.is_signed()).count();
        let reported = document.signatures().iter().count();
        if reported > signed {
            warn!(
                "PDFium: {} firmas sin widget en ninguna página, no se mostrarán",
                reported - signed
            );
        }

        for info in found {
            trace!("PDFium: firma {:?} en página {}", info.field_name, info.page_index);
            sink(info.page_index, info);
        }

        Ok(())
    }
}

fn classify(err: PdfiumError) -> LibraryError {
    match err {
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError) => {
            LibraryError::Encrypted
        }
        other => LibraryError::Other(format!("{other:?}")),
    }
}
