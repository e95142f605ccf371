use std::path::Path;

use log::{debug, info, warn};

use crate::cache::{SignatureCache, TeardownReport};
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::locator::Locator;
use crate::pdf::{LibraryError, PdfLibrary};

/// Un documento abierto: el handle de la librería PDF, su número de páginas
/// y, si el overlay de firmas estaba activo al abrir, la caché por página.
///
/// `Closed -> open -> Opened -> close -> Closed`. Cerrar dos veces es un
/// no-op; guardar una sesión cerrada es `InvalidArguments`.
///
/// `'p` es la vida de la contraseña con la que se abrió (ver `PdfLibrary`).
pub struct Session<'p, L: PdfLibrary<'p>> {
    handle: Option<L::Document>,
    page_count: usize,
    signatures: Option<SignatureCache<L::Record>>,
}

impl<'p, L: PdfLibrary<'p>> Session<'p, L> {
    pub fn open(
        library: &L,
        config: &BackendConfig,
        path: Option<&Path>,
        password: Option<&'p str>,
    ) -> Result<Self, BackendError> {
        let path = path.ok_or(BackendError::InvalidArguments("el documento no tiene ruta"))?;
        debug!("Abriendo {}", path.display());

        // Si la ruta no se puede normalizar no llegamos a tocar la librería.
        let locator = Locator::from_path(path)?;

        let handle = library
            .open(&locator, password)
            .map_err(|err| match err {
                LibraryError::Encrypted => BackendError::InvalidPassword,
                other => BackendError::Open(other),
            })?;

        let page_count = library.page_count(&handle);
        let signatures = config
            .signature_overlay
            .then(|| discover_signatures(library, &handle, page_count));

        info!("Documento abierto: {} ({} páginas)", locator, page_count);
        Ok(Self {
            handle: Some(handle),
            page_count,
            signatures,
        })
    }

    /// Libera la caché de firmas y después el handle. Devuelve el resumen de
    /// la caché si había una; en una sesión ya cerrada no hace nada.
    pub fn close(&mut self, library: &L) -> Option<TeardownReport> {
        let report = self
            .signatures
            .take()
            .map(|cache| cache.teardown(|record| library.free_record(record)));

        match self.handle.take() {
            Some(handle) => {
                library.release_document(handle);
                info!("Documento cerrado");
            }
            None => debug!("close sobre una sesión ya cerrada"),
        }

        report
    }

    pub fn save_as(&self, library: &L, destination: Option<&Path>) -> Result<(), BackendError> {
        let handle = self
            .handle
            .as_ref()
            .ok_or(BackendError::InvalidArguments("la sesión está cerrada"))?;
        let destination =
            destination.ok_or(BackendError::InvalidArguments("falta la ruta de destino"))?;

        let locator = Locator::from_path(destination)?;
        library.save(handle, &locator).map_err(BackendError::Save)?;

        info!("Documento guardado en {}", locator);
        Ok(())
    }

    pub fn is_open(&self) -> bool {
        self.handle.is_some()
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Handle de la librería para el resto del backend (render, texto...).
    pub fn document(&self) -> Option<&L::Document> {
        self.handle.as_ref()
    }

    pub fn signatures(&self) -> Option<&SignatureCache<L::Record>> {
        self.signatures.as_ref()
    }

    /// Firmas de una página, para dibujar el overlay. `None` si el overlay
    /// está desactivado o la página no existe.
    pub fn page_signatures(&self, page: usize) -> Option<&[L::Record]> {
        self.signatures.as_ref()?.page(page)
    }
}

impl<'p, L: PdfLibrary<'p>> Drop for Session<'p, L> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!("Sesión destruida sin close: se libera sin pasar por la librería");
        }
    }
}

/// Reserva la caché y lanza el descubrimiento. Es best-effort: un fallo de
/// la librería deja la caché parcialmente poblada y el documento usable.
fn discover_signatures<'p, L: PdfLibrary<'p>>(
    library: &L,
    handle: &L::Document,
    page_count: usize,
) -> SignatureCache<L::Record> {
    let mut cache = SignatureCache::allocate(page_count);

    let result = library.discover_signatures(handle, &mut |page: usize, record: L::Record| {
        if let Err(record) = cache.push(page, record) {
            warn!(
                "Firma en página {} fuera de rango ({} páginas), descartada",
                page, page_count
            );
            library.free_record(record);
        }
    });

    if let Err(err) = result {
        warn!("Descubrimiento de firmas incompleto: {}", err);
    }

    debug!(
        "Caché de firmas poblada: {} firmas en {} páginas",
        cache.record_count(),
        cache.len()
    );
    cache
}
