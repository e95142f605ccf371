//! Contrato con el visor anfitrión.
//!
//! El anfitrión guarda por cada documento su ruta, contraseña, número de
//! páginas y un hueco opaco para el backend. Una referencia nula del
//! anfitrión se modela como `None`.

use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::BackendConfig;
use crate::error::{BackendError, ErrorCode};
use crate::pdf::PdfLibrary;
use crate::session::Session;

/// Documento tal como lo ve el anfitrión. `S` es lo que el backend guarda
/// en su hueco (`backend_data`). La contraseña es del anfitrión, que la
/// mantiene viva durante `'p`.
#[derive(Debug)]
pub struct HostDocument<'p, S> {
    path: Option<PathBuf>,
    password: Option<&'p str>,
    page_count: usize,
    backend_data: Option<S>,
}

impl<'p, S> HostDocument<'p, S> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            password: None,
            page_count: 0,
            backend_data: None,
        }
    }

    /// Documento sin ruta asignada.
    pub fn empty() -> Self {
        Self {
            path: None,
            password: None,
            page_count: 0,
            backend_data: None,
        }
    }

    pub fn with_password(mut self, password: &'p str) -> Self {
        self.password = Some(password);
        self
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    pub fn password(&self) -> Option<&'p str> {
        self.password
    }

    pub fn set_password(&mut self, password: Option<&'p str>) {
        self.password = password;
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn set_page_count(&mut self, page_count: usize) {
        self.page_count = page_count;
    }

    pub fn backend_data(&self) -> Option<&S> {
        self.backend_data.as_ref()
    }

    pub fn set_backend_data(&mut self, data: Option<S>) {
        self.backend_data = data;
    }

    pub fn take_backend_data(&mut self) -> Option<S> {
        self.backend_data.take()
    }
}

/// Documento del anfitrión cuyo hueco guarda una sesión de este backend.
pub type BackendDocument<'p, L> = HostDocument<'p, Session<'p, L>>;

/// El plugin: la librería PDF y la configuración con la que se abren las
/// sesiones.
pub struct PdfBackend<L> {
    library: L,
    config: BackendConfig,
}

impl<L> PdfBackend<L> {
    pub fn new(library: L, config: BackendConfig) -> Self {
        Self { library, config }
    }

    pub fn library(&self) -> &L {
        &self.library
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn document_open<'p>(&self, document: Option<&mut BackendDocument<'p, L>>) -> ErrorCode
    where
        L: PdfLibrary<'p>,
    {
        let Some(document) = document else {
            return ErrorCode::InvalidArguments;
        };
        if document.backend_data().is_some() {
            warn!("open sobre un documento que ya está abierto");
            return ErrorCode::InvalidArguments;
        }

        let opened = Session::open(
            &self.library,
            &self.config,
            document.path(),
            document.password(),
        );
        match opened {
            Ok(session) => {
                document.set_page_count(session.page_count());
                document.set_backend_data(Some(session));
                ErrorCode::Ok
            }
            Err(err) => report(err),
        }
    }

    /// Cierra la sesión guardada en el documento. Sin sesión (nunca abierto
    /// o ya liberado) es un no-op.
    pub fn document_free<'p>(&self, document: Option<&mut BackendDocument<'p, L>>) -> ErrorCode
    where
        L: PdfLibrary<'p>,
    {
        let Some(document) = document else {
            return ErrorCode::InvalidArguments;
        };

        match document.take_backend_data() {
            Some(mut session) => {
                session.close(&self.library);
            }
            None => debug!("free sobre un documento sin sesión"),
        }
        ErrorCode::Ok
    }

    pub fn document_save_as<'p>(
        &self,
        document: Option<&BackendDocument<'p, L>>,
        path: Option<&Path>,
    ) -> ErrorCode
    where
        L: PdfLibrary<'p>,
    {
        let Some(session) = document.and_then(HostDocument::backend_data) else {
            return ErrorCode::InvalidArguments;
        };

        match session.save_as(&self.library, path) {
            Ok(()) => ErrorCode::Ok,
            Err(err) => report(err),
        }
    }
}

fn report(err: BackendError) -> ErrorCode {
    warn!("{}", err);
    ErrorCode::from(err)
}
