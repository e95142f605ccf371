use thiserror::Error;

use crate::locator::LocatorError;
use crate::pdf::LibraryError;

/// Códigos que entiende el visor anfitrión. Es todo lo que cruza la frontera
/// del plugin: cualquier detalle adicional se queda en los logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    Ok,
    InvalidArguments,
    InvalidPassword,
    Unknown,
}

impl ErrorCode {
    pub fn is_ok(self) -> bool {
        self == ErrorCode::Ok
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("argumentos inválidos: {0}")]
    InvalidArguments(&'static str),

    #[error("el documento está cifrado y la contraseña falta o es incorrecta")]
    InvalidPassword,

    #[error("no se pudo normalizar la ruta: {0}")]
    Locator(#[from] LocatorError),

    #[error("la librería PDF no pudo abrir el documento: {0}")]
    Open(LibraryError),

    #[error("la librería PDF no pudo guardar el documento: {0}")]
    Save(LibraryError),
}

impl BackendError {
    /// Colapsa el error al código del anfitrión.
    pub fn code(&self) -> ErrorCode {
        match self {
            BackendError::InvalidArguments(_) => ErrorCode::InvalidArguments,
            BackendError::InvalidPassword => ErrorCode::InvalidPassword,
            BackendError::Locator(_) | BackendError::Open(_) | BackendError::Save(_) => {
                ErrorCode::Unknown
            }
        }
    }
}

impl From<BackendError> for ErrorCode {
    fn from(err: BackendError) -> Self {
        err.code()
    }
}

impl<T> From<Result<T, BackendError>> for ErrorCode {
    fn from(result: Result<T, BackendError>) -> Self {
        match result {
            Ok(_) => ErrorCode::Ok,
            Err(err) => err.code(),
        }
    }
}
