//! Conversión de rutas del sistema de ficheros a localizadores `file://`.
//!
//! El formato sigue el de las URIs de fichero habituales en los visores de
//! escritorio: las rutas relativas se resuelven contra el directorio actual
//! y cada segmento se codifica con porcentajes. En Windows la unidad (`C:`)
//! se deja tal cual.

use std::borrow::Cow;
use std::fmt;
use std::path::{Component, Path, PathBuf, Prefix};

use thiserror::Error;

const SCHEME: &str = "file://";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocatorError {
    #[error("la ruta está vacía")]
    Empty,
    #[error("no se pudo resolver la ruta relativa {}: {}", .0.display(), .1)]
    Unresolvable(PathBuf, String),
    #[error("prefijo de ruta no soportado: {}", .0.display())]
    UnsupportedPrefix(PathBuf),
    #[error("la ruta no se puede representar en este sistema: {0}")]
    Unencodable(String),
    #[error("no es un localizador de fichero: {0}")]
    NotFileUri(String),
}

/// Localizador normalizado (`file:///...`) que consume la librería PDF.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    pub fn from_path(path: &Path) -> Result<Self, LocatorError> {
        if path.as_os_str().is_empty() {
            return Err(LocatorError::Empty);
        }
        let path = std::path::absolute(path)
            .map_err(|err| LocatorError::Unresolvable(path.to_path_buf(), err.to_string()))?;

        let mut uri = String::from(SCHEME);
        for component in path.components() {
            match component {
                Component::Prefix(prefix) => match prefix.kind() {
                    Prefix::Disk(letter) | Prefix::VerbatimDisk(letter) => {
                        uri.push('/');
                        uri.push(char::from(letter));
                        uri.push(':');
                    }
                    _ => return Err(LocatorError::UnsupportedPrefix(path.clone())),
                },
                Component::RootDir => {}
                Component::CurDir => uri.push_str("/."),
                Component::ParentDir => uri.push_str("/.."),
                Component::Normal(segment) => {
                    uri.push('/');
                    uri.push_str(&encode_segment(segment)?);
                }
            }
        }
        if uri.len() == SCHEME.len() {
            uri.push('/');
        }
        Ok(Self(uri))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Ruta de fichero de la que salió el localizador. Las librerías que
    /// abren por ruta (PDFium) la necesitan de vuelta.
    pub fn to_file_path(&self) -> Result<PathBuf, LocatorError> {
        let rest = self
            .0
            .strip_prefix(SCHEME)
            .ok_or_else(|| LocatorError::NotFileUri(self.0.clone()))?;
        let bytes = urlencoding::decode_binary(rest.as_bytes());
        bytes_to_path(&bytes)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&Path> for Locator {
    type Error = LocatorError;

    fn try_from(path: &Path) -> Result<Self, Self::Error> {
        Locator::from_path(path)
    }
}

#[cfg(unix)]
fn encode_segment(segment: &std::ffi::OsStr) -> Result<String, LocatorError> {
    use std::os::unix::ffi::OsStrExt;
    Ok(urlencoding::encode_binary(segment.as_bytes()).into_owned())
}

#[cfg(not(unix))]
fn encode_segment(segment: &std::ffi::OsStr) -> Result<String, LocatorError> {
    let text = segment
        .to_str()
        .ok_or_else(|| LocatorError::Unencodable(segment.to_string_lossy().into_owned()))?;
    Ok(urlencoding::encode(text).into_owned())
}

#[cfg(unix)]
fn bytes_to_path(bytes: &Cow<'_, [u8]>) -> Result<PathBuf, LocatorError> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;
    Ok(PathBuf::from(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
fn bytes_to_path(bytes: &Cow<'_, [u8]>) -> Result<PathBuf, LocatorError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| LocatorError::Unencodable(String::from_utf8_lossy(bytes).into_owned()))?;
    // "/C:/docs/a.pdf" -> "C:/docs/a.pdf"
    let text = match text.as_bytes() {
        [b'/', _, b':', ..] => &text[1..],
        _ => text,
    };
    Ok(PathBuf::from(text))
}
