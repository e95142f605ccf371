//! Lectura de campos de firma directamente del árbol de objetos del PDF.
//!
//! Cada widget de firma se resuelve contra su propio campo (`/FT /Sig`,
//! heredado por `/Parent` si hace falta) y los metadatos salen del
//! diccionario `/V` de ese mismo campo. Así un campo sin firmar nunca recibe
//! los datos de otro, y el orden de `/AcroForm /Fields` no importa.

use lopdf::{Dictionary, Document, Object};

/// Profundidad máxima al subir por `/Parent`; protege de ciclos.
const MAX_FIELD_DEPTH: usize = 32;

/// Metadatos de un campo de firma, copiados del PDF para que el registro sea
/// dueño de sus datos y no dependa de la página de la que salió.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureInfo {
    pub page_index: usize,
    /// Nombre completo del campo (`padre.hijo`).
    pub field_name: Option<String>,
    pub reason: Option<String>,
    pub signing_date: Option<String>,
    /// Tamaño del bloque PKCS#7 firmado, 0 si el campo está sin firmar.
    pub contents_len: usize,
}

impl SignatureInfo {
    pub fn is_signed(&self) -> bool {
        self.contents_len > 0
    }
}

/// Todos los widgets de firma del documento, en orden de página y, dentro de
/// cada página, en el orden de `/Annots`.
pub fn scan(document: &Document) -> Vec<SignatureInfo> {
    let mut found = Vec::new();

    for (page_index, (_, page_id)) in document.get_pages().into_iter().enumerate() {
        let Ok(page) = document.get_dictionary(page_id) else {
            continue;
        };
        let Some(annots) = page
            .get(b"Annots")
            .ok()
            .and_then(|annots| resolve(document, annots).as_array().ok())
        else {
            continue;
        };

        for annot in annots {
            let Ok(widget) = resolve(document, annot).as_dict() else {
                continue;
            };
            if let Some(info) = signature_widget(document, widget, page_index) {
                found.push(info);
            }
        }
    }

    found
}

fn signature_widget(document: &Document, widget: &Dictionary, page_index: usize) -> Option<SignatureInfo> {
    let subtype = widget.get(b"Subtype").and_then(Object::as_name).ok()?;
    if subtype != b"Widget" {
        return None;
    }
    let field_type = inherited(document, widget, b"FT")?.as_name().ok()?;
    if field_type != b"Sig" {
        return None;
    }

    let mut info = SignatureInfo {
        page_index,
        field_name: full_name(document, widget),
        reason: None,
        signing_date: None,
        contents_len: 0,
    };

    if let Some(value) = inherited(document, widget, b"V").and_then(|v| v.as_dict().ok()) {
        info.reason = text(document, value, b"Reason");
        info.signing_date = text(document, value, b"M");
        info.contents_len = value
            .get(b"Contents")
            .ok()
            .map(|contents| resolve(document, contents))
            .and_then(|contents| match contents {
                Object::String(bytes, _) => Some(bytes.len()),
                _ => None,
            })
            .unwrap_or(0);
    }

    Some(info)
}

fn resolve<'d>(document: &'d Document, object: &'d Object) -> &'d Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

fn parent<'d>(document: &'d Document, dict: &'d Dictionary) -> Option<&'d Dictionary> {
    let parent = dict.get(b"Parent").ok()?;
    resolve(document, parent).as_dict().ok()
}

/// Atributo de campo, buscado en el widget y después en sus padres.
fn inherited<'d>(document: &'d Document, widget: &'d Dictionary, key: &[u8]) -> Option<&'d Object> {
    let mut current = Some(widget);
    for _ in 0..MAX_FIELD_DEPTH {
        let dict = current?;
        if let Ok(value) = dict.get(key) {
            return Some(resolve(document, value));
        }
        current = parent(document, dict);
    }
    None
}

fn full_name(document: &Document, widget: &Dictionary) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = Some(widget);
    for _ in 0..MAX_FIELD_DEPTH {
        let Some(dict) = current else { break };
        if let Some(part) = text(document, dict, b"T") {
            parts.push(part);
        }
        current = parent(document, dict);
    }

    if parts.is_empty() {
        return None;
    }
    parts.reverse();
    Some(parts.join("."))
}

fn text(document: &Document, dict: &Dictionary, key: &[u8]) -> Option<String> {
    match resolve(document, dict.get(key).ok()?) {
        Object::String(bytes, _) => Some(decode_text(bytes)),
        _ => None,
    }
}

/// Cadena de texto PDF: UTF-16BE con BOM o, si no, un byte por carácter.
fn decode_text(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().copied().map(char::from).collect(),
    }
}
