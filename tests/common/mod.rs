//! Librería PDF falsa e instrumentada: cuenta cada documento y registro
//! vivo y anota en orden cada llamada que recibe.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use windp_backend::{LibraryError, Locator, PdfLibrary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Open(PathBuf),
    Save(PathBuf),
    Discover,
    ReleaseDocument(u32),
    FreeRecord { page: usize, seq: usize },
}

#[derive(Debug, Default)]
pub struct Ledger {
    events: RefCell<Vec<Event>>,
    documents_created: Cell<usize>,
    documents_alive: Cell<isize>,
    records_created: Cell<usize>,
    records_alive: Cell<isize>,
    /// Registros liberados cuando no quedaba ningún documento vivo.
    records_freed_after_handle: Cell<usize>,
}

impl Ledger {
    fn log(&self, event: Event) {
        self.events.borrow_mut().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.borrow().clone()
    }

    pub fn call_count(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn documents_created(&self) -> usize {
        self.documents_created.get()
    }

    pub fn records_created(&self) -> usize {
        self.records_created.get()
    }

    /// Asignaciones de la librería todavía sin liberar.
    pub fn outstanding(&self) -> isize {
        self.documents_alive.get() + self.records_alive.get()
    }

    pub fn records_freed_after_handle(&self) -> usize {
        self.records_freed_after_handle.get()
    }

    pub fn freed_records(&self) -> Vec<(usize, usize)> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::FreeRecord { page, seq } => Some((*page, *seq)),
                _ => None,
            })
            .collect()
    }
}

#[derive(Debug)]
pub struct FakeDocument {
    pub id: u32,
    pub pages: usize,
    file: FakeFile,
    ledger: Rc<Ledger>,
}

impl Drop for FakeDocument {
    fn drop(&mut self) {
        self.ledger.documents_alive.set(self.ledger.documents_alive.get() - 1);
    }
}

#[derive(Debug)]
pub struct FakeRecord {
    pub page: usize,
    /// Orden de descubrimiento dentro de todo el documento.
    pub seq: usize,
    ledger: Rc<Ledger>,
}

impl Drop for FakeRecord {
    fn drop(&mut self) {
        self.ledger.records_alive.set(self.ledger.records_alive.get() - 1);
    }
}

/// Un PDF "en disco" para la librería falsa.
#[derive(Debug, Clone, Default)]
pub struct FakeFile {
    pub pages: usize,
    pub password: Option<String>,
    /// Página de cada firma, en orden de descubrimiento.
    pub signatures: Vec<usize>,
    /// El descubrimiento falla después de entregar este número de firmas.
    pub discovery_fails_after: Option<usize>,
}

impl FakeFile {
    pub fn pages(pages: usize) -> Self {
        Self {
            pages,
            ..Self::default()
        }
    }

    pub fn encrypted(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn signed_on(mut self, pages: &[usize]) -> Self {
        self.signatures = pages.to_vec();
        self
    }

    pub fn discovery_fails_after(mut self, delivered: usize) -> Self {
        self.discovery_fails_after = Some(delivered);
        self
    }
}

#[derive(Debug, Default)]
pub struct FakeLibrary {
    pub ledger: Rc<Ledger>,
    files: HashMap<PathBuf, FakeFile>,
    next_id: Cell<u32>,
}

impl FakeLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, file: FakeFile) -> Self {
        let path = std::path::absolute(path.as_ref()).expect("ruta absoluta");
        self.files.insert(path, file);
        self
    }

    pub fn ledger(&self) -> Rc<Ledger> {
        Rc::clone(&self.ledger)
    }
}

impl<'p> PdfLibrary<'p> for FakeLibrary {
    type Document = FakeDocument;
    type Record = FakeRecord;

    fn open(&self, locator: &Locator, password: Option<&'p str>) -> Result<FakeDocument, LibraryError> {
        let path = locator
            .to_file_path()
            .map_err(|err| LibraryError::Other(err.to_string()))?;
        self.ledger.log(Event::Open(path.clone()));

        let file = self
            .files
            .get(&path)
            .ok_or_else(|| LibraryError::Other(format!("no existe {}", path.display())))?;
        if file.password.is_some() && file.password.as_deref() != password {
            return Err(LibraryError::Encrypted);
        }

        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        self.ledger.documents_created.set(self.ledger.documents_created.get() + 1);
        self.ledger.documents_alive.set(self.ledger.documents_alive.get() + 1);

        Ok(FakeDocument {
            id,
            pages: file.pages,
            file: file.clone(),
            ledger: Rc::clone(&self.ledger),
        })
    }

    fn page_count(&self, document: &FakeDocument) -> usize {
        document.pages
    }

    fn save(&self, _document: &FakeDocument, locator: &Locator) -> Result<(), LibraryError> {
        let path = locator
            .to_file_path()
            .map_err(|err| LibraryError::Other(err.to_string()))?;
        self.ledger.log(Event::Save(path.clone()));
        if path.starts_with("/readonly") {
            return Err(LibraryError::Other("sistema de ficheros de solo lectura".into()));
        }
        Ok(())
    }

    fn discover_signatures(
        &self,
        document: &FakeDocument,
        sink: &mut dyn FnMut(usize, FakeRecord),
    ) -> Result<(), LibraryError> {
        self.ledger.log(Event::Discover);
        let file = &document.file;
        for (seq, page) in file.signatures.iter().copied().enumerate() {
            if file.discovery_fails_after == Some(seq) {
                return Err(LibraryError::Other("firma corrupta".into()));
            }
            self.ledger.records_created.set(self.ledger.records_created.get() + 1);
            self.ledger.records_alive.set(self.ledger.records_alive.get() + 1);
            sink(
                page,
                FakeRecord {
                    page,
                    seq,
                    ledger: Rc::clone(&self.ledger),
                },
            );
        }
        Ok(())
    }

    fn release_document(&self, document: FakeDocument) {
        self.ledger.log(Event::ReleaseDocument(document.id));
    }

    fn free_record(&self, record: FakeRecord) {
        if self.ledger.documents_alive.get() == 0 {
            let late = self.ledger.records_freed_after_handle.get() + 1;
            self.ledger.records_freed_after_handle.set(late);
        }
        self.ledger.log(Event::FreeRecord {
            page: record.page,
            seq: record.seq,
        });
    }
}
