use std::env;
use std::path::PathBuf;

/// Si está definida, no se descarga nada: el usuario aporta su propia PDFium.
const SKIP_ENV: &str = "WINDP_SKIP_PDFIUM_DOWNLOAD";

fn main() -> anyhow::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed={SKIP_ENV}");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);

    // Solo descargamos en Windows; en Linux/macOS se usa la PDFium del sistema
    // (PdfSystem prueba primero ./ y después la librería del sistema).
    #[cfg(target_os = "windows")]
    {
        if env::var_os(SKIP_ENV).is_none() {
            windows::setup_pdfium(&manifest_dir)?;
        }
    }

    // Instrucciones para que el linker sepa dónde buscar (aunque sea carga dinámica)
    println!("cargo:rustc-link-search=native={}", manifest_dir.display());
    Ok(())
}

#[cfg(target_os = "windows")]
mod windows {
    use anyhow::Context;
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;

    const PDFIUM_URL: &str =
        "https://github.com/bblanchon/pdfium-binaries/releases/latest/download/pdfium-win-x64.zip";
    const DLL_NAME: &str = "pdfium.dll";

    pub fn setup_pdfium(root_dir: &Path) -> anyhow::Result<()> {
        // La DLL va a la raíz del proyecto para que 'cargo run' la encuentre.
        let dll_path = root_dir.join(DLL_NAME);
        if dll_path.exists() {
            return Ok(());
        }

        println!("cargo:warning=Descargando PDFium desde {PDFIUM_URL}...");
        let response = reqwest::blocking::get(PDFIUM_URL)
            .and_then(|response| response.error_for_status())
            .context("Fallo al descargar PDFium")?
            .bytes()
            .context("Fallo al leer bytes del ZIP")?;

        let mut zip = zip::ZipArchive::new(Cursor::new(response)).context("Fallo al abrir el ZIP")?;
        let index = (0..zip.len())
            .find(|&i| {
                zip.by_index(i)
                    .map(|f| f.name().ends_with("bin/pdfium.dll") || f.name() == DLL_NAME)
                    .unwrap_or(false)
            })
            .context("No se encontró pdfium.dll dentro del ZIP descargado")?;
        let mut dll_file = zip.by_index(index)?;

        let mut out_file = fs::File::create(&dll_path)
            .with_context(|| format!("Fallo al crear el archivo {}", dll_path.display()))?;
        std::io::copy(&mut dll_file, &mut out_file).context("Fallo al extraer pdfium.dll")?;

        println!("cargo:warning=PDFium instalado en {}", dll_path.display());
        Ok(())
    }
}
