use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use log::debug;
use windp_backend::{BackendConfig, BackendDocument, PdfBackend, PdfSystem};

const USAGE: &str = "uso: windp-backend <fichero.pdf> [--password <clave>] [--save-as <destino.pdf>] [--signatures]";

struct Args {
    file: PathBuf,
    password: Option<String>,
    save_as: Option<PathBuf>,
    signatures: bool,
}

fn parse_args() -> anyhow::Result<Args> {
    // args[0] es el ejecutable, el resto son opciones y el fichero PDF
    let mut args = std::env::args().skip(1);
    let mut file = None;
    let mut password = None;
    let mut save_as = None;
    let mut signatures = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--password" => password = Some(args.next().context("--password necesita un valor")?),
            "--save-as" => save_as = Some(PathBuf::from(args.next().context("--save-as necesita un valor")?)),
            "--signatures" => signatures = true,
            "-h" | "--help" => bail!(USAGE),
            other if file.is_none() => file = Some(PathBuf::from(other)),
            other => bail!("argumento inesperado: {other}\n{USAGE}"),
        }
    }

    Ok(Args {
        file: file.context(USAGE)?,
        password,
        save_as,
        signatures,
    })
}

fn run(args: Args) -> anyhow::Result<()> {
    // El sistema PDF vive más que el backend y que cualquier documento abierto.
    // La contraseña vive en `args`, que sobrevive a ambos: PDFium la toma
    // prestada mientras el documento esté abierto.
    let pdf_system = PdfSystem::new()
        .map_err(|err| anyhow::anyhow!("No se pudo cargar PDFium: {err:?}"))?;

    let mut config = BackendConfig::from_env();
    config.signature_overlay |= args.signatures;
    let backend = PdfBackend::new(&pdf_system, config);
    debug!("configuración del backend: {:?}", backend.config());

    let mut document = BackendDocument::new(args.file.clone());
    document.set_password(args.password.as_deref());

    let code = backend.document_open(Some(&mut document));
    if !code.is_ok() {
        bail!("No se pudo abrir {}: {code:?}", args.file.display());
    }
    println!("{}: {} páginas", args.file.display(), document.page_count());

    if let Some(cache) = document.backend_data().and_then(|session| session.signatures()) {
        for (page, signatures) in cache.iter().filter(|(_, s)| !s.is_empty()) {
            for signature in signatures {
                println!(
                    "  página {}: firma {} ({}) {}",
                    page + 1,
                    signature.field_name.as_deref().unwrap_or("sin nombre"),
                    signature.reason.as_deref().unwrap_or("sin motivo"),
                    signature.signing_date.as_deref().unwrap_or("")
                );
            }
        }
    }

    let saved = args
        .save_as
        .as_deref()
        .map(|destination| (destination, backend.document_save_as(Some(&document), Some(destination))));

    backend.document_free(Some(&mut document));

    if let Some((destination, code)) = saved {
        if !code.is_ok() {
            bail!("No se pudo guardar en {}: {code:?}", destination.display());
        }
        println!("Guardado en {}", destination.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();

    let result = parse_args().and_then(run);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
