use std::env;

/// Variable de entorno que activa la caché de firmas por página.
pub const SIGNATURE_OVERLAY_ENV: &str = "WINDP_SIGNATURE_OVERLAY";

/// Configuración del backend. Se fija antes de abrir el primer documento y
/// cada sesión la lee solo en `open`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendConfig {
    /// Descubre las firmas digitales al abrir y las guarda por página
    /// para que el visor pueda dibujar el overlay.
    pub signature_overlay: bool,
}

impl BackendConfig {
    pub fn new(signature_overlay: bool) -> Self {
        Self { signature_overlay }
    }

    /// Lee la configuración del entorno. Valores no reconocidos desactivan.
    pub fn from_env() -> Self {
        let signature_overlay = env::var(SIGNATURE_OVERLAY_ENV)
            .map(|value| parse_flag(&value))
            .unwrap_or(false);
        Self { signature_overlay }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
