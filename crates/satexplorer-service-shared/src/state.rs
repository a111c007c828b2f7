//! Application state for the HTTP service.
//!
//! Holds the upstream clients and the mosaic registry that axum handlers
//! share through the `State` extractor.

use std::sync::Arc;

use satexplorer_lib::{Error as LibError, MosaicStore, Settings, StacClient, TilerClient};

/// Service name reported by health probes until [`AppState::with_service`] is called.
pub const DEFAULT_SERVICE_NAME: &str = "satexplorer";

/// Error during application state initialization.
#[derive(Debug)]
pub enum AppStateError {
    /// The STAC client could not be constructed.
    StacClient(LibError),

    /// The tiler client could not be constructed.
    TilerClient(LibError),

    /// No STAC collections were configured.
    NoCollections,
}

impl std::fmt::Display for AppStateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StacClient(e) => write!(f, "failed to build STAC client: {}", e),
            Self::TilerClient(e) => write!(f, "failed to build tiler client: {}", e),
            Self::NoCollections => write!(f, "DEFAULT_COLLECTIONS lists no collections"),
        }
    }
}

impl std::error::Error for AppStateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::StacClient(e) | Self::TilerClient(e) => Some(e),
            Self::NoCollections => None,
        }
    }
}

/// Shared application state for all axum handlers.
///
/// Cheaply cloneable; every clone sees the same mosaic registry.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, routing::get, extract::State};
/// use satexplorer_service_shared::AppState;
///
/// async fn handler(State(state): State<AppState>) -> String {
///     state.mosaics().len().to_string()
/// }
///
/// let state = AppState::from_settings(Settings::from_env()?)?;
/// let app = Router::new().route("/count", get(handler)).with_state(state);
/// ```
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

#[derive(Clone)]
struct AppStateInner {
    service_name: String,
    service_version: String,
    settings: Settings,
    stac: StacClient,
    tiler: TilerClient,
    mosaics: MosaicStore,
}

impl AppState {
    /// Build clients for the configured STAC API and tiler and an empty registry.
    pub fn from_settings(settings: Settings) -> Result<Self, AppStateError> {
        let collections = settings.collections();
        if collections.is_empty() {
            return Err(AppStateError::NoCollections);
        }

        tracing::info!(
            stac_api_url = %settings.stac_api_url,
            collections = ?collections,
            "configuring STAC client"
        );
        let stac = StacClient::new(
            settings.stac_api_url.clone(),
            collections,
            settings.http_timeout,
        )
        .map_err(AppStateError::StacClient)?;

        tracing::info!(tiler_url = %settings.tiler_url, "configuring tiler client");
        let tiler = TilerClient::new(settings.tiler_url.clone(), settings.http_timeout)
            .map_err(AppStateError::TilerClient)?;

        Ok(Self::from_components(settings, stac, tiler, MosaicStore::new()))
    }

    /// Assemble state from pre-built components.
    pub fn from_components(
        settings: Settings,
        stac: StacClient,
        tiler: TilerClient,
        mosaics: MosaicStore,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                service_name: DEFAULT_SERVICE_NAME.to_string(),
                service_version: env!("CARGO_PKG_VERSION").to_string(),
                settings,
                stac,
                tiler,
                mosaics,
            }),
        }
    }

    /// Name and version the health probes report, normally the binary's own.
    pub fn with_service(mut self, name: impl Into<String>, version: impl Into<String>) -> Self {
        let inner = Arc::make_mut(&mut self.inner);
        inner.service_name = name.into();
        inner.service_version = version.into();
        self
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }

    pub fn service_version(&self) -> &str {
        &self.inner.service_version
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub fn stac(&self) -> &StacClient {
        &self.inner.stac
    }

    pub fn tiler(&self) -> &TilerClient {
        &self.inner.tiler
    }

    pub fn mosaics(&self) -> &MosaicStore {
        &self.inner.mosaics
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("service", &self.inner.service_name)
            .field("stac_api_url", &self.inner.settings.stac_api_url)
            .field("tiler_url", &self.inner.settings.tiler_url)
            .field("mosaics_stored", &self.inner.mosaics.len())
            .finish()
    }
}
