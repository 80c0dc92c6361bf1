//! `Gpio` facade: the entry point for opening pins.
//!
//! A `Gpio` bundles the attribute filesystem, the sysfs root and the pin
//! registry. Facades built with the same registry (see
//! [`Gpio::with_registry`]) refuse to open the same pin twice.

use gpio_common::config::GpioConfig;
use gpio_common::consts::{DEFAULT_EXPORT_SETTLE_MS, DEFAULT_SYSFS_ROOT};
use gpio_common::error::GpioResult;
use gpio_common::types::PinConfig;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::fs::{PinFs, SysfsFs};
use crate::paths::PinPaths;
use crate::pin::PinHandle;
use crate::registry::PinRegistry;

/// Opens pins against one GPIO class directory.
pub struct Gpio<F: PinFs = SysfsFs> {
    fs: Arc<F>,
    registry: PinRegistry,
    root: PathBuf,
    export_settle: Duration,
}

impl<F: PinFs> Clone for Gpio<F> {
    fn clone(&self) -> Self {
        Self {
            fs: Arc::clone(&self.fs),
            registry: self.registry.clone(),
            root: self.root.clone(),
            export_settle: self.export_settle,
        }
    }
}

impl Gpio<SysfsFs> {
    /// Real sysfs at the default location.
    pub fn sysfs() -> Self {
        Self::new(SysfsFs)
    }
}

impl<F: PinFs> Gpio<F> {
    /// Facade over `fs` with default root, settle time and a fresh registry.
    pub fn new(fs: F) -> Self {
        Self {
            fs: Arc::new(fs),
            registry: PinRegistry::new(),
            root: PathBuf::from(DEFAULT_SYSFS_ROOT),
            export_settle: Duration::from_millis(DEFAULT_EXPORT_SETTLE_MS),
        }
    }

    /// Facade configured from the `[sysfs]` section of a service config.
    pub fn from_config(fs: F, config: &GpioConfig) -> Self {
        Self::new(fs)
            .with_root(config.sysfs.root.clone())
            .with_export_settle(config.sysfs.export_settle())
    }

    /// Use a different GPIO class directory.
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    /// Maximum wait for the pin directory after export.
    pub fn with_export_settle(mut self, settle: Duration) -> Self {
        self.export_settle = settle;
        self
    }

    /// Share an existing registry.
    pub fn with_registry(mut self, registry: PinRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Registry of pins opened through this facade.
    pub fn registry(&self) -> &PinRegistry {
        &self.registry
    }

    /// Open a pin: reserve, export, configure, start polling for inputs.
    ///
    /// # Errors
    /// `InvalidConfig`, `AlreadyOpen`, `Export`, `Direction`, `Write`,
    /// `Read` or `InvalidValue`. The registry slot is released on failure.
    pub async fn open(&self, config: PinConfig) -> GpioResult<PinHandle<F>> {
        config.validate()?;
        let reservation = self.registry.reserve(config.pin)?;
        let paths = PinPaths::new(&self.root, config.pin);
        PinHandle::establish(
            Arc::clone(&self.fs),
            paths,
            config,
            reservation,
            self.export_settle,
        )
        .await
    }

    /// Open several pins. If one fails, those already opened are closed
    /// again before the error is returned.
    pub async fn open_all(&self, configs: &[PinConfig]) -> GpioResult<Vec<PinHandle<F>>> {
        let mut handles = Vec::with_capacity(configs.len());
        for config in configs {
            match self.open(*config).await {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    for handle in &handles {
                        if let Err(close_err) = handle.close().await {
                            warn!("rollback: {}", close_err);
                        }
                    }
                    return Err(err);
                }
            }
        }
        info!("Opened {} pins under {}", handles.len(), self.root.display());
        Ok(handles)
    }
}
