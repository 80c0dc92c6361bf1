//! # Sysfs GPIO Library
//!
//! Pin lifecycle and change-detection engine over the kernel's sysfs GPIO
//! attribute files.
//!
//! # Module Structure
//!
//! - [`core`] - `Gpio` facade, opens pins
//! - [`pin`] - `PinHandle`, lifecycle state machine and transition logic
//! - [`dispatcher`] - Ordered, fault-isolating change fan-out
//! - [`registry`] - Table of open pins
//! - [`fs`] - `PinFs` attribute I/O trait and the real `SysfsFs`
//! - [`paths`] - Pin id to attribute paths
//! - [`sim`] - In-memory kernel model for tests and `--simulate`
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Gpio::open ──► PinRegistry::reserve                          │
//! │      │                                                        │
//! │      ▼                                                        │
//! │  PinHandle ◄── set/reset ──┐         ┌── Poller (inputs) ──┐  │
//! │      │     per-pin FIFO    │         │  interval re-read   │  │
//! │      ▼                     └─► apply ◄─────────────────────┘  │
//! │  ChangeDispatcher ──► listeners (registration order)          │
//! │      │                                                        │
//! │      ▼                                                        │
//! │  PinFs (SysfsFs | SimulatedSysfs)                             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use gpio_sysfs::{Gpio, PinConfig};
//!
//! # async fn demo() -> Result<(), gpio_sysfs::GpioError> {
//! let gpio = Gpio::sysfs();
//! let led = gpio.open(PinConfig::output(4)).await?;
//! let button = gpio.open(PinConfig::input(17)).await?;
//!
//! button.on(|event| println!("button {}", event.value))?;
//! led.set().await?;
//! led.reset().await?;
//!
//! button.close().await?;
//! led.close().await?;
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]

pub mod core;
pub mod dispatcher;
pub mod fs;
pub mod paths;
pub mod pin;
mod poller;
pub mod registry;
pub mod sim;

// Re-export key types for convenience
pub use crate::core::Gpio;
pub use crate::dispatcher::{ChangeDispatcher, DispatchReport, ListenerFault, ListenerId};
pub use crate::fs::{PinFs, SysfsFs};
pub use crate::pin::PinHandle;
pub use crate::registry::{PinRegistry, PinReservation};
pub use crate::sim::SimulatedSysfs;
pub use gpio_common::error::{GpioError, GpioResult};
pub use gpio_common::types::{ChangeEvent, ChangeSource, Direction, Level, Phase, PinConfig};
