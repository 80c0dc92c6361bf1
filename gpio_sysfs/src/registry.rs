//! Registry of open pins.
//!
//! Provides a `PinRegistry` that guarantees at most one open handle per pin
//! id. It uses constructor-injection rather than global state: the caller
//! creates a registry and hands clones of it to every `Gpio` facade that
//! must share the same view of open pins.

use gpio_common::error::GpioError;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Table of reserved pin ids.
///
/// Cloning is cheap and yields a handle to the same table.
#[derive(Debug, Clone, Default)]
pub struct PinRegistry {
    pins: Arc<Mutex<HashSet<u32>>>,
}

impl PinRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserve `pin` for a handle about to be opened.
    ///
    /// The slot stays reserved until the returned guard is dropped.
    ///
    /// # Errors
    /// Returns `GpioError::AlreadyOpen` if the pin is already reserved.
    pub fn reserve(&self, pin: u32) -> Result<PinReservation, GpioError> {
        if !self.pins.lock().insert(pin) {
            return Err(GpioError::AlreadyOpen { pin });
        }
        debug!("GPIO {} reserved", pin);
        Ok(PinReservation {
            registry: self.clone(),
            pin,
        })
    }

    /// Whether `pin` is currently reserved.
    pub fn is_open(&self, pin: u32) -> bool {
        self.pins.lock().contains(&pin)
    }

    /// All reserved pin ids, ascending.
    pub fn open_pins(&self) -> Vec<u32> {
        let mut pins: Vec<u32> = self.pins.lock().iter().copied().collect();
        pins.sort_unstable();
        pins
    }

    /// Number of reserved pins.
    pub fn len(&self) -> usize {
        self.pins.lock().len()
    }

    /// Whether no pin is reserved.
    pub fn is_empty(&self) -> bool {
        self.pins.lock().is_empty()
    }

    fn release(&self, pin: u32) {
        if self.pins.lock().remove(&pin) {
            debug!("GPIO {} released", pin);
        }
    }
}

/// Reservation of one pin id; releases the slot on drop.
#[derive(Debug)]
pub struct PinReservation {
    registry: PinRegistry,
    pin: u32,
}

impl Drop for PinReservation {
    fn drop(&mut self) {
        self.registry.release(self.pin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_reserve_and_release() {
        let reg = PinRegistry::new();
        let slot = reg.reserve(4).expect("should reserve");
        assert!(reg.is_open(4));
        assert_eq!(reg.len(), 1);

        drop(slot);
        assert!(!reg.is_open(4));
        assert!(reg.is_empty());
    }

    #[test]
    fn registry_rejects_double_reserve() {
        let reg = PinRegistry::new();
        let _slot = reg.reserve(17).unwrap();
        let result = reg.reserve(17);
        assert!(matches!(result, Err(GpioError::AlreadyOpen { pin: 17 })));
    }

    #[test]
    fn registry_reserve_again_after_release() {
        let reg = PinRegistry::new();
        drop(reg.reserve(17).unwrap());
        assert!(reg.reserve(17).is_ok());
    }

    #[test]
    fn registry_clones_share_table() {
        let reg = PinRegistry::new();
        let other = reg.clone();
        let _a = reg.reserve(2).unwrap();
        let _b = other.reserve(1).unwrap();

        assert_eq!(reg.open_pins(), vec![1, 2]);
        assert_eq!(other.len(), 2);
        assert!(other.reserve(2).is_err());
    }

    #[test]
    fn registry_concurrent_reserve_has_single_winner() {
        let reg = PinRegistry::new();
        let winners: Vec<_> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| {
                    let reg = reg.clone();
                    s.spawn(move || reg.reserve(5).ok())
                })
                .collect();
            handles
                .into_iter()
                .filter_map(|h| h.join().unwrap())
                .collect()
        });
        assert_eq!(winners.len(), 1);
    }
}
