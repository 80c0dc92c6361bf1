//! Pin id → attribute file paths.

use gpio_common::consts::{
    DIRECTION_FILE, EXPORT_FILE, PIN_DIR_PREFIX, UNEXPORT_FILE, VALUE_FILE,
};
use std::path::{Path, PathBuf};

/// Attribute file locations of one pin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinPaths {
    /// `<root>/export`
    pub export: PathBuf,
    /// `<root>/unexport`
    pub unexport: PathBuf,
    /// `<root>/gpio<N>`
    pub dir: PathBuf,
    /// `<root>/gpio<N>/direction`
    pub direction: PathBuf,
    /// `<root>/gpio<N>/value`
    pub value: PathBuf,
}

impl PinPaths {
    /// Resolve the paths of `pin` under the GPIO class directory `root`.
    pub fn new(root: &Path, pin: u32) -> Self {
        let dir = root.join(format!("{PIN_DIR_PREFIX}{pin}"));
        Self {
            export: root.join(EXPORT_FILE),
            unexport: root.join(UNEXPORT_FILE),
            direction: dir.join(DIRECTION_FILE),
            value: dir.join(VALUE_FILE),
            dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_default_layout() {
        let paths = PinPaths::new(Path::new("/sys/class/gpio"), 17);
        assert_eq!(paths.export, PathBuf::from("/sys/class/gpio/export"));
        assert_eq!(paths.unexport, PathBuf::from("/sys/class/gpio/unexport"));
        assert_eq!(paths.dir, PathBuf::from("/sys/class/gpio/gpio17"));
        assert_eq!(
            paths.direction,
            PathBuf::from("/sys/class/gpio/gpio17/direction")
        );
        assert_eq!(paths.value, PathBuf::from("/sys/class/gpio/gpio17/value"));
    }

    #[test]
    fn honours_custom_root() {
        let paths = PinPaths::new(Path::new("/tmp/gpio"), 0);
        assert_eq!(paths.value, PathBuf::from("/tmp/gpio/gpio0/value"));
    }
}
