//! Simulated sysfs GPIO class directory.
//!
//! The `SimulatedSysfs` models the kernel side of the attribute interface:
//! - `export`/`unexport` create and remove pin directories
//! - `direction` accepts `in`, `out`, `high`, `low`
//! - `value` rejects writes while the pin is an input
//! - Wired pins (output → input) mirror the driving pin's level
//! - Inputs can be driven externally, like a button or sensor
//!
//! Fault injection covers the cases real boards produce: pins exported at
//! boot, exports denied by permissions, and transient read failures.

use gpio_common::consts::{
    DEFAULT_SYSFS_ROOT, DIRECTION_FILE, EXPORT_FILE, PIN_DIR_PREFIX, UNEXPORT_FILE, VALUE_FILE,
};
use gpio_common::types::{Direction, Level};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::trace;

use crate::fs::PinFs;

/// Attribute node addressed by a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Root,
    Export,
    Unexport,
    PinDir(u32),
    Direction(u32),
    Value(u32),
}

/// Kernel-side state of one GPIO line.
#[derive(Debug, Clone, Copy)]
struct SimLine {
    exported: bool,
    direction: Direction,
    level: Level,
}

impl Default for SimLine {
    fn default() -> Self {
        Self {
            exported: false,
            direction: Direction::In,
            level: Level::Low,
        }
    }
}

#[derive(Debug, Default)]
struct SimState {
    lines: HashMap<u32, SimLine>,
    /// input pin → driving pin
    wires: HashMap<u32, u32>,
    denied_exports: HashSet<u32>,
    read_faults: HashMap<u32, u32>,
    writes: Vec<(PathBuf, String)>,
}

impl SimState {
    fn line(&mut self, pin: u32) -> &mut SimLine {
        self.lines.entry(pin).or_default()
    }

    fn exported(&self, pin: u32) -> Option<&SimLine> {
        self.lines.get(&pin).filter(|l| l.exported)
    }

    fn effective_level(&self, pin: u32) -> Option<Level> {
        let line = self.lines.get(&pin)?;
        let level = match self.wires.get(&pin) {
            Some(driver) => self.lines.get(driver).map_or(Level::Low, |d| d.level),
            None => line.level,
        };
        Some(level)
    }
}

/// In-memory GPIO class directory.
///
/// Clones share state, so a test can keep one clone to inspect and stimulate
/// the "hardware" while the engine owns another.
#[derive(Debug, Clone)]
pub struct SimulatedSysfs {
    root: PathBuf,
    state: Arc<Mutex<SimState>>,
}

impl Default for SimulatedSysfs {
    fn default() -> Self {
        Self::new(DEFAULT_SYSFS_ROOT)
    }
}

impl SimulatedSysfs {
    /// Create a simulated class directory rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            state: Arc::new(Mutex::new(SimState::default())),
        }
    }

    /// GPIO class directory this simulation answers for.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Mark `pin` as exported by firmware before the program starts.
    pub fn pre_export(&self, pin: u32, direction: Direction) {
        let mut state = self.state.lock();
        let line = state.line(pin);
        line.exported = true;
        line.direction = direction;
    }

    /// Make exports of `pin` fail with permission denied.
    pub fn deny_export(&self, pin: u32) {
        self.state.lock().denied_exports.insert(pin);
    }

    /// Connect output `driver` to input `input`: reads of `input` return the
    /// level of `driver`.
    pub fn wire(&self, driver: u32, input: u32) {
        let mut state = self.state.lock();
        state.line(driver);
        state.line(input);
        state.wires.insert(input, driver);
    }

    /// Set the externally applied level of an input line.
    pub fn drive(&self, pin: u32, level: Level) {
        self.state.lock().line(pin).level = level;
    }

    /// Make the next `count` value reads of `pin` fail.
    pub fn fail_reads(&self, pin: u32, count: u32) {
        self.state.lock().read_faults.insert(pin, count);
    }

    /// Level a read of the value attribute would return.
    pub fn level(&self, pin: u32) -> Option<Level> {
        self.state.lock().effective_level(pin)
    }

    /// Current direction of an exported pin.
    pub fn direction(&self, pin: u32) -> Option<Direction> {
        self.state.lock().exported(pin).map(|l| l.direction)
    }

    /// Whether `pin` is exported.
    pub fn is_exported(&self, pin: u32) -> bool {
        self.state.lock().exported(pin).is_some()
    }

    /// Every successful write, in order.
    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.state.lock().writes.clone()
    }

    fn resolve(&self, path: &Path) -> Option<Node> {
        let rel = path.strip_prefix(&self.root).ok()?;
        let parts: Vec<&str> = rel.iter().map(|c| c.to_str()).collect::<Option<_>>()?;

        match parts.as_slice() {
            [] => Some(Node::Root),
            [name] if *name == EXPORT_FILE => Some(Node::Export),
            [name] if *name == UNEXPORT_FILE => Some(Node::Unexport),
            [dir] => parse_pin_dir(dir).map(Node::PinDir),
            [dir, attr] => {
                let pin = parse_pin_dir(dir)?;
                match *attr {
                    a if a == DIRECTION_FILE => Some(Node::Direction(pin)),
                    a if a == VALUE_FILE => Some(Node::Value(pin)),
                    _ => None,
                }
            }
            _ => None,
        }
    }

    fn read_node(&self, path: &Path) -> io::Result<String> {
        let node = self.resolve(path).ok_or_else(|| not_found(path))?;
        let mut state = self.state.lock();

        match node {
            Node::Export | Node::Unexport => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "control file is write-only",
            )),
            Node::Root | Node::PinDir(_) => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                "is a directory",
            )),
            Node::Direction(pin) => state
                .exported(pin)
                .map(|l| format!("{}\n", l.direction.as_sysfs()))
                .ok_or_else(|| not_found(path)),
            Node::Value(pin) => {
                if state.exported(pin).is_none() {
                    return Err(not_found(path));
                }
                if let Some(left) = state.read_faults.get_mut(&pin) {
                    if *left > 0 {
                        *left -= 1;
                        return Err(io::Error::other("injected read fault"));
                    }
                }
                let level = state.effective_level(pin).unwrap_or_default();
                Ok(format!("{}\n", level.as_sysfs()))
            }
        }
    }

    fn write_node(&self, path: &Path, contents: &str) -> io::Result<()> {
        let node = self.resolve(path).ok_or_else(|| not_found(path))?;
        let mut state = self.state.lock();

        match node {
            Node::Export => {
                let pin = parse_pin_number(contents)?;
                if state.denied_exports.contains(&pin) {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "permission denied",
                    ));
                }
                let line = state.line(pin);
                if line.exported {
                    return Err(io::Error::new(
                        io::ErrorKind::ResourceBusy,
                        "device or resource busy",
                    ));
                }
                line.exported = true;
                line.direction = Direction::In;
            }
            Node::Unexport => {
                let pin = parse_pin_number(contents)?;
                match state.lines.get_mut(&pin) {
                    Some(line) if line.exported => line.exported = false,
                    _ => return Err(invalid("pin not exported")),
                }
            }
            Node::Direction(pin) => {
                if state.exported(pin).is_none() {
                    return Err(not_found(path));
                }
                let line = state.line(pin);
                match contents.trim() {
                    "in" => line.direction = Direction::In,
                    "out" => line.direction = Direction::Out,
                    "high" => {
                        line.direction = Direction::Out;
                        line.level = Level::High;
                    }
                    "low" => {
                        line.direction = Direction::Out;
                        line.level = Level::Low;
                    }
                    _ => return Err(invalid("bad direction")),
                }
            }
            Node::Value(pin) => {
                let line = match state.exported(pin) {
                    Some(line) => *line,
                    None => return Err(not_found(path)),
                };
                if line.direction == Direction::In {
                    return Err(io::Error::new(
                        io::ErrorKind::PermissionDenied,
                        "operation not permitted",
                    ));
                }
                let level = Level::from_sysfs(contents).ok_or_else(|| invalid("bad value"))?;
                state.line(pin).level = level;
            }
            Node::Root | Node::PinDir(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::IsADirectory,
                    "is a directory",
                ));
            }
        }

        trace!("sim write {} <- {:?}", path.display(), contents);
        state.writes.push((path.to_path_buf(), contents.to_string()));
        Ok(())
    }

    fn node_exists(&self, path: &Path) -> bool {
        let Some(node) = self.resolve(path) else {
            return false;
        };
        let state = self.state.lock();
        match node {
            Node::Root | Node::Export | Node::Unexport => true,
            Node::PinDir(pin) | Node::Direction(pin) | Node::Value(pin) => {
                state.exported(pin).is_some()
            }
        }
    }
}

impl PinFs for SimulatedSysfs {
    async fn read(&self, path: &Path) -> io::Result<String> {
        // Real attribute I/O suspends; keep interleavings realistic.
        tokio::task::yield_now().await;
        self.read_node(path)
    }

    async fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        tokio::task::yield_now().await;
        self.write_node(path, contents)
    }

    async fn exists(&self, path: &Path) -> bool {
        self.node_exists(path)
    }
}

fn parse_pin_dir(name: &str) -> Option<u32> {
    name.strip_prefix(PIN_DIR_PREFIX)?.parse().ok()
}

fn parse_pin_number(contents: &str) -> io::Result<u32> {
    contents
        .trim()
        .parse()
        .map_err(|_| invalid("invalid pin number"))
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file", path.display()),
    )
}

fn invalid(msg: &'static str) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidInput, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(sim: &SimulatedSysfs, rel: &str) -> PathBuf {
        sim.root().join(rel)
    }

    #[tokio::test]
    async fn export_creates_pin_directory() {
        let sim = SimulatedSysfs::default();
        assert!(!sim.exists(&path(&sim, "gpio4/direction")).await);

        sim.write(&path(&sim, "export"), "4").await.unwrap();
        assert!(sim.exists(&path(&sim, "gpio4")).await);
        assert_eq!(sim.read(&path(&sim, "gpio4/direction")).await.unwrap(), "in\n");

        let err = sim.write(&path(&sim, "export"), "4").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ResourceBusy);
    }

    #[tokio::test]
    async fn unexport_removes_pin_directory() {
        let sim = SimulatedSysfs::default();
        sim.write(&path(&sim, "export"), "4").await.unwrap();
        sim.write(&path(&sim, "unexport"), "4").await.unwrap();
        assert!(!sim.is_exported(4));

        let err = sim.write(&path(&sim, "unexport"), "4").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }

    #[tokio::test]
    async fn value_write_rejected_on_input() {
        let sim = SimulatedSysfs::default();
        sim.write(&path(&sim, "export"), "17").await.unwrap();
        let err = sim.write(&path(&sim, "gpio17/value"), "1").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        sim.write(&path(&sim, "gpio17/direction"), "out").await.unwrap();
        sim.write(&path(&sim, "gpio17/value"), "1").await.unwrap();
        assert_eq!(sim.level(17), Some(Level::High));
    }

    #[tokio::test]
    async fn wired_input_follows_driver() {
        let sim = SimulatedSysfs::default();
        sim.wire(4, 17);
        sim.pre_export(4, Direction::Out);
        sim.pre_export(17, Direction::In);

        sim.write(&path(&sim, "gpio4/value"), "1").await.unwrap();
        assert_eq!(sim.read(&path(&sim, "gpio17/value")).await.unwrap(), "1\n");
    }

    #[tokio::test]
    async fn injected_faults() {
        let sim = SimulatedSysfs::default();
        sim.deny_export(3);
        let err = sim.write(&path(&sim, "export"), "3").await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        sim.pre_export(5, Direction::In);
        sim.fail_reads(5, 1);
        assert!(sim.read(&path(&sim, "gpio5/value")).await.is_err());
        assert!(sim.read(&path(&sim, "gpio5/value")).await.is_ok());
    }

    #[tokio::test]
    async fn paths_outside_root_are_missing() {
        let sim = SimulatedSysfs::new("/tmp/gpio");
        let err = sim
            .read(Path::new("/sys/class/gpio/gpio4/value"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!sim.exists(Path::new("/tmp/gpio/gpio4/edge")).await);
    }
}
