use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::error::BridgeError;
use crate::traits::RenderUnit;

/// Opaque token identifying one not-yet-claimed processing unit.
///
/// Handles are minted from a process-wide counter and never reused, so a
/// stale handle stays invalid forever instead of aliasing a later unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessorHandle(u64);

impl ProcessorHandle {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

fn mint_handle() -> ProcessorHandle {
    ProcessorHandle(NEXT_HANDLE.fetch_add(1, Ordering::Relaxed))
}

/// Holds constructed processing units between registration on the control
/// thread and the one-shot claim from the real-time thread's setup path.
///
/// `claim` removes the unit from the map, so ownership moves to the caller
/// and a second claim on the same handle finds nothing. The lock guards
/// only the map during the handshake; no render-path code ever takes it.
pub struct ProcessorRegistry {
    units: FxHashMap<u64, Box<dyn RenderUnit>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            units: FxHashMap::default(),
        }
    }

    /// Takes ownership of a freshly constructed unit and returns a fresh
    /// unique handle for it. Called only off the real-time thread.
    pub fn register(&mut self, unit: Box<dyn RenderUnit>) -> ProcessorHandle {
        let handle = mint_handle();
        self.units.insert(handle.raw(), unit);
        handle
    }

    /// Removes and returns the unit for `handle`, transferring ownership to
    /// the caller. Fails with `UnknownHandle` if the handle was never
    /// registered or was already claimed; nothing is mutated on failure.
    pub fn claim(&mut self, handle: ProcessorHandle) -> Result<Box<dyn RenderUnit>, BridgeError> {
        self.units
            .remove(&handle.raw())
            .ok_or(BridgeError::UnknownHandle(handle.raw()))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl Default for ProcessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static REGISTRY: Lazy<Mutex<ProcessorRegistry>> =
    Lazy::new(|| Mutex::new(ProcessorRegistry::new()));

/// Registers `unit` with the process-wide registry used by the worklet glue.
pub fn register(unit: Box<dyn RenderUnit>) -> ProcessorHandle {
    REGISTRY
        .lock()
        .expect("processor registry poisoned")
        .register(unit)
}

/// Claims a unit from the process-wide registry. Called exactly once per
/// handle, from the bridge's setup path.
pub fn claim(handle: ProcessorHandle) -> Result<Box<dyn RenderUnit>, BridgeError> {
    REGISTRY
        .lock()
        .expect("processor registry poisoned")
        .claim(handle)
}
