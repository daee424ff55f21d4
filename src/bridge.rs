use crate::error::BridgeError;
use crate::registry::{self, ProcessorHandle};
use crate::traits::RenderUnit;

/// Frames per render callback on Web Audio hosts.
pub const RENDER_QUANTUM_FRAMES: usize = 128;

/// The construction handshake message: the compiled module, its shared
/// memory, and the handle of the unit to claim. Transmitted from the
/// control thread to the real-time thread's setup routine and consumed
/// exactly once.
///
/// Generic over the module and memory reference types: the worklet glue
/// instantiates it with `JsValue`s, the native host with `()`.
pub struct InitPayload<M, S> {
    pub module: M,
    pub memory: S,
    pub handle: ProcessorHandle,
}

/// Owns one processing unit for the lifetime of an audio-graph node and
/// feeds it the host's output buffer once per render quantum.
///
/// A bridge is either fully constructed or not constructed at all: the
/// constructors return `Err` without claiming anything on link failure, so
/// there is no partial state to tear down.
pub struct RenderBridge {
    unit: Box<dyn RenderUnit>,
    quantum_frames: usize,
    live: bool,
}

impl std::fmt::Debug for RenderBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderBridge")
            .field("quantum_frames", &self.quantum_frames)
            .field("live", &self.live)
            .finish_non_exhaustive()
    }
}

impl RenderBridge {
    /// Consumes an `InitPayload`: links the module and memory into the
    /// current execution context via `link`, then claims exclusive
    /// ownership of the unit. Link failure leaves the handle unclaimed.
    pub fn construct<M, S, L>(payload: InitPayload<M, S>, link: L) -> Result<Self, BridgeError>
    where
        L: FnOnce(&M, &S) -> Result<(), BridgeError>,
    {
        Self::construct_with_quantum(payload, link, RENDER_QUANTUM_FRAMES)
    }

    /// `construct` with a host-determined quantum size instead of the Web
    /// Audio default.
    pub fn construct_with_quantum<M, S, L>(
        payload: InitPayload<M, S>,
        link: L,
        quantum_frames: usize,
    ) -> Result<Self, BridgeError>
    where
        L: FnOnce(&M, &S) -> Result<(), BridgeError>,
    {
        link(&payload.module, &payload.memory)?;
        Self::from_handle_with_quantum(payload.handle, quantum_frames)
    }

    /// Claims `handle` directly. Used where the execution context has
    /// already linked the module before any crate code can run (the worklet
    /// shim calls `initSync` before constructing the bridge).
    pub fn from_handle(handle: ProcessorHandle) -> Result<Self, BridgeError> {
        Self::from_handle_with_quantum(handle, RENDER_QUANTUM_FRAMES)
    }

    pub fn from_handle_with_quantum(
        handle: ProcessorHandle,
        quantum_frames: usize,
    ) -> Result<Self, BridgeError> {
        let unit = registry::claim(handle)?;
        let quantum_frames = if quantum_frames == 0 {
            RENDER_QUANTUM_FRAMES
        } else {
            quantum_frames
        };
        Ok(Self {
            unit,
            quantum_frames,
            live: true,
        })
    }

    pub fn quantum_frames(&self) -> usize {
        self.quantum_frames
    }

    /// Whether the unit still wants future callbacks.
    pub fn is_live(&self) -> bool {
        self.live
    }

    /// Renders one quantum into `buffer` in place and returns the liveness
    /// flag the host uses to keep or retire the node.
    ///
    /// Runs on the real-time thread: one pass over the buffer, no
    /// allocation, no locking. A buffer of unexpected length is a host
    /// contract violation; the quantum is skipped (logged, unit untouched)
    /// rather than computed out of bounds, and the call still returns
    /// normally. Once the unit has reported completion the bridge keeps
    /// writing silence until the host gets around to dropping it.
    pub fn render(&mut self, buffer: &mut [f32]) -> bool {
        if let Err(err) = self.check_buffer(buffer) {
            log::warn!("{err}; skipping quantum");
            return self.live;
        }
        if !self.live {
            buffer.fill(0.0);
            return false;
        }
        self.live = self.unit.render(buffer);
        self.live
    }

    fn check_buffer(&self, buffer: &[f32]) -> Result<(), BridgeError> {
        if buffer.len() == self.quantum_frames {
            Ok(())
        } else {
            Err(BridgeError::MalformedBuffer {
                expected: self.quantum_frames,
                got: buffer.len(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn register_ramp() -> ProcessorHandle {
        let mut next = 0.0f32;
        registry::register(Box::new(move |output: &mut [f32]| {
            for sample in output.iter_mut() {
                *sample = next;
                next += 1.0;
            }
            true
        }))
    }

    fn counted_unit(calls: Arc<AtomicUsize>) -> Box<dyn RenderUnit> {
        Box::new(move |output: &mut [f32]| {
            calls.fetch_add(1, Ordering::SeqCst);
            output.fill(1.0);
            true
        })
    }

    #[test]
    fn render_is_deterministic_on_fresh_units() {
        let mut first = RenderBridge::from_handle(register_ramp()).unwrap();
        let mut second = RenderBridge::from_handle(register_ramp()).unwrap();

        let mut a = [0.0f32; RENDER_QUANTUM_FRAMES];
        let mut b = [0.0f32; RENDER_QUANTUM_FRAMES];
        assert!(first.render(&mut a));
        assert!(second.render(&mut b));
        assert_eq!(a, b);
        assert_eq!(a[0], 0.0);
        assert_eq!(a[127], 127.0);
    }

    #[test]
    fn malformed_buffer_skips_the_quantum() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = registry::register(counted_unit(calls.clone()));
        let mut bridge = RenderBridge::from_handle(handle).unwrap();

        let mut empty: [f32; 0] = [];
        assert!(bridge.render(&mut empty));

        let mut short = [0.25f32; 64];
        assert!(bridge.render(&mut short));
        assert!(short.iter().all(|&s| s == 0.25), "skipped quantum must not be written");

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(bridge.is_live());
    }

    #[test]
    fn quantum_override_changes_the_expected_shape() {
        let calls = Arc::new(AtomicUsize::new(0));
        let handle = registry::register(counted_unit(calls.clone()));
        let mut bridge = RenderBridge::from_handle_with_quantum(handle, 64).unwrap();
        assert_eq!(bridge.quantum_frames(), 64);

        let mut web_audio_sized = [0.0f32; RENDER_QUANTUM_FRAMES];
        assert!(bridge.render(&mut web_audio_sized));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let mut block = [0.0f32; 64];
        assert!(bridge.render(&mut block));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(block.iter().all(|&s| s == 1.0));
    }

    #[test]
    fn zero_quantum_request_falls_back_to_default() {
        let handle = registry::register(Box::new(|_: &mut [f32]| true));
        let bridge = RenderBridge::from_handle_with_quantum(handle, 0).unwrap();
        assert_eq!(bridge.quantum_frames(), RENDER_QUANTUM_FRAMES);
    }

    #[test]
    fn retired_unit_latches_and_renders_silence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_unit = calls.clone();
        let handle = registry::register(Box::new(move |output: &mut [f32]| {
            calls_in_unit.fetch_add(1, Ordering::SeqCst);
            output.fill(1.0);
            false
        }));
        let mut bridge = RenderBridge::from_handle(handle).unwrap();

        let mut buffer = [0.0f32; RENDER_QUANTUM_FRAMES];
        assert!(!bridge.render(&mut buffer));
        assert!(buffer.iter().all(|&s| s == 1.0));

        assert!(!bridge.render(&mut buffer));
        assert!(buffer.iter().all(|&s| s == 0.0));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "retired unit must not run again");
        assert!(!bridge.is_live());
    }
}
