use thiserror::Error;

/// Errors produced by the bridge and its collaborators.
///
/// Construction-time errors (`UnknownHandle`, `LinkFailure`) abort bridge
/// setup and surface to the host synchronously. `MalformedBuffer` is never
/// propagated across the render callback boundary; the bridge absorbs it as
/// a skipped quantum and logs it instead.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Claim on a handle that was never registered or was already claimed.
    #[error("unknown or already claimed processor handle {0}")]
    UnknownHandle(u64),

    /// The compiled module or its memory could not be attached to the
    /// current execution context.
    #[error("failed to link module into the execution context: {0}")]
    LinkFailure(String),

    /// The host invoked `render` with a buffer of unexpected shape.
    #[error("malformed render buffer: expected {expected} frames, got {got}")]
    MalformedBuffer { expected: usize, got: usize },

    /// An inert environment stand-in was invoked with real data. Signals a
    /// caller exercising a path the execution context cannot support.
    #[error("inert {0} invoked with non-empty input")]
    StubInvoked(&'static str),
}

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
impl From<BridgeError> for wasm_bindgen::JsValue {
    fn from(err: BridgeError) -> Self {
        wasm_bindgen::JsValue::from_str(&err.to_string())
    }
}
