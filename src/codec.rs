//! Text codec seam for execution contexts without text-encoding support.
//!
//! Worklet scopes historically ship without `TextDecoder`/`TextEncoder`.
//! Nothing on the render path ever transcodes text, so those contexts get
//! an inert codec that succeeds on trivial input and fails loudly on
//! anything real, instead of silently corrupting data.

use crate::error::BridgeError;

pub trait TextCodec {
    fn decode(&self, bytes: &[u8]) -> Result<String, BridgeError>;
    fn encode(&self, text: &str) -> Result<Vec<u8>, BridgeError>;
}

/// The real codec, used wherever the context supports text encoding.
pub struct Utf8Codec;

impl TextCodec for Utf8Codec {
    fn decode(&self, bytes: &[u8]) -> Result<String, BridgeError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>, BridgeError> {
        Ok(text.as_bytes().to_vec())
    }
}

/// Capability-absence stand-in. Empty input succeeds with an empty result;
/// any non-trivial input means some caller is exercising a path the
/// context cannot support, and fails with `StubInvoked`.
pub struct InertCodec;

impl TextCodec for InertCodec {
    fn decode(&self, bytes: &[u8]) -> Result<String, BridgeError> {
        if bytes.is_empty() {
            Ok(String::new())
        } else {
            Err(BridgeError::StubInvoked("text decoder"))
        }
    }

    fn encode(&self, text: &str) -> Result<Vec<u8>, BridgeError> {
        if text.is_empty() {
            Ok(Vec::new())
        } else {
            Err(BridgeError::StubInvoked("text encoder"))
        }
    }
}

/// Selects the codec for the current execution context, probing the global
/// scope for a `TextDecoder` constructor on wasm targets.
#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub fn detect() -> &'static dyn TextCodec {
    let global = js_sys::global();
    match js_sys::Reflect::has(&global, &wasm_bindgen::JsValue::from_str("TextDecoder")) {
        Ok(true) => &Utf8Codec,
        _ => &InertCodec,
    }
}

/// Native contexts always have real text encoding.
#[cfg(not(all(feature = "wasm", target_arch = "wasm32")))]
pub fn detect() -> &'static dyn TextCodec {
    &Utf8Codec
}
