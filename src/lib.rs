pub mod bridge;
pub mod codec;
pub mod error;
pub mod registry;
pub mod traits;

#[cfg(feature = "native-host")]
pub mod host;

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub mod worklet;

pub use bridge::{InitPayload, RenderBridge, RENDER_QUANTUM_FRAMES};
pub use codec::{InertCodec, TextCodec, Utf8Codec};
pub use error::BridgeError;
pub use registry::{ProcessorHandle, ProcessorRegistry};
pub use traits::RenderUnit;

#[cfg(feature = "native-host")]
pub use host::{AudioHost, HostConfig};

#[cfg(all(feature = "wasm", target_arch = "wasm32"))]
pub use worklet::{prepare_worklet, worklet_audio, worklet_node, WorkletBridge, PROCESSOR_NAME};

#[cfg(test)]
mod tests;
