//! Web Audio glue: registers the render bridge as a named worklet
//! processor and wires the construction handshake across the two threads.
//!
//! The control thread registers a unit, then constructs an
//! `AudioWorkletNode` whose `processorOptions` carry the positional
//! `[module, memory, handle]` payload. Inside the worklet scope the JS shim
//! links the module, constructs a [`WorkletBridge`] from the handle, and
//! forwards every `process` callback to it.

use js_sys::Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    console, AudioContext, AudioWorkletNode, AudioWorkletNodeOptions, Blob, BlobPropertyBag, Url,
};

use crate::bridge::RenderBridge;
use crate::registry::{self, ProcessorHandle};
use crate::traits::RenderUnit;

/// Name the shim registers with `registerProcessor`, and the name
/// `worklet_node` constructs nodes under.
pub const PROCESSOR_NAME: &str = "RenderBridgeProcessor";

fn log_console(message: &str) {
    console::log_1(&message.into());
}

/// The worklet-scope face of the render bridge, constructed by the JS shim
/// once per node after it has linked the module and memory.
#[wasm_bindgen]
pub struct WorkletBridge {
    inner: RenderBridge,
}

#[wasm_bindgen]
impl WorkletBridge {
    /// Claims exclusive ownership of the unit registered under `handle`.
    /// Fails if the handle is unknown or already claimed; the shim lets the
    /// failure escape its constructor, which disables the node.
    pub fn connect(handle: u64) -> Result<WorkletBridge, JsValue> {
        let inner = RenderBridge::from_handle(ProcessorHandle::from_raw(handle))?;
        log_console("render bridge connected");
        Ok(WorkletBridge { inner })
    }

    /// One render quantum. Forwarded unchanged from the shim's `process`;
    /// the return value is the worklet liveness flag.
    pub fn render(&mut self, buffer: &mut [f32]) -> bool {
        self.inner.render(buffer)
    }
}

/// Registers `unit` and creates an `AudioWorkletNode` that will claim it
/// from inside the worklet scope. Call [`prepare_worklet`] on the context
/// first.
pub fn worklet_node(
    ctx: &AudioContext,
    unit: Box<dyn RenderUnit>,
) -> Result<AudioWorkletNode, JsValue> {
    let handle = registry::register(unit);
    let options = AudioWorkletNodeOptions::new();
    // Positional wire format: module, memory, handle. The shim unpacks by
    // index, so order and types must not change.
    options.set_processor_options(Some(&Array::of3(
        &wasm_bindgen::module(),
        &wasm_bindgen::memory(),
        &JsValue::from(handle.raw()),
    )));
    AudioWorkletNode::new_with_options(ctx, PROCESSOR_NAME, &options)
}

/// Loads the processor-registration shim into the context's worklet.
/// Idempotent per context; call once before creating nodes.
pub async fn prepare_worklet(ctx: &AudioContext) -> Result<(), JsValue> {
    let url = shim_module_url()?;
    let result = JsFuture::from(ctx.audio_worklet()?.add_module(&url)?).await;
    Url::revoke_object_url(&url)?;
    result?;
    Ok(())
}

/// Convenience path for hosts with a single unit whose samples feed the
/// destination directly: context, shim, node, connect. Call from a user
/// gesture so playback starts reliably on all browsers.
pub async fn worklet_audio(unit: Box<dyn RenderUnit>) -> Result<AudioContext, JsValue> {
    let ctx = AudioContext::new()?;
    prepare_worklet(&ctx).await?;
    let node = worklet_node(&ctx, unit)?;
    node.connect_with_audio_node(&ctx.destination())?;
    Ok(ctx)
}

#[wasm_bindgen]
extern "C" {
    type ImportMeta;

    #[wasm_bindgen(method, getter)]
    fn url(this: &ImportMeta) -> js_sys::JsString;

    #[wasm_bindgen(thread_local_v2, js_namespace = import, js_name = meta)]
    static IMPORT_META: ImportMeta;
}

// The worklet can only load ES modules by URL, and the shim needs the
// current wasm-bindgen module in scope as `bindgen`. Prepend an import of
// our own module URL and serve the result as a blob URL. Assumes the
// `--target web` ES-module layout.
fn shim_module_url() -> Result<String, JsValue> {
    let header = format!(
        "import init, * as bindgen from '{}';\n\n",
        IMPORT_META.with(ImportMeta::url),
    );
    let parts = Array::of2(
        &JsValue::from(header.as_str()),
        &JsValue::from(include_str!("worklet.js")),
    );
    let properties = BlobPropertyBag::new();
    properties.set_type("text/javascript");
    Url::create_object_url_with_blob(&Blob::new_with_str_sequence_and_options(
        &parts,
        &properties,
    )?)
}
