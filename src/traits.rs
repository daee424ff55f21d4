/// Contract for the opaque sample-computing unit owned by a render bridge.
///
/// `render` writes one render quantum into `output` in place and returns a
/// liveness flag: `true` to keep receiving callbacks, `false` once the unit
/// has finished producing output and the node may be retired.
///
/// Implementations run on the real-time audio thread: they must complete in
/// time proportional to the buffer length and must not allocate, block, or
/// perform I/O.
pub trait RenderUnit: Send + 'static {
    fn render(&mut self, output: &mut [f32]) -> bool;
}

impl<F> RenderUnit for F
where
    F: FnMut(&mut [f32]) -> bool + Send + 'static,
{
    fn render(&mut self, output: &mut [f32]) -> bool {
        self(output)
    }
}
