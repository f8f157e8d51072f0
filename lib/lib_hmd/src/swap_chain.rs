use std::fmt::Debug;

use crate::HmdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SwapChainId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapChainFormat {
    Rgba8UnormSrgb,
    Depth32Float,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapChainDesc {
    pub format: SwapChainFormat,
    pub width: u32,
    pub height: u32,
    pub sample_count: u32,
}

/// A ring of textures owned by the runtime. The application renders into
/// the buffer at [`current_index`](Self::current_index), then commits it.
///
/// Implementations release the runtime-side resources when dropped, so a
/// swap chain lives exactly as long as its handle.
pub trait TextureSwapChain: Debug {
    fn id(&self) -> SwapChainId;

    fn desc(&self) -> &SwapChainDesc;

    /// Number of buffers in the ring.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn current_index(&self) -> usize;

    /// Hands the current buffer to the runtime and advances to the next one.
    fn commit(&mut self) -> Result<(), HmdError>;
}
