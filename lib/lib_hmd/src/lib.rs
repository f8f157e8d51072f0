//! Boundary to a head-mounted display runtime.
//!
//! The types here mirror what a vendor VR runtime hands back and accepts:
//! per-eye field-of-view ports and render descriptors, tracked poses,
//! row-major projection matrices, texture swap chains and the layer
//! descriptor submitted once per frame. Renderers talk to a runtime through
//! [`HmdSession`]; [`SimulatedHmd`] is an in-process runtime used when no
//! headset is attached and in tests.

mod error;
mod eye;
mod fov;
mod layer;
mod pose;
mod session;
pub mod simulated;
mod swap_chain;

pub use error::HmdError;
pub use eye::{EYE_COUNT, Eye};
pub use fov::FovPort;
pub use layer::{LayerEyeFovDepth, Recti, Sizei, TimewarpProjectionDesc};
pub use pose::{Matrix4f, Posef, Quatf, Vector3f};
pub use session::{EyePoses, EyeRenderDesc, HmdDesc, HmdSession, SessionStatus};
pub use simulated::{SimulatedHmd, SimulatedHmdConfig};
pub use swap_chain::{SwapChainDesc, SwapChainFormat, SwapChainId, TextureSwapChain};
