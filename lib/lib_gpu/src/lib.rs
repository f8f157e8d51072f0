pub use wgpu::*;
pub use wgpu::util::{BufferInitDescriptor, DeviceExt};

mod constant_buffer;
mod depth;
pub use constant_buffer::*;
pub use depth::*;
