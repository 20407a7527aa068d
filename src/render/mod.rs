pub mod backend;
pub mod clip;
pub mod cpu;
#[cfg(feature = "gpu")]
pub mod gpu;
pub mod placement;
pub mod renderer;
