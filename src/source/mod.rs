pub mod frame;
pub mod simulate;

pub use frame::{Algorithm, Frame, PixelFormat};
pub use simulate::{run_source, Pattern, SimulatedSource};
