//! Pixel filters over owned RGBA buffers.
//!
//! | Filter | Function | Parameters |
//! |---|---|---|
//! | Brightness | [`brightness`] | amount `-100..=100` |
//! | Contrast | [`contrast`] | amount `-100..=100` |
//! | Saturation | [`saturation`] | amount `-100..=100` |
//! | Vintage | [`vintage`] | intensity `0..=100`, warmth `-100..=100` |
//! | Box blur | [`box_blur`] | radius (floored, minimum 1) |
//! | Intensity blend | [`blend`] | `0.0..=1.0` |
//!
//! Every function is pure: it borrows its input and allocates a fresh
//! output of the same dimensions.

mod adjust;
mod blend;
mod blur;
mod buffer;
mod vintage;

pub use adjust::{brightness, contrast, contrast_factor, saturation};
pub use blend::blend;
pub use blur::{blur_size, box_blur};
pub use buffer::{CHANNELS, PixelBuffer, PixelError};
pub use vintage::vintage;
