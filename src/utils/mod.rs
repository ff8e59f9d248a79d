//! Utility modules for unillm

pub mod cancel;
pub mod mime;

pub use cancel::CancelHandle;
pub use mime::guess_mime;
