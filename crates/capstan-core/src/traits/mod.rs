//! Port traits — the seams between the scheduler/processor and the
//! concrete platform client.

pub mod clock;
pub mod platform;

pub use clock::{Clock, SystemClock};
pub use platform::{CapturePort, PlatformPort};
