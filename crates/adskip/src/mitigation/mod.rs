pub mod overlay;
pub mod swap;

pub use overlay::{OverlayMitigator, OverlayOutcome, skip_amount, skip_target};
pub use swap::{SourceSwapController, swap_source};
