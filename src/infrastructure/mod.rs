pub mod fix;
pub mod paper;

pub use paper::PaperVenue;
