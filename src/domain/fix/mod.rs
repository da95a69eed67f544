// FIX wire model shared by the codec and the transport ports
pub mod message;
pub mod tags;

pub use message::{FieldMap, FixMessage};
