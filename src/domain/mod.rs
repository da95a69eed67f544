// FIX wire model
pub mod fix;

// Port interfaces
pub mod ports;

// Core trading domain
pub mod trading;

// Domain-specific error types
pub mod errors;
