// Core trading domain entities and value objects
pub mod account;
pub mod commission;
pub mod order;
pub mod position;
pub mod types;
