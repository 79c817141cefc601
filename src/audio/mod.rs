pub mod engine;
pub mod jack;
pub mod manager;
pub mod offline;
pub mod ports;
