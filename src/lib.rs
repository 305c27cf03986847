pub mod aggregate;
pub mod dataset;
pub mod export;
pub mod state;
