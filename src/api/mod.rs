pub mod correction;
pub mod models;
