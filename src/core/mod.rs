pub mod correction;
pub mod media;
