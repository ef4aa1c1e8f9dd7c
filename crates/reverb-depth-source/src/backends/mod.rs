pub mod image;
pub mod mock;
