pub mod bird;
pub mod pipe;
pub mod rect;
