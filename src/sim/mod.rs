pub mod driver;
pub mod event;
pub mod save;
pub mod session;
pub mod step;
