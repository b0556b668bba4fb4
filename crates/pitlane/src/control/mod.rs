mod driver;
mod pid;
mod simple;

pub use driver::{Driver, IdleDriver, WithAngles, default_angles};
pub use pid::Pid;
pub use simple::{DriverConfig, SimpleDriver};
