pub mod clear;
pub mod count;
pub mod list;
pub mod read;
pub mod watch;
