pub mod cli;
pub mod desk;

pub use desk::{OpenCaseRequest, SessionDesk};
