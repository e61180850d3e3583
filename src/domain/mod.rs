pub mod job;
pub mod speech;
