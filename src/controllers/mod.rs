pub mod audio;
pub mod health;
pub mod jobs;
pub mod voices;
