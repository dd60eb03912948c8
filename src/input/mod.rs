//! Loading of pre-parsed resumes and job descriptions

pub mod file_detector;
pub mod manager;

pub use manager::InputManager;
