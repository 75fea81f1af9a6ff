pub mod debug;
pub mod device;
pub mod editor;
pub mod health;
pub mod projects;
