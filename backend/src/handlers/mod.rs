pub mod devices;
pub mod health;
pub mod portal;
pub mod rules;
pub mod sessions;
pub mod settings;
pub mod users;
