pub mod booking;
pub mod credentials;
pub mod health;
