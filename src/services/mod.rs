pub mod booking;
pub mod integrations;
