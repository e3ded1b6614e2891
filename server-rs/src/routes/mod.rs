pub mod admin_reviews;
pub mod auth;
pub mod bookings;
pub mod enquiries;
pub mod field_slots;
pub mod fields;
pub mod health;
pub mod reviews;
pub mod settings;
pub mod team_players;
pub mod teams;
pub mod users;
