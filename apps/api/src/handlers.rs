pub mod health;
pub mod me;
pub mod patients;
pub mod security;
