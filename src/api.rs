pub mod buildings;
pub mod errors;
pub mod extract;
pub mod health;
pub mod locations;
pub mod requests;
pub mod users;
pub mod views;
