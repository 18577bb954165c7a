pub mod access;
pub mod companies;
pub mod health;
pub mod invites;
