pub mod auth;
pub mod category;
pub mod media;
pub mod non_conformity;
pub mod project;
pub mod shared;
pub mod sprint;
pub mod user;
