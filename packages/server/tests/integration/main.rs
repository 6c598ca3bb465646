mod auth;
mod media;
mod non_conformity;
mod project;
