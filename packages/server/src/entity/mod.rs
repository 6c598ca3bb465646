pub mod category;
pub mod media;
pub mod non_conformity;
pub mod non_conformity_media;
pub mod project;
pub mod project_user;
pub mod sprint;
pub mod user;
