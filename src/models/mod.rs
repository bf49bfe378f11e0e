pub mod pokemon;
pub mod refs;
pub mod user;
