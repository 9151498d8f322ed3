// handlers/law - legal content generation

pub mod blog;

pub use blog::generate_blog;
