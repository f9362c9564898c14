pub mod generator;
pub mod openai;
pub mod tokens;
pub mod transcriber;

pub mod prompts {
    pub const BLOG_SYSTEM: &str = include_str!("./prompts/blog_system.txt");
    pub const SOCIAL_SYSTEM: &str = include_str!("./prompts/social_system.txt");
    pub const IDEAS_SYSTEM: &str = include_str!("./prompts/ideas_system.txt");
}
