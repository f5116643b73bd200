pub mod config;
pub mod models;
pub mod toast;

pub use config::*;
pub use models::*;
pub use toast::*;
