mod apps;
mod auth;
mod groups;
mod pages;
mod variables;

pub use apps::*;
pub use auth::*;
pub use groups::*;
pub use pages::*;
pub use variables::*;
