pub mod node;
pub mod user;

pub use node::{Node, NodeAtLevel};
pub use user::{Role, UnknownRole, User};
