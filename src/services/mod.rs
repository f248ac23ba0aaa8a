pub mod node_service;
pub mod user_service;

pub use node_service::{NodePayload, NodeService};
pub use user_service::UserService;
