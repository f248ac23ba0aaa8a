pub mod manager;
pub mod models;
pub mod nodes;
pub mod tokens;
pub mod users;

pub use manager::{DatabaseError, DatabaseManager};
pub use nodes::NodeRepository;
pub use tokens::TokenRepository;
pub use users::UserRepository;
