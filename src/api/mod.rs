pub mod format;
pub mod params;
pub mod tree;

pub use format::{Deleted, Message, NodeView, UserDetailView};
pub use params::{check_body_id, parse_bool, parse_id, PageParams};
pub use tree::{resolve_depth, TreeBuilder};
