// handlers/public/mod.rs - Public handlers (no authentication)
//
// Route prefix: / and /api/token/*

pub mod root;
pub mod token;

pub use root::{health, root};
