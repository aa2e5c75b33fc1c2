//! Game rules.
//!
//! Pure functions over [`Board`](crate::Board). Rules are kept apart from
//! board storage so the engine can compose them into [`crate::evaluate`].

pub mod draw;
pub mod win;

pub use draw::is_full;
pub use win::{check_winner, LINES};
