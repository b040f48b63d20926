pub mod direction;
pub mod grid;
pub mod layout;
pub mod position;
pub mod state;
