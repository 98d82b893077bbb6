//! Client-side checkout state held as explicit values with pure transitions.

mod cart_state;

pub use cart_state::{CartAction, CartState};
