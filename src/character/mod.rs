//! Character assembly: one skinned body, any number of clothing slots bound
//! to its skeleton, and the mixer that animates them together.

pub mod assembler;
pub mod body;
pub mod slot;

pub use assembler::{Character, CharacterAssembler};
pub use body::{BodyRig, load_body};
pub use slot::load_slot;
