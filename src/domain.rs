//! Domain types
//!
//! - Arbitrary-size message sequence indices
//! - Messages and the wire shapes of the paged fetch endpoints

pub mod message;
pub mod sequence_index;
