//! Layer dissector
//!
//! Turns the raw bytes of one captured frame into an ordered list of
//! recognized protocol layers. The dissector holds no state between calls: the
//! live capture path and the detail queries both call [`decode`] on their own.
//!
//! Components:
//! - `layers`: the closed [`Layer`] variant set and its per-layer fields.
//! - `decoder`: the Ethernet → IPv4 → TCP/UDP decode chain.

pub mod decoder;
pub mod layers;

pub use decoder::decode;
pub use layers::{Layer, LayerSummary};
