//! ControlSurface - kernel control node abstraction
//!
//! A single writable node that toggles a display mode. Written with ASCII
//! `"0"` or `"1"` and nothing else.

use std::io;

/// Writable control node
pub trait ControlSurface: Send + Sync {
    /// Node description (used for logging)
    fn describe(&self) -> String;

    /// Write `value` to the node, replacing its previous content.
    fn write_value(&self, value: &str) -> io::Result<()>;
}
