use serde::{Deserialize, Serialize};

/// One display's identity and geometry as reported by the display server.
/// Field names are the on-disk JSON keys.
///
/// Ids are assigned by the server per session and do not survive restarts
/// or physical reconnects, which is why applying a layout falls back to
/// geometry matching when an id no longer resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: u32,
    pub width: i32,
    pub height: i32,
    pub x: i32,
    pub y: i32,
}

impl DisplayInfo {
    pub fn new(id: u32, width: i32, height: i32, x: i32, y: i32) -> Self {
        Self {
            id,
            width,
            height,
            x,
            y,
        }
    }
}
