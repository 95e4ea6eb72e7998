//! Display enumeration and repositioning via the RandR extension

use anyhow::{Context, Result};
use tracing::debug;
use x11rb::connection::Connection;
use x11rb::protocol::randr::{ConnectionExt as RandrExt, Crtc, SetConfig};
use x11rb::protocol::xproto::{ConnectionExt as XprotoExt, Window};
use x11rb::rust_connection::RustConnection;

use crate::constants::display::MAX_DISPLAYS;
use crate::types::DisplayInfo;

/// Connect to the display server and return the connection plus root window
pub fn connect() -> Result<(RustConnection, Window)> {
    let (conn, screen_num) =
        x11rb::connect(None).context("Failed to connect to display server")?;
    let root = conn.setup().roots[screen_num].root;
    let version = conn
        .randr_query_version(1, 3)
        .context("Failed to query RandR version")?
        .reply()
        .context("RandR extension unavailable")?;
    debug!(
        screen = screen_num,
        major = version.major_version,
        minor = version.minor_version,
        "Connected to display server"
    );
    Ok((conn, root))
}

/// Query the live display list: one entry per enabled CRTC, capped at
/// `MAX_DISPLAYS`. Read-only.
pub fn current_displays(conn: &RustConnection, root: Window) -> Result<Vec<DisplayInfo>> {
    let resources = conn
        .randr_get_screen_resources_current(root)
        .context("Failed to query screen resources")?
        .reply()
        .context("Failed to get reply for screen resources query")?;

    let mut displays = Vec::new();
    for &crtc in &resources.crtcs {
        if displays.len() == MAX_DISPLAYS {
            break;
        }
        let info = conn
            .randr_get_crtc_info(crtc, resources.config_timestamp)
            .with_context(|| format!("Failed to query CRTC {crtc}"))?
            .reply()
            .with_context(|| format!("Failed to get reply for CRTC {crtc} query"))?;
        // A CRTC with no active mode is a disabled output, not a display
        if info.mode == 0 {
            continue;
        }
        displays.push(DisplayInfo::new(
            crtc,
            info.width.into(),
            info.height.into(),
            info.x.into(),
            info.y.into(),
        ));
    }
    debug!(count = displays.len(), "Enumerated active displays");
    Ok(displays)
}

/// An atomic batch of display origin moves.
///
/// The server stays grabbed from `begin` until `commit`, so no other client
/// observes a half-applied arrangement. Moves are staged in memory and only
/// issued during `commit`; dropping an uncommitted transaction releases the
/// grab without issuing anything.
pub struct DisplayTransaction<'a> {
    conn: &'a RustConnection,
    root: Window,
    moves: Vec<(Crtc, i32, i32)>,
    finished: bool,
}

impl<'a> DisplayTransaction<'a> {
    pub fn begin(conn: &'a RustConnection, root: Window) -> Result<Self> {
        conn.grab_server()
            .context("Failed to send server grab")?
            .check()
            .context("Failed to grab server")?;
        Ok(Self {
            conn,
            root,
            moves: Vec::new(),
            finished: false,
        })
    }

    /// Stage a move of `crtc`'s origin to (x, y); nothing is issued until commit
    pub fn set_origin(&mut self, crtc: Crtc, x: i32, y: i32) {
        self.moves.push((crtc, x, y));
    }

    /// Issue all staged moves, then release the grab.
    /// Fails if the server rejects any move; the change persists for the
    /// session (the server applies it immediately, not at next restart).
    pub fn commit(mut self) -> Result<()> {
        let result = self.issue_moves();
        self.finished = true;
        let _ = self.conn.ungrab_server();
        let flushed = self.conn.flush().context("Failed to flush display connection");
        result.and(flushed)
    }

    fn issue_moves(&self) -> Result<()> {
        let resources = self
            .conn
            .randr_get_screen_resources_current(self.root)
            .context("Failed to query screen resources")?
            .reply()
            .context("Failed to get reply for screen resources query")?;

        for &(crtc, x, y) in &self.moves {
            // RandR expresses origins as 16-bit coordinates
            let x = i16::try_from(x)
                .with_context(|| format!("Origin x={x} out of range for CRTC {crtc}"))?;
            let y = i16::try_from(y)
                .with_context(|| format!("Origin y={y} out of range for CRTC {crtc}"))?;

            let info = self
                .conn
                .randr_get_crtc_info(crtc, resources.config_timestamp)
                .with_context(|| format!("Failed to query CRTC {crtc}"))?
                .reply()
                .with_context(|| format!("Failed to get reply for CRTC {crtc} query"))?;

            debug!(crtc = crtc, x = x, y = y, "Requesting origin move");
            let reply = self
                .conn
                .randr_set_crtc_config(
                    crtc,
                    info.timestamp,
                    resources.config_timestamp,
                    x,
                    y,
                    info.mode,
                    info.rotation,
                    &info.outputs,
                )
                .with_context(|| format!("Failed to send configuration for CRTC {crtc}"))?
                .reply()
                .with_context(|| format!("Failed to get configuration reply for CRTC {crtc}"))?;

            if reply.status != SetConfig::SUCCESS {
                anyhow::bail!(
                    "Display server rejected move of CRTC {} (status {:?})",
                    crtc,
                    reply.status
                );
            }
        }
        Ok(())
    }
}

impl Drop for DisplayTransaction<'_> {
    fn drop(&mut self) {
        if !self.finished {
            let _ = self.conn.ungrab_server();
            let _ = self.conn.flush();
        }
    }
}
