//! State shared between the BLE event handlers and the main loop.
//!
//! The handlers run in the connection task, the loop reads the flags every
//! iteration. Both are plain atomics: a flag flipped right after the loop read
//! it is picked up on the next iteration.

use core::sync::atomic::{AtomicBool, Ordering};

pub struct LinkState {
    connected: AtomicBool,
    trigger: AtomicBool,
}

impl LinkState {
    pub const fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
            trigger: AtomicBool::new(false),
        }
    }

    pub fn on_connect(&self) {
        self.connected.store(true, Ordering::Release);
        log::info!("BLE client connected");
    }

    /// Called before the advertising loop goes round again.
    pub fn on_disconnect(&self) {
        self.connected.store(false, Ordering::Release);
        log::info!("BLE client disconnected, restarting advertising");
    }

    /// Record a write to the command characteristic. Returns whether it
    /// counted as a trigger; the payload itself is never interpreted.
    pub fn on_command(&self, payload: &[u8]) -> bool {
        if payload.is_empty() {
            return false;
        }

        log::info!("Command received: {}", PayloadDisplay(payload));
        self.trigger.store(true, Ordering::Release);
        true
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    #[cfg(test)]
    pub fn is_triggered(&self) -> bool {
        self.trigger.load(Ordering::Acquire)
    }

    /// Consume the pending trigger. Any number of writes since the last call
    /// yield a single `true`.
    pub fn take_trigger(&self) -> bool {
        self.trigger.swap(false, Ordering::AcqRel)
    }
}

impl Default for LinkState {
    fn default() -> Self {
        Self::new()
    }
}

/// Prints printable ASCII as-is and everything else as `\xNN`.
struct PayloadDisplay<'a>(&'a [u8]);

impl core::fmt::Display for PayloadDisplay<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        for &byte in self.0 {
            if (0x20..=0x7E).contains(&byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "\\x{:02x}", byte)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    #[test]
    fn starts_disconnected_and_idle() {
        let link = LinkState::new();
        assert!(!link.is_connected());
        assert!(!link.is_triggered());
        assert!(!link.take_trigger());
    }

    #[test]
    fn connect_and_disconnect_toggle_state() {
        let link = LinkState::new();
        link.on_connect();
        assert!(link.is_connected());
        link.on_disconnect();
        assert!(!link.is_connected());
    }

    #[test]
    fn reconnect_cycles_keep_pending_trigger() {
        let link = LinkState::new();
        link.on_command(b"1");
        for _ in 0..3 {
            link.on_connect();
            assert!(link.is_connected());
            link.on_disconnect();
            assert!(!link.is_connected());
        }
        assert!(link.take_trigger());
    }

    #[test]
    fn empty_write_is_ignored() {
        let link = LinkState::new();
        assert!(!link.on_command(&[]));
        assert!(!link.is_triggered());
    }

    #[test]
    fn writes_coalesce_into_one_trigger() {
        let link = LinkState::new();
        assert!(link.on_command(b"1"));
        assert!(link.on_command(b"read"));
        assert!(link.on_command(&[0x00]));
        assert!(link.take_trigger());
        assert!(!link.take_trigger());
        assert!(!link.is_triggered());
    }

    #[test]
    fn commands_do_not_touch_connection_state() {
        let link = LinkState::new();
        link.on_command(b"x");
        assert!(!link.is_connected());
    }

    #[test]
    fn payload_display_escapes_binary() {
        let mut out = heapless::String::<32>::new();
        write!(out, "{}", PayloadDisplay(b"go\x01\xff")).unwrap();
        assert_eq!(out.as_str(), "go\\x01\\xff");
    }
}
