//! Bounding the history sent to a provider.
//!
//! The window keeps the system message at index 0 plus the most recent
//! `size` messages after it:
//!
//! ```text
//!   [H0] + H[max(1, len - size)..]
//! ```
//!
//! It is a pure transform applied once per turn. The caller's stored
//! history is never touched.
//!
//! ```rust
//! use chatbridge::context::ContextWindow;
//! use chatbridge::Message;
//!
//! let mut history = vec![Message::system("Be brief.")];
//! history.extend((0..20).map(|i| Message::user(format!("msg {i}"))));
//!
//! let window = ContextWindow::default().apply(&history);
//! assert_eq!(window.len(), 11);
//! assert_eq!(window[0].text(), "Be brief.");
//! assert_eq!(window[1].text(), "msg 10");
//! ```

use serde::{Deserialize, Serialize};

use crate::chat::{Message, Role};

/// Default number of messages kept after the system message.
pub const DEFAULT_WINDOW: usize = 10;

/// A fixed-size history window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextWindow {
    /// Messages kept after the system message.
    pub size: usize,
}

impl Default for ContextWindow {
    fn default() -> Self {
        Self {
            size: DEFAULT_WINDOW,
        }
    }
}

impl ContextWindow {
    /// A window keeping `size` messages after the system message.
    pub fn new(size: usize) -> Self {
        Self { size }
    }

    /// Applies the window to `history`.
    pub fn apply(&self, history: &[Message]) -> Vec<Message> {
        window(history, self.size)
    }
}

/// `[history[0]] + history[max(1, len - n)..]`.
///
/// A history of `n + 1` messages or fewer comes back unchanged, and an
/// empty history yields an empty window.
///
/// The cut never starts on a `tool` answer: leading answers whose call
/// fell outside the window are dropped, since vendors reject them.
pub fn window(history: &[Message], n: usize) -> Vec<Message> {
    let Some(first) = history.first() else {
        return Vec::new();
    };
    if history.len() - 1 <= n {
        return history.to_vec();
    }

    let mut start = (history.len() - n).max(1);
    while start < history.len() && history[start].role == Role::Tool {
        start += 1;
    }

    let mut out = Vec::with_capacity(history.len() - start + 1);
    out.push(first.clone());
    out.extend_from_slice(&history[start..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{assistant_msg, system_msg, tool_call_msg, user_msg};
    use serde_json::json;

    fn history(len: usize) -> Vec<Message> {
        let mut h = vec![system_msg("sys")];
        h.extend((1..len).map(|i| user_msg(&format!("m{i}"))));
        h
    }

    #[test]
    fn test_window_empty() {
        assert!(window(&[], 10).is_empty());
    }

    #[test]
    fn test_window_short_history_unchanged() {
        let h = history(11);
        assert_eq!(window(&h, 10), h);
        let h = history(3);
        assert_eq!(window(&h, 10), h);
    }

    #[test]
    fn test_window_keeps_system_and_tail() {
        let h = history(25);
        let w = window(&h, 10);
        assert_eq!(w.len(), 11);
        assert_eq!(w[0], h[0]);
        assert_eq!(w[1].text(), "m15");
        assert_eq!(w.last(), h.last());
    }

    #[test]
    fn test_window_bounds_hold_for_all_lengths() {
        for len in 2..40 {
            let h = history(len);
            for n in 1..15 {
                let w = window(&h, n);
                assert_eq!(w[0], h[0]);
                assert!(w.len() <= n + 1, "len={len} n={n}");
            }
        }
    }

    #[test]
    fn test_window_zero_keeps_only_system() {
        let h = history(5);
        assert_eq!(window(&h, 0), vec![h[0].clone()]);
    }

    #[test]
    fn test_window_does_not_orphan_tool_answers() {
        let mut h = vec![system_msg("sys"), user_msg("weather?")];
        h.push(tool_call_msg("c1", "get_weather", json!({"location": "Paris"})));
        h.push(Message::tool_result("c1", "get_weather", "18C"));
        h.push(assistant_msg("18C"));

        let w = window(&h, 2);
        assert_eq!(w, vec![h[0].clone(), h[4].clone()]);

        let w = window(&h, 3);
        assert!(w[1].has_tool_calls());
        assert_eq!(w.len(), 4);
    }

    #[test]
    fn test_context_window_default_size() {
        assert_eq!(ContextWindow::default().size, 10);
        assert_eq!(ContextWindow::new(2).apply(&history(10)).len(), 3);
    }
}
