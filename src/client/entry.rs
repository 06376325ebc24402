pub const OTP_LEN: usize = 6;

/// Six independently addressable single-digit slots plus a focus index,
/// mirroring the per-box OTP input. Completion is edge-triggered: mutations
/// return `Some(code)` exactly on the transition from not-all-filled to
/// all-filled, and clearing a slot re-arms it.
#[derive(Debug, Clone, Default)]
pub struct OtpEntry {
    slots: [String; OTP_LEN],
    focus: usize,
    completed: bool,
}

impl OtpEntry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn slots(&self) -> &[String; OTP_LEN] {
        &self.slots
    }

    pub fn focus(&self) -> usize {
        self.focus
    }

    pub fn is_complete(&self) -> bool {
        self.slots.iter().all(|s| !s.is_empty())
    }

    /// Type into slot `i`. Only the first character is taken (excess input
    /// ignored), non-digits are rejected, filled slots are overwritten.
    /// Focus auto-advances while not on the last slot.
    pub fn input(&mut self, i: usize, text: &str) -> Option<String> {
        if i >= OTP_LEN {
            return None;
        }
        let Some(digit) = text.chars().next().filter(|c| c.is_ascii_digit()) else {
            return None;
        };
        self.slots[i] = digit.to_string();
        self.focus = if i < OTP_LEN - 1 { i + 1 } else { i };
        self.fire_if_newly_complete()
    }

    /// Backspace in slot `i`: a filled slot is cleared in place; an empty
    /// slot moves focus left without deleting anything; an empty slot 0 is
    /// a no-op.
    pub fn backspace(&mut self, i: usize) {
        if i >= OTP_LEN {
            return;
        }
        if !self.slots[i].is_empty() {
            self.slots[i].clear();
            self.completed = false;
            self.focus = i;
        } else if i > 0 {
            self.focus = i - 1;
        }
    }

    /// Paste replaces the whole array: the text is truncated to six digits,
    /// split into slots, right-padded with empty strings. Focus lands on the
    /// first empty slot, or the last slot when all are filled.
    pub fn paste(&mut self, text: &str) -> Option<String> {
        let digits: Vec<char> = text
            .chars()
            .filter(|c| c.is_ascii_digit())
            .take(OTP_LEN)
            .collect();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            *slot = digits.get(i).map(|c| c.to_string()).unwrap_or_default();
        }
        self.completed = false;
        self.focus = self
            .slots
            .iter()
            .position(|s| s.is_empty())
            .unwrap_or(OTP_LEN - 1);
        self.fire_if_newly_complete()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn code(&self) -> Option<String> {
        if self.is_complete() {
            Some(self.slots.concat())
        } else {
            None
        }
    }

    fn fire_if_newly_complete(&mut self) -> Option<String> {
        if self.completed || !self.is_complete() {
            return None;
        }
        self.completed = true;
        Some(self.slots.concat())
    }
}
