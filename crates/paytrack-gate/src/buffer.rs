//! PIN entry buffer

use std::fmt;

use paytrack_core::PIN_LENGTH;
use zeroize::Zeroizing;

/// A single keypad digit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Digit(u8);

impl Digit {
    /// `None` unless `value` is 0-9
    pub fn new(value: u8) -> Option<Self> {
        (value <= 9).then_some(Self(value))
    }

    /// Parse an ASCII digit character
    pub fn from_char(c: char) -> Option<Self> {
        c.to_digit(10).map(|d| Self(d as u8))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn as_char(self) -> char {
        char::from(b'0' + self.0)
    }
}

/// Digits typed so far, wiped on clear and drop
pub struct EntryBuffer {
    digits: Zeroizing<String>,
}

impl Default for EntryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntryBuffer {
    pub fn new() -> Self {
        // Pushes must never reallocate (old allocations are not wiped)
        Self {
            digits: Zeroizing::new(String::with_capacity(PIN_LENGTH)),
        }
    }

    /// Append a digit; `false` when already full
    pub fn push(&mut self, digit: Digit) -> bool {
        if self.is_full() {
            return false;
        }
        self.digits.push(digit.as_char());
        true
    }

    /// Remove the last digit; `false` when empty
    pub fn pop(&mut self) -> bool {
        self.digits.pop().is_some()
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    pub fn len(&self) -> usize {
        self.digits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digits.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.digits.len() >= PIN_LENGTH
    }

    /// Move the digits out, leaving the buffer empty
    pub fn take(&mut self) -> Zeroizing<String> {
        let taken = Zeroizing::new(self.digits.as_str().to_owned());
        self.digits.clear();
        taken
    }
}

impl fmt::Debug for EntryBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryBuffer")
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn d(v: u8) -> Digit {
        Digit::new(v).unwrap()
    }

    #[test]
    fn test_digit_parsing() {
        assert_eq!(Digit::from_char('7'), Digit::new(7));
        assert!(Digit::from_char('a').is_none());
        assert!(Digit::from_char('٣').is_none());
        assert!(Digit::new(10).is_none());
        assert_eq!(d(3).as_char(), '3');
    }

    #[test]
    fn test_push_stops_at_four() {
        let mut buffer = EntryBuffer::new();
        for v in 1..=4 {
            assert!(buffer.push(d(v)));
        }
        assert!(buffer.is_full());
        assert!(!buffer.push(d(5)));
        assert_eq!(buffer.take().as_str(), "1234");
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_pop_on_empty_is_noop() {
        let mut buffer = EntryBuffer::new();
        assert!(!buffer.pop());
        buffer.push(d(1));
        assert!(buffer.pop());
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn test_debug_hides_digits() {
        let mut buffer = EntryBuffer::new();
        buffer.push(d(9));
        let shown = format!("{:?}", buffer);
        assert!(!shown.contains('9'));
    }

    proptest! {
        #[test]
        fn prop_length_stays_in_bounds(
            ops in prop::collection::vec(prop::option::of(0u8..10), 0..64)
        ) {
            let mut buffer = EntryBuffer::new();
            let mut model = 0usize;
            for op in ops {
                match op {
                    Some(v) => {
                        buffer.push(d(v));
                        model = (model + 1).min(PIN_LENGTH);
                    }
                    None => {
                        buffer.pop();
                        model = model.saturating_sub(1);
                    }
                }
                prop_assert!(buffer.len() <= PIN_LENGTH);
                prop_assert_eq!(buffer.len(), model);
            }
        }
    }
}
