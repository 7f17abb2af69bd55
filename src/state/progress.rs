//! Progress range, value and text of a running computation.

use tracing::warn;

/// Value is always clamped into `[minimum, maximum]`; out-of-range updates
/// never fail. With the default empty range `(0, 0)` every value clamps to
/// zero, so producers should publish a range first.
#[derive(Debug, Clone, Default)]
pub(crate) struct ProgressInfo {
    minimum: i32,
    maximum: i32,
    value: i32,
    text: Option<String>,
}

impl ProgressInfo {
    /// Publish a new range. The current value resets to `minimum`.
    pub(crate) fn set_range(&mut self, minimum: i32, maximum: i32) {
        let (minimum, maximum) = if maximum < minimum {
            warn!(minimum, maximum, "reversed progress range; swapped");
            (maximum, minimum)
        } else {
            (minimum, maximum)
        };
        self.minimum = minimum;
        self.maximum = maximum;
        self.value = minimum;
    }

    /// Clamp `value` into the range and store it. Returns the clamped value
    /// when it differs from the stored one, `None` when nothing changed.
    pub(crate) fn update_value(&mut self, value: i32) -> Option<i32> {
        let clamped = value.clamp(self.minimum, self.maximum);
        if clamped == self.value {
            return None;
        }
        self.value = clamped;
        Some(clamped)
    }

    pub(crate) fn set_text(&mut self, text: Option<String>) {
        self.text = text;
    }

    pub(crate) fn minimum(&self) -> i32 {
        self.minimum
    }

    pub(crate) fn maximum(&self) -> i32 {
        self.maximum
    }

    pub(crate) fn value(&self) -> i32 {
        self.value
    }

    pub(crate) fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
