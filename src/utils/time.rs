//! Time parsing utilities for `MM:SS` trim inputs

/// Parser for the `MM:SS` text the user types for start and end times
///
/// Lenient by default: a missing or non-numeric component counts as 0, and
/// only a string where no component parses yields no value. Strict mode
/// rejects any non-empty component that is not a number.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeParser {
    strict: bool,
}

impl TimeParser {
    /// Create a new lenient time parser
    pub fn new() -> Self {
        Self { strict: false }
    }

    /// Create a time parser that rejects non-numeric components
    pub fn strict() -> Self {
        Self { strict: true }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    /// Parse `MM:SS` (or a bare `MM`) into seconds
    pub fn parse_clock(&self, text: &str) -> Option<f64> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() > 2 {
            return None;
        }

        let minutes = parse_component(parts[0]);
        let seconds = parts.get(1).and_then(|part| parse_component(part));

        if minutes.is_none() && seconds.is_none() {
            return None;
        }

        if self.strict {
            let rejected =
                |part: &str, value: Option<f64>| !part.trim().is_empty() && value.is_none();
            let seconds_rejected = parts
                .get(1)
                .map_or(false, |part| rejected(*part, seconds));
            if rejected(parts[0], minutes) || seconds_rejected {
                return None;
            }
        }

        Some(minutes.unwrap_or(0.0) * 60.0 + seconds.unwrap_or(0.0))
    }

    /// Format seconds as `M:SS`, keeping fractional seconds when present
    ///
    /// Rounds to whole milliseconds first so the seconds field never reads 60.
    pub fn format_clock(&self, seconds: f64) -> String {
        let millis = (seconds.max(0.0) * 1000.0).round() as u64;
        let minutes = millis / 60_000;
        let rest = millis % 60_000;

        if rest % 1000 == 0 {
            format!("{}:{:02}", minutes, rest / 1000)
        } else {
            format!("{}:{:02}.{:03}", minutes, rest / 1000, rest % 1000)
        }
    }
}

/// A component parses only when it is a finite decimal number
fn parse_component(part: &str) -> Option<f64> {
    part.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}
