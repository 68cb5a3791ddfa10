//! Response lines sent back to clients.

use std::fmt;
use std::time::Duration;

use crate::index::LookupResult;

/// One status line. Every variant renders with a trailing newline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    Exists(Duration),
    NotFound(Duration),
    TooLong,
}

impl Response {
    pub fn as_line(&self) -> String {
        self.to_string()
    }
}

impl From<LookupResult> for Response {
    fn from(result: LookupResult) -> Self {
        if result.found {
            Response::Exists(result.elapsed)
        } else {
            Response::NotFound(result.elapsed)
        }
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Response::Exists(elapsed) => writeln!(
                f,
                "STRING EXISTS (Execution Time: {:.4} seconds)",
                elapsed.as_secs_f64()
            ),
            Response::NotFound(elapsed) => writeln!(
                f,
                "STRING NOT FOUND (Execution Time: {:.4} seconds)",
                elapsed.as_secs_f64()
            ),
            Response::TooLong => writeln!(f, "ERROR: Query string too long."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_exact_wire_lines() {
        let t = Duration::from_secs_f64(0.1234);
        assert_eq!(
            Response::Exists(t).as_line(),
            "STRING EXISTS (Execution Time: 0.1234 seconds)\n"
        );
        assert_eq!(
            Response::NotFound(t).as_line(),
            "STRING NOT FOUND (Execution Time: 0.1234 seconds)\n"
        );
        assert_eq!(Response::TooLong.as_line(), "ERROR: Query string too long.\n");
    }

    #[test]
    fn rounds_to_four_decimals() {
        assert_eq!(
            Response::Exists(Duration::from_micros(12)).as_line(),
            "STRING EXISTS (Execution Time: 0.0000 seconds)\n"
        );
        assert_eq!(
            Response::NotFound(Duration::from_millis(1500)).as_line(),
            "STRING NOT FOUND (Execution Time: 1.5000 seconds)\n"
        );
    }

    #[test]
    fn from_lookup_result() {
        let elapsed = Duration::from_millis(2);
        assert_eq!(
            Response::from(LookupResult { found: true, elapsed }),
            Response::Exists(elapsed)
        );
        assert_eq!(
            Response::from(LookupResult { found: false, elapsed }),
            Response::NotFound(elapsed)
        );
    }
}
