//! Exit codes for the n2k-core CLI.
//!
//! Scripts can branch on these without parsing output. Values are stable.

/// Exit codes for n2k-core commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// All requested checks passed / recording finished
    Clean = 0,

    /// At least one validator reported a discrepancy
    ValidationFailed = 1,

    /// Configuration could not be loaded or is invalid
    ConfigError = 10,

    /// Data directory or input stream unusable
    IoError = 13,

    /// Internal/unknown error
    InternalError = 99,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stable_values() {
        assert_eq!(ExitCode::Clean.as_i32(), 0);
        assert_eq!(ExitCode::ValidationFailed.as_i32(), 1);
        assert_eq!(ExitCode::ConfigError.as_i32(), 10);
        assert_eq!(ExitCode::IoError.as_i32(), 13);
        assert_eq!(ExitCode::InternalError.as_i32(), 99);
    }
}
