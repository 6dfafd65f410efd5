//! Status codes for table operations
//!
//! The public façade reports insert/find outcomes as `bool`/`Option`; the
//! layers below it use these codes.

use std::fmt;

/// Status code returned by slot and probe operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum Status {
    /// Operation completed successfully
    #[default]
    Ok = 0,
    /// Key was not found
    NotFound = 1,
    /// Probe bound exhausted without a successful claim
    TableFull = 2,
    /// Invalid argument provided
    InvalidArgument = 3,
}

impl Status {
    /// Check if the status indicates success
    #[inline]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }

    /// Check if the key was not found
    #[inline]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Status::NotFound)
    }

    /// Check if the probe sequence saturated
    #[inline]
    pub const fn is_table_full(&self) -> bool {
        matches!(self, Status::TableFull)
    }

    /// Get the status as a string
    pub const fn as_str(&self) -> &'static str {
        match self {
            Status::Ok => "Ok",
            Status::NotFound => "NotFound",
            Status::TableFull => "TableFull",
            Status::InvalidArgument => "InvalidArgument",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_checks() {
        assert!(Status::Ok.is_ok());
        assert!(!Status::Ok.is_table_full());

        assert!(Status::NotFound.is_not_found());
        assert!(Status::TableFull.is_table_full());
        assert!(!Status::TableFull.is_ok());
    }

    #[test]
    fn test_status_display() {
        assert_eq!(format!("{}", Status::Ok), "Ok");
        assert_eq!(format!("{}", Status::NotFound), "NotFound");
        assert_eq!(format!("{}", Status::TableFull), "TableFull");
        assert_eq!(format!("{}", Status::InvalidArgument), "InvalidArgument");
    }

    #[test]
    fn test_status_default() {
        assert_eq!(Status::default(), Status::Ok);
    }
}
