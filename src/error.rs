use std::{error::Error, fmt};

use backtrace::Backtrace;
use log::error;

/// The error type used across the crate. It carries a human readable
/// message and the backtrace of the construction site, since most
/// failures in the eviction path are "detected impossible" conditions
/// that are hard to reproduce without knowing who triggered them.
pub struct SmallError {
    details: String,
    backtrace: Backtrace,
}

impl SmallError {
    pub fn new(msg: &str) -> SmallError {
        SmallError {
            details: msg.to_string(),
            backtrace: Backtrace::new_unresolved(),
        }
    }

    pub fn show_backtrace(&self) {
        let mut backtrace = self.backtrace.clone();
        backtrace.resolve();
        error!("{}\nbacktrace:\n{:?}", self.details, backtrace);
    }
}

impl fmt::Display for SmallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl fmt::Debug for SmallError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.details)
    }
}

impl Error for SmallError {
    fn description(&self) -> &str {
        &self.details
    }
}
