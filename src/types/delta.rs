//! Raw provider stream items.

use crate::Error;

/// One item of a raw provider stream: a partial value or a stream-carried error.
#[derive(Debug, Clone)]
pub enum Delta<T> {
    Value(T),
    Error(Error),
}

impl<T> Delta<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, Delta::Error(_))
    }
}

impl<T> From<crate::Result<T>> for Delta<T> {
    fn from(result: crate::Result<T>) -> Self {
        match result {
            Ok(value) => Delta::Value(value),
            Err(err) => Delta::Error(err),
        }
    }
}
