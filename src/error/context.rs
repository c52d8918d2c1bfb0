//! Context helpers for attaching paths and operations to errors.

use super::{ParityError, Result};

/// Extension trait for adding context to fallible results.
pub trait ResultExt<T> {
    /// Wrap the error with a lazily built context message.
    ///
    /// # Errors
    ///
    /// Returns `ParityError::WithContext` when the underlying result is an error.
    fn context_with<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context_with<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| ParityError::WithContext {
            context: f(),
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn context_is_prefixed() {
        let result: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = result
            .context_with(|| "reading fixtures.tsv".to_string())
            .unwrap_err();
        assert_eq!(err.to_string(), "reading fixtures.tsv: gone");
    }
}
