use crate::AnyResult;
use std::{error::Error, fmt::Display};

/// Context helper for fallible calls in the tool and other `anyhow` code.
pub trait AnyhowResultExt<T> {
    /// Converts the error into an [`anyhow::Error`] carrying `context` as its outermost message.
    /// The original error stays reachable through [`anyhow::Error::root_cause`].
    fn otherwise(self, context: impl Display) -> AnyResult<T>;
}

impl<T, E> AnyhowResultExt<T> for Result<T, E>
where
    E: Error + Send + Sync + 'static,
{
    fn otherwise(self, context: impl Display) -> AnyResult<T> {
        self.map_err(|err| anyhow::Error::new(err).context(context.to_string()))
    }
}
