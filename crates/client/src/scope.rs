use std::future::Future;

use tokio_util::sync::CancellationToken;

use crate::ClientError;

/// Cancellation scope owned by a view. Requests started through
/// [`Scope::run`] resolve to [`ClientError::Cancelled`] once the scope is
/// cancelled, so a view never applies a response that arrived after it was
/// torn down.
#[derive(Debug, Default)]
pub struct Scope {
    token: CancellationToken,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope that is cancelled together with `parent`.
    pub fn child_of(parent: &Scope) -> Self {
        Self {
            token: parent.token.child_token(),
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub async fn run<F, T>(&self, request: F) -> Result<T, ClientError>
    where
        F: Future<Output = Result<T, ClientError>>,
    {
        if self.token.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(ClientError::Cancelled),
            result = request => result,
        }
    }
}

impl Drop for Scope {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
