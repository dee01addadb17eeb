use std::sync::Arc;
use std::time::Duration;

use super::{MailTransport, OutgoingEmail, TransportError};

/// Runs transport calls under a time budget.
///
/// The call is spawned as its own task and raced against a timer. When the
/// timer wins the task is aborted and `TransportError::Timeout` is returned;
/// whether the server already accepted the message is unknown at that point.
#[derive(Clone)]
pub struct Mailer {
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
}

impl Mailer {
    pub fn new(transport: Arc<dyn MailTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Send with the configured timeout.
    pub async fn send(&self, email: OutgoingEmail) -> Result<(), TransportError> {
        self.send_with_timeout(email, self.timeout).await
    }

    pub async fn send_with_timeout(
        &self,
        email: OutgoingEmail,
        timeout: Duration,
    ) -> Result<(), TransportError> {
        let transport = self.transport.clone();
        let mut handle = tokio::spawn(async move { transport.send(&email).await });

        match tokio::time::timeout(timeout, &mut handle).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) => Err(TransportError::Aborted(join_error.to_string())),
            Err(_) => {
                handle.abort();
                Err(TransportError::Timeout(timeout))
            }
        }
    }
}
