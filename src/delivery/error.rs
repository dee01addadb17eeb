use thiserror::Error;

use crate::email::StoreError;
use crate::template::TemplateError;
use crate::transport::TransportError;

/// Errors surfaced by the delivery lifecycle.
///
/// Validation and template resolution errors happen before anything is
/// written. Delivery errors always carry the id of the record that was
/// created and moved to `failed`.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("{0}")]
    Validation(String),

    #[error("Email not found: {0}")]
    NotFound(i64),

    #[error("Email {0} is not a draft")]
    NotDraft(i64),

    #[error("Template unavailable: {0}")]
    TemplateUnavailable(TemplateError),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("Email {id} failed: {source}")]
    Delivery {
        id: i64,
        #[source]
        source: TransportError,
    },

    #[error("Storage error: {0}")]
    Persistence(#[from] StoreError),

    #[error("Email {id}: status update failed after delivery ({}): {source}", outcome_label(.delivery_error))]
    StatusUpdateFailed {
        id: i64,
        /// Delivery failure reason, `None` if the server accepted the message
        delivery_error: Option<String>,
        #[source]
        source: StoreError,
    },
}

fn outcome_label(delivery_error: &Option<String>) -> String {
    match delivery_error {
        Some(reason) => format!("delivery failed: {reason}"),
        None => "delivered".to_string(),
    }
}

impl DispatchError {
    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::Validation(_) => "VALIDATION_ERROR",
            DispatchError::NotFound(_) | DispatchError::NotDraft(_) => "NOT_FOUND",
            DispatchError::TemplateUnavailable(_) => "TEMPLATE_UNAVAILABLE",
            DispatchError::Template(e) => template_error_code(e),
            DispatchError::Delivery { source, .. } if source.is_timeout() => "DELIVERY_TIMEOUT",
            DispatchError::Delivery { .. } => "TRANSPORT_ERROR",
            DispatchError::Persistence(_) => "PERSISTENCE_ERROR",
            DispatchError::StatusUpdateFailed { .. } => "STATUS_UPDATE_FAILED",
        }
    }

    /// Id of the email record involved, when one was created
    pub fn email_id(&self) -> Option<i64> {
        match self {
            DispatchError::NotFound(id)
            | DispatchError::NotDraft(id)
            | DispatchError::Delivery { id, .. }
            | DispatchError::StatusUpdateFailed { id, .. } => Some(*id),
            _ => None,
        }
    }
}

/// Error code for template store and renderer errors
pub fn template_error_code(error: &TemplateError) -> &'static str {
    match error {
        TemplateError::NotFound(_)
        | TemplateError::VersionNotFound { .. }
        | TemplateError::NoActiveVersion(_) => "NOT_FOUND",
        TemplateError::Invalid(_) => "VALIDATION_ERROR",
        TemplateError::Syntax { .. } | TemplateError::UndefinedVariable(_) => {
            "TEMPLATE_SYNTAX_ERROR"
        }
        TemplateError::Storage(_) => "PERSISTENCE_ERROR",
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_delivery_codes_distinguish_timeout() {
        let timeout = DispatchError::Delivery {
            id: 3,
            source: TransportError::Timeout(Duration::from_secs(1)),
        };
        assert_eq!(timeout.code(), "DELIVERY_TIMEOUT");
        assert_eq!(timeout.email_id(), Some(3));

        let refused = DispatchError::Delivery {
            id: 4,
            source: TransportError::MissingCredentials,
        };
        assert_eq!(refused.code(), "TRANSPORT_ERROR");
    }

    #[test]
    fn test_template_codes() {
        assert_eq!(
            DispatchError::TemplateUnavailable(TemplateError::NoActiveVersion("x".into())).code(),
            "TEMPLATE_UNAVAILABLE"
        );
        assert_eq!(
            DispatchError::from(TemplateError::syntax(0, "bad")).code(),
            "TEMPLATE_SYNTAX_ERROR"
        );
        assert_eq!(
            DispatchError::from(TemplateError::Invalid("x".into())).code(),
            "VALIDATION_ERROR"
        );
    }

    #[test]
    fn test_status_update_failure_reports_both_errors() {
        let err = DispatchError::StatusUpdateFailed {
            id: 9,
            delivery_error: Some("550 rejected".to_string()),
            source: StoreError::Postgres(sqlx::Error::PoolClosed),
        };
        let message = err.to_string();
        assert!(message.contains("550 rejected"));
        assert!(message.contains("closed"));
        assert_eq!(err.code(), "STATUS_UPDATE_FAILED");
    }
}
