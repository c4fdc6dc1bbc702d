use crate::payload::Payload;

/// Every way an SES callback can be rejected.
///
/// Gate failures (`EmptyPayload`, `UnrecognizedType`) are turned into a 400 directly by the
/// request handler; everything else is raised by the dispatcher and converted at the boundary.
#[derive(Debug, thiserror::Error)]
pub enum CallbackError {
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    #[error("There is no data to process.")]
    EmptyPayload,

    #[error("Key 'Type' not found in payload")]
    UnrecognizedType,

    #[error("Received SES webhook of type '{kind}' but couldn't understand payload")]
    UnknownNotificationType { kind: String, payload: Payload },

    #[error("Bounce notification missing bounce field")]
    MissingBounceBlock,

    #[error("Complaint notification missing complaint field")]
    MissingComplaintBlock,

    #[error("Invalid recipient address: {0}")]
    InvalidRecipientAddress(String),

    #[error("Invalid SubscribeURL: {0}")]
    InvalidSubscribeUrl(String),

    #[error("Callback to SubscribeURL from Amazon SNS failed, reason: {0}")]
    SubscriptionConfirmationFailed(String),
}

impl CallbackError {
    /// Gate failures are answered without going through the dispatch error path.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::EmptyPayload | Self::UnrecognizedType)
    }
}
