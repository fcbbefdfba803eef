use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;
use tracing::error;

/// Every failure a handler can surface. The `Display` text is what the
/// client sees in `{"message": ...}`, except for `Unhandled` whose detail
/// only goes to the log.
#[derive(Debug, Display)]
pub enum AppError {
    #[display(fmt = "{}", _0)]
    InvalidInput(String),

    /// Same text for unknown usernames and wrong passwords.
    #[display(fmt = "Invalid username or password.")]
    InvalidCredentials,

    #[display(fmt = "{}", _0)]
    Unauthenticated(String),

    #[display(fmt = "{}", _0)]
    Forbidden(String),

    #[display(fmt = "{}", _0)]
    NotFound(String),

    #[display(fmt = "Username '{}' already exists.", _0)]
    DuplicateUsername(String),

    #[display(fmt = "You have already checked in for today.")]
    AlreadyCheckedIn,

    #[display(fmt = "No active check-in found for today to check out, or already checked out.")]
    NoActiveCheckIn,

    #[display(fmt = "Error: Admins cannot delete their own account.")]
    SelfDeleteForbidden,

    #[display(fmt = "Only image files are allowed!")]
    InvalidFileType,

    #[display(fmt = "File too large: the limit is {} bytes.", _0)]
    FileTooLarge(usize),

    #[display(fmt = "{}", _0)]
    Unhandled(String),
}

impl std::error::Error for AppError {}

impl AppError {
    /// The text sent back to the client.
    pub fn client_message(&self) -> String {
        match self {
            AppError::Unhandled(_) => "Internal Server Error".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidInput(_)
            | AppError::AlreadyCheckedIn
            | AppError::NoActiveCheckIn
            | AppError::SelfDeleteForbidden
            | AppError::InvalidFileType => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials | AppError::Unauthenticated(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DuplicateUsername(_) => StatusCode::CONFLICT,
            AppError::FileTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Unhandled(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let AppError::Unhandled(detail) = self {
            error!(error = %detail, "Unhandled failure");
        }

        HttpResponse::build(self.status_code()).json(json!({
            "message": self.client_message()
        }))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Unhandled(format!("database error: {e}"))
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(e: actix_web::error::BlockingError) -> Self {
        AppError::Unhandled(format!("blocking task failed: {e}"))
    }
}
