// Exit codes for the tca CLI.
//
//   0 = success
//   1 = general error
//   2 = usage/validation error
//   3 = no session, or the session expired
//   4 = backend unreachable

use tca_client::{ClientError, ErrorKind, LoginError};

use crate::commands::SessionRequired;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    Success = 0,
    Error = 1,
    Usage = 2,
    Session = 3,
    Unreachable = 4,
}

impl ExitCode {
    pub fn code(self) -> i32 {
        self as i32
    }

    /// Map an anyhow error to an exit code by inspecting the error chain.
    pub fn from_error(err: &anyhow::Error) -> Self {
        for cause in err.chain() {
            if cause.downcast_ref::<SessionRequired>().is_some() {
                return Self::Session;
            }
            if let Some(client_err) = cause.downcast_ref::<ClientError>() {
                return Self::from_client_error(client_err);
            }
            if let Some(login_err) = cause.downcast_ref::<LoginError>() {
                return match login_err {
                    LoginError::ServerUnreachable(_) => Self::Unreachable,
                    LoginError::InvalidCredentials(_) => Self::Session,
                    LoginError::Other(_) => Self::Error,
                };
            }
        }
        Self::Error
    }

    fn from_client_error(err: &ClientError) -> Self {
        match err.kind() {
            ErrorKind::Transport => Self::Unreachable,
            ErrorKind::Authentication => Self::Session,
            ErrorKind::Validation | ErrorKind::InvalidInput => Self::Usage,
            ErrorKind::LogicalFailure | ErrorKind::Unknown => Self::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_expired_maps_to_session() {
        let err = anyhow::Error::new(ClientError::Http {
            status: 401,
            payload: json!({"error": "Token expirado"}),
        });
        assert_eq!(ExitCode::from_error(&err), ExitCode::Session);
    }

    #[test]
    fn test_transport_maps_to_unreachable() {
        let err = anyhow::Error::new(ClientError::Timeout).context("fetching page");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Unreachable);

        let err = anyhow::Error::new(LoginError::ServerUnreachable("refused".into()));
        assert_eq!(ExitCode::from_error(&err), ExitCode::Unreachable);
    }

    #[test]
    fn test_missing_session_maps_to_session() {
        let err = anyhow::Error::new(SessionRequired);
        assert_eq!(ExitCode::from_error(&err), ExitCode::Session);
    }

    #[test]
    fn test_validation_maps_to_usage() {
        let err = anyhow::Error::new(ClientError::InvalidInput("empty term".into()));
        assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);

        let err = anyhow::Error::new(ClientError::Http {
            status: 422,
            payload: json!({"message": "descricao obrigatória"}),
        });
        assert_eq!(ExitCode::from_error(&err), ExitCode::Usage);
    }

    #[test]
    fn test_other_errors_are_general() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(ExitCode::from_error(&err), ExitCode::Error);
        assert_eq!(ExitCode::Success.code(), 0);
    }
}
