//! Backend response envelope

use serde::Deserialize;

use pylon_session::ApiError;

/// Code the backend uses for a successful call.
pub const DEFAULT_SUCCESS_CODE: i64 = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    /// Unwraps `data` when `code` is the success code.
    pub fn into_result(self, success_code: i64) -> Result<T, ApiError> {
        if self.code != success_code {
            return Err(ApiError::Rejected {
                code: self.code,
                message: self.message,
            });
        }

        self.data
            .ok_or_else(|| ApiError::Decode("response has no data".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pylon_session::TokenGrant;

    #[test]
    fn test_success_unwraps_data() {
        let envelope: Envelope<TokenGrant> = serde_json::from_str(
            r#"{"code":1000,"message":"success","data":{"token":"T1","refreshToken":"R1","expire":3600,"refreshExpire":604800}}"#,
        )
        .unwrap();

        let grant = envelope.into_result(DEFAULT_SUCCESS_CODE).unwrap();
        assert_eq!(grant.token, "T1");
    }

    #[test]
    fn test_failure_code_is_rejected() {
        let envelope: Envelope<TokenGrant> =
            serde_json::from_str(r#"{"code":1001,"message":"captcha expired"}"#).unwrap();

        assert_eq!(
            envelope.into_result(DEFAULT_SUCCESS_CODE).unwrap_err(),
            ApiError::Rejected {
                code: 1001,
                message: "captcha expired".to_string()
            }
        );
    }

    #[test]
    fn test_missing_data() {
        let envelope: Envelope<TokenGrant> =
            serde_json::from_str(r#"{"code":1000,"data":null}"#).unwrap();

        assert!(matches!(
            envelope.into_result(DEFAULT_SUCCESS_CODE),
            Err(ApiError::Decode(_))
        ));
    }
}
