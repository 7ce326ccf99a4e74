use reqwest::StatusCode;

use crate::errors::{Error, Result};

/// Map an HTTP status to success or a typed failure.
///
/// Everything in `200..=226` succeeds. 400, 401 and 404 get their own
/// variants; any other status is reported as [`Error::HttpStatus`].
pub fn classify_status(status: StatusCode) -> Result<()> {
    match status.as_u16() {
        200..=226 => Ok(()),
        400 => Err(Error::BadRequest),
        401 => Err(Error::Unauthorized),
        404 => Err(Error::PathNotFound),
        _ => Err(Error::HttpStatus(status)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn kind(code: u16) -> Option<ErrorKind> {
        classify_status(StatusCode::from_u16(code).unwrap())
            .err()
            .map(|e| e.kind())
    }

    #[test]
    fn whole_success_range_passes() {
        for code in 200..=226 {
            assert!(kind(code).is_none(), "{code} should succeed");
        }
    }

    #[test]
    fn distinguished_statuses() {
        assert_eq!(kind(400), Some(ErrorKind::BadRequest));
        assert_eq!(kind(401), Some(ErrorKind::Unauthorized));
        assert_eq!(kind(404), Some(ErrorKind::PathNotFound));
    }

    #[test]
    fn everything_else_carries_the_code() {
        for code in [100, 199, 227, 300, 301, 304, 402, 403, 418, 500, 503] {
            let err = classify_status(StatusCode::from_u16(code).unwrap()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::HttpStatus, "{code}");
            assert_eq!(err.status().map(|s| s.as_u16()), Some(code));
        }
    }
}
