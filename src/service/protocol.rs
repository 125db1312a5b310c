//! Newline-delimited JSON spoken between the server and its clients.
use serde;

use crate::dispatch::elevator::Status;
use crate::dispatch::error::DispatchError;

fn one_step() -> i64 {
    1
}

/// One request line. Directions stay in their integer encoding so that the
/// engine decides what counts as a valid one.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Request {
    Status,
    RequestFloor { floor: i64, direction: i64 },
    Step {
        #[serde(default = "one_step")]
        steps: i64,
    },
    Reset,
}

#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidArgument,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ErrorBody {
    pub kind: ErrorKind,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Response {
    Status(Status),
    Error(ErrorBody),
}

impl From<DispatchError> for Response {
    fn from(err: DispatchError) -> Response {
        match err {
            DispatchError::InvalidArgument(detail) => Response::Error(ErrorBody {
                kind: ErrorKind::InvalidArgument,
                detail,
            }),
        }
    }
}

impl From<Result<Status, DispatchError>> for Response {
    fn from(result: Result<Status, DispatchError>) -> Response {
        match result {
            Ok(status) => Response::Status(status),
            Err(err) => err.into(),
        }
    }
}

/// Decodes one request line. Anything that does not parse, including
/// non-integer floors and unknown ops, is an invalid argument.
pub fn parse_request(line: &str) -> Result<Request, DispatchError> {
    serde_json::from_str(line.trim()).map_err(|e| DispatchError::invalid(e.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn it_parses_every_op() {
        assert_eq!(parse_request(r#"{"op":"status"}"#), Ok(Request::Status));
        assert_eq!(
            parse_request(r#"{"op":"request_floor","floor":5,"direction":-1}"#),
            Ok(Request::RequestFloor { floor: 5, direction: -1 })
        );
        assert_eq!(parse_request(r#"{"op":"step","steps":3}"#), Ok(Request::Step { steps: 3 }));
        assert_eq!(parse_request(r#"{"op":"reset"}"#), Ok(Request::Reset));
    }

    #[test]
    fn it_defaults_to_a_single_step() {
        assert_eq!(parse_request(r#"{"op":"step"}"#), Ok(Request::Step { steps: 1 }));
    }

    #[test]
    fn it_rejects_malformed_lines() {
        assert!(parse_request("not json").is_err());
        assert!(parse_request(r#"{"op":"fly"}"#).is_err());
        assert!(parse_request(r#"{"op":"request_floor","floor":2.5,"direction":1}"#).is_err());
        assert!(parse_request(r#"{"op":"request_floor","floor":2}"#).is_err());
    }

    #[test]
    fn it_encodes_errors_with_a_kind() {
        let response: Response = DispatchError::invalid("steps must be at least 1").into();
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"error":{"kind":"invalid_argument","detail":"steps must be at least 1"}}"#
        );
    }
}
