//! Postal code (CEP) request parsing and validation.
//!
//! Both services run the same check: the body must deserialize as
//! `{"cep": "<string>"}` and the code must be exactly eight ASCII digits.

use crate::error::CepError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const CEP_LEN: usize = 8;

/// Wire shape of the inbound body, also used for the forwarded call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CepRequest {
    pub cep: String,
}

impl CepRequest {
    /// Parses a raw request body into a validated [`PostalCode`].
    pub fn parse(body: &[u8]) -> Result<PostalCode, CepError> {
        let request: CepRequest = serde_json::from_slice(body).map_err(CepError::InvalidRequest)?;
        request.cep.parse()
    }
}

impl From<&PostalCode> for CepRequest {
    fn from(code: &PostalCode) -> Self {
        Self {
            cep: code.0.clone(),
        }
    }
}

/// An eight digit postal code. Only constructed through validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostalCode(String);

impl PostalCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PostalCode {
    type Err = CepError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        if raw.len() == CEP_LEN && raw.bytes().all(|b| b.is_ascii_digit()) {
            Ok(Self(raw.to_owned()))
        } else {
            Err(CepError::InvalidFormat)
        }
    }
}

impl fmt::Display for PostalCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_eight_digits() {
        let code = CepRequest::parse(br#"{"cep":"01001000"}"#).unwrap();
        assert_eq!(code.as_str(), "01001000");
        assert_eq!(code.to_string(), "01001000");
    }

    #[test]
    fn test_rejects_wrong_length_or_non_digits() {
        for raw in ["", "123", "0100100", "010010000", "0100100a", "01001-00", " 1001000", "０１００１０００"] {
            assert!(
                matches!(raw.parse::<PostalCode>(), Err(CepError::InvalidFormat)),
                "{raw:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_multibyte_string_of_eight_bytes() {
        // four two-byte characters
        assert!(matches!(
            "éééé".parse::<PostalCode>(),
            Err(CepError::InvalidFormat)
        ));
    }

    #[test]
    fn test_malformed_body_is_invalid_request() {
        let bodies: [&[u8]; 4] = [
            b"not json",
            br#"{"cep": 1001000}"#,
            br#"{"zip":"01001000"}"#,
            b"",
        ];
        for body in bodies {
            assert!(matches!(
                CepRequest::parse(body),
                Err(CepError::InvalidRequest(_))
            ));
        }
    }

    #[test]
    fn test_short_code_in_valid_body_is_invalid_format() {
        assert!(matches!(
            CepRequest::parse(br#"{"cep":"123"}"#),
            Err(CepError::InvalidFormat)
        ));
    }

    #[test]
    fn test_forwarded_body_shape() {
        let code: PostalCode = "22041001".parse().unwrap();
        let body = serde_json::to_value(CepRequest::from(&code)).unwrap();
        assert_eq!(body, serde_json::json!({ "cep": "22041001" }));
    }
}
