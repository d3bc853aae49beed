//! Outbound request signing.
//!
//! The signing string is `"{application_id}:{epoch}:{application_key}:{body}"`,
//! suffixed with `":{remote_ip}"` only when a remote IP is present. The request
//! secret is `base64(HMAC-SHA256(api_key, signing_string))`.

use std::fmt;

use crate::signing::mac::hmac_sha256_base64;

/// Everything that feeds the signing string for one call.
#[derive(Clone, Copy)]
pub struct SigningInput<'a> {
    pub application_id: i64,
    pub epoch: i64,
    pub application_key: &'a str,
    /// Canonical JSON body, or `""` for body-less calls.
    pub body: &'a str,
    pub remote_ip: Option<&'a str>,
}

impl SigningInput<'_> {
    /// Remote IP that takes part in signing, ignoring empty values.
    fn effective_remote_ip(&self) -> Option<&str> {
        self.remote_ip.filter(|ip| !ip.is_empty())
    }

    /// Assemble the exact text the service recomputes.
    pub fn signing_string(&self) -> String {
        let mut out = format!(
            "{}:{}:{}:{}",
            self.application_id, self.epoch, self.application_key, self.body
        );
        if let Some(ip) = self.effective_remote_ip() {
            out.push(':');
            out.push_str(ip);
        }
        out
    }
}

/// The authentication surface presented to the service.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestSignature {
    pub application_id: i64,
    pub epoch: i64,
    pub request_secret: String,
    pub remote_ip: Option<String>,
}

impl fmt::Debug for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSignature")
            .field("application_id", &self.application_id)
            .field("epoch", &self.epoch)
            .field("request_secret", &"<redacted>")
            .field("remote_ip", &self.remote_ip)
            .finish()
    }
}

/// Sign one outbound call with the API key.
pub fn sign_request(input: &SigningInput<'_>, api_key: &[u8]) -> RequestSignature {
    let request_secret = hmac_sha256_base64(api_key, &input.signing_string());

    RequestSignature {
        application_id: input.application_id,
        epoch: input.epoch,
        request_secret,
        remote_ip: input.effective_remote_ip().map(str::to_owned),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{"UserName":"alice"}"#;

    fn input(remote_ip: Option<&'static str>) -> SigningInput<'static> {
        SigningInput {
            application_id: 42,
            epoch: 1_700_000_000,
            application_key: "app-key",
            body: BODY,
            remote_ip,
        }
    }

    #[test]
    fn test_signing_string_without_ip() {
        assert_eq!(
            input(None).signing_string(),
            r#"42:1700000000:app-key:{"UserName":"alice"}"#
        );
    }

    #[test]
    fn test_signing_string_with_ip() {
        assert_eq!(
            input(Some("203.0.113.7")).signing_string(),
            r#"42:1700000000:app-key:{"UserName":"alice"}:203.0.113.7"#
        );
    }

    #[test]
    fn test_empty_ip_adds_no_suffix() {
        assert_eq!(input(Some("")).signing_string(), input(None).signing_string());
        assert_eq!(sign_request(&input(Some("")), b"api-key").remote_ip, None);
    }

    #[test]
    fn test_known_request_secret() {
        let sig = sign_request(&input(None), b"api-key");
        assert_eq!(sig.request_secret, "3pTGXt+43VkNIY1Hbw+pI67I7lbSq8GhQLRj37VzO/g=");
        assert_eq!(sig.application_id, 42);
        assert_eq!(sig.epoch, 1_700_000_000);

        let sig = sign_request(&input(Some("203.0.113.7")), b"api-key");
        assert_eq!(sig.request_secret, "IVN85LI5pqBqnSYorOuB8v3BK2PDyEwWV3tPcH9NuK8=");
        assert_eq!(sig.remote_ip.as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_body_change_changes_secret() {
        let original = sign_request(&input(None), b"api-key");
        let tampered = sign_request(
            &SigningInput {
                body: r#"{"UserName":"alicf"}"#,
                ..input(None)
            },
            b"api-key",
        );
        assert_ne!(original.request_secret, tampered.request_secret);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let sig = sign_request(&input(None), b"api-key");
        let rendered = format!("{:?}", sig);
        assert!(!rendered.contains(&sig.request_secret));
        assert!(rendered.contains("<redacted>"));
    }
}
