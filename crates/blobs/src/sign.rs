//! V4 query signing for upload URLs (`GOOG4-HMAC-SHA256`).
//!
//! Builds the canonical request / string-to-sign / derived-key chain for a
//! single signed PUT against `storage.googleapis.com`, using an HMAC
//! interoperability key. Only the `host` header is signed so the uploading
//! client stays free to set its own content headers.

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

const ALGORITHM: &str = "GOOG4-HMAC-SHA256";
const HOST: &str = "storage.googleapis.com";
const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

/// HMAC interoperability key for signing.
#[derive(Debug, Clone)]
pub struct HmacKey {
    pub access_id: String,
    pub secret: String,
}

/// Produce a signed PUT URL for `{bucket}/{path}` valid for `expires_secs`.
pub fn signed_put_url(
    key: &HmacKey,
    bucket: &str,
    path: &str,
    expires_secs: u64,
    now: DateTime<Utc>,
) -> String {
    let datetime = now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = now.format("%Y%m%d").to_string();
    let scope = format!("{date}/auto/storage/goog4_request");
    let credential = format!("{}/{scope}", key.access_id);

    // Query parameters, already in sorted order.
    let canonical_query = [
        ("X-Goog-Algorithm", ALGORITHM.to_string()),
        ("X-Goog-Credential", credential),
        ("X-Goog-Date", datetime.clone()),
        ("X-Goog-Expires", expires_secs.to_string()),
        ("X-Goog-SignedHeaders", "host".to_string()),
    ]
    .iter()
    .map(|(name, value)| format!("{name}={}", percent_encode(value, false)))
    .collect::<Vec<_>>()
    .join("&");

    let canonical_path = format!("/{bucket}/{}", percent_encode(path, true));
    let canonical_request = format!(
        "PUT\n{canonical_path}\n{canonical_query}\nhost:{HOST}\n\nhost\n{UNSIGNED_PAYLOAD}"
    );

    let string_to_sign = format!(
        "{ALGORITHM}\n{datetime}\n{scope}\n{}",
        hex(&Sha256::digest(canonical_request.as_bytes()))
    );

    let signature = hex(&hmac_sha256(
        &derive_signing_key(&key.secret, &date),
        string_to_sign.as_bytes(),
    ));

    format!("https://{HOST}{canonical_path}?{canonical_query}&X-Goog-Signature={signature}")
}

/// Key derivation chain: date -> region -> service -> request type.
fn derive_signing_key(secret: &str, date: &str) -> Vec<u8> {
    let mut key = hmac_sha256(format!("GOOG4{secret}").as_bytes(), date.as_bytes());
    for step in ["auto", "storage", "goog4_request"] {
        key = hmac_sha256(&key, step.as_bytes());
    }
    key
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac =
        Hmac::<Sha256>::new_from_slice(key).expect("HMAC accepts keys of any length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// RFC 3986 percent-encoding over the unreserved set; `keep_slashes`
/// preserves `/` for path components.
fn percent_encode(input: &str, keep_slashes: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        let keep = byte.is_ascii_alphanumeric()
            || matches!(byte, b'-' | b'_' | b'.' | b'~')
            || (keep_slashes && byte == b'/');
        if keep {
            out.push(byte as char);
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn test_key() -> HmacKey {
        HmacKey {
            access_id: "GOOG1EXAMPLEACCESSID".to_string(),
            secret: "example-secret".to_string(),
        }
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn url_carries_all_signing_parameters() {
        let url = signed_put_url(
            &test_key(),
            "studio-bucket",
            "training/u1/c1/image-0.png",
            900,
            fixed_now(),
        );

        assert!(url.starts_with(
            "https://storage.googleapis.com/studio-bucket/training/u1/c1/image-0.png?"
        ));
        assert!(url.contains("X-Goog-Algorithm=GOOG4-HMAC-SHA256"));
        assert!(url.contains("X-Goog-Credential=GOOG1EXAMPLEACCESSID%2F20250601%2Fauto%2Fstorage%2Fgoog4_request"));
        assert!(url.contains("X-Goog-Date=20250601T120000Z"));
        assert!(url.contains("X-Goog-Expires=900"));
        assert!(url.contains("X-Goog-SignedHeaders=host"));

        let signature = url.rsplit("X-Goog-Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_is_deterministic_for_fixed_inputs() {
        let a = signed_put_url(&test_key(), "b", "p/o.png", 600, fixed_now());
        let b = signed_put_url(&test_key(), "b", "p/o.png", 600, fixed_now());
        assert_eq!(a, b);
    }

    #[test]
    fn signature_changes_with_the_object() {
        let a = signed_put_url(&test_key(), "b", "p/one.png", 600, fixed_now());
        let b = signed_put_url(&test_key(), "b", "p/two.png", 600, fixed_now());
        assert_ne!(
            a.rsplit("X-Goog-Signature=").next(),
            b.rsplit("X-Goog-Signature=").next()
        );
    }

    #[test]
    fn percent_encoding_preserves_path_slashes_only() {
        assert_eq!(percent_encode("a/b c", true), "a/b%20c");
        assert_eq!(percent_encode("a/b c", false), "a%2Fb%20c");
        assert_eq!(percent_encode("safe-chars_.~", false), "safe-chars_.~");
    }
}
