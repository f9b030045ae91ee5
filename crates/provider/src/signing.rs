//! Request signing for the management API
//!
//! The platform authenticates each call with an HMAC-SHA1 over the sorted,
//! percent-encoded and lowercased parameter string.

use base64::Engine;
use cloudnet_common::{Error, Result};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

/// Canonical string that gets signed
pub fn canonical_query(params: &[(String, String)]) -> String {
    let mut pairs: Vec<(String, String)> = params
        .iter()
        .filter(|(key, _)| key != "signature")
        .map(|(key, value)| (key.to_lowercase(), encode_value(value)))
        .collect();
    pairs.sort();

    pairs
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&")
        .to_lowercase()
}

/// Base64 HMAC-SHA1 signature for a parameter set
pub fn sign(params: &[(String, String)], secret: &str) -> Result<String> {
    let mut mac = HmacSha1::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::InvalidConfig(format!("Unusable API secret: {}", e)))?;
    mac.update(canonical_query(params).as_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(base64::engine::general_purpose::STANDARD.encode(digest))
}

// Same escaping as java.net.URLEncoder, with %20 for spaces
fn encode_value(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%2A", "*")
        .replace('~', "%7E")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> Vec<(String, String)> {
        vec![
            ("command".to_string(), "listZones".to_string()),
            ("response".to_string(), "json".to_string()),
            ("apiKey".to_string(), "KEY".to_string()),
            ("name".to_string(), "a b*~".to_string()),
        ]
    }

    #[test]
    fn test_canonical_query() {
        assert_eq!(
            canonical_query(&params()),
            "apikey=key&command=listzones&name=a%20b*%7e&response=json"
        );
    }

    #[test]
    fn test_signature_ignores_existing_signature() {
        let mut signed = params();
        signed.push(("signature".to_string(), "stale".to_string()));
        assert_eq!(canonical_query(&signed), canonical_query(&params()));
    }

    #[test]
    fn test_known_signature() {
        assert_eq!(sign(&params(), "SECRET").unwrap(), "VMx2Ha89QyFAGcX4tjSbOlVBffs=");
    }
}
