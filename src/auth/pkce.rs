//! PKCE verifier/challenge generation and query-string assembly.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Generate a PKCE code verifier: 32 random bytes, base64url-encoded
/// without padding (43 characters, within the 43..=128 range RFC 7636
/// allows).
pub fn generate_code_verifier() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes::<32>())
}

/// Compute the S256 code challenge for a verifier:
/// base64url(SHA-256(verifier)), no padding.
pub fn compute_code_challenge(verifier: &str) -> String {
    let digest = Sha256::digest(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

/// Generate a random hex `state` value of `byte_count` bytes.
pub fn random_state(byte_count: usize) -> String {
    let mut buf = vec![0u8; byte_count];
    fill_random(&mut buf);
    hex_encode(&buf)
}

/// Append percent-encoded query parameters to a base URL.
pub fn build_url_with_params(base: &str, params: &[(&str, &str)]) -> String {
    let mut url = base.to_string();
    url.push('?');
    for (i, (key, value)) in params.iter().enumerate() {
        if i > 0 {
            url.push('&');
        }
        url.push_str(&urlencoded(key));
        url.push('=');
        url.push_str(&urlencoded(value));
    }
    url
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut buf = [0u8; N];
    fill_random(&mut buf);
    buf
}

// Uuid v4 draws from the OS CSPRNG; chunking covers buffers past 16 bytes.
fn fill_random(buf: &mut [u8]) {
    for chunk in buf.chunks_mut(16) {
        let id = uuid::Uuid::new_v4();
        let bytes = id.as_bytes();
        let len = chunk.len().min(16);
        chunk[..len].copy_from_slice(&bytes[..len]);
    }
}

fn urlencoded(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => {
                out.push('%');
                out.push_str(&format!("{byte:02X}"));
            }
        }
    }
    out
}

fn hex_encode(data: &[u8]) -> String {
    let mut out = String::with_capacity(data.len() * 2);
    for byte in data {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verifier_is_43_chars_of_base64url() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 43);
        assert!(verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn challenge_matches_sha256_of_verifier() {
        let verifier = generate_code_verifier();
        let challenge = compute_code_challenge(&verifier);
        let expected = URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()));
        assert_eq!(challenge, expected);
    }

    #[test]
    fn verifiers_do_not_repeat() {
        let a = generate_code_verifier();
        let b = generate_code_verifier();
        assert_ne!(a, b);
    }

    #[test]
    fn state_is_hex_of_requested_length() {
        let state = random_state(32);
        assert_eq!(state.len(), 64);
        assert!(state.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn url_params_are_percent_encoded() {
        let url = build_url_with_params(
            "https://app.procore.com/oauth/authorize",
            &[("scope", "read write"), ("redirect_uri", "https://x/cb")],
        );
        assert_eq!(
            url,
            "https://app.procore.com/oauth/authorize?scope=read%20write&redirect_uri=https%3A%2F%2Fx%2Fcb"
        );
    }
}
