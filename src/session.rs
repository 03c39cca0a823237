//! Stateless cookie sessions, one codec per portal.
//!
//! The session payload is serialized to JSON, sealed with AES-256-GCM under
//! a per-role server key, and shipped as `base64url(nonce || ciphertext)` in
//! an `HttpOnly` cookie. There is no server-side session table: logout just
//! clears the cookie, and a stolen cookie stays valid until it expires.
//! Tampering, a wrong key, or garbage input all decode to "no session".
//! The codec never reports *why* a cookie was rejected.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use anyhow::bail;
use axum::http::HeaderValue;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::err::Error;

/// 7 days, matching the cookie's `Max-Age`.
pub const SESSION_TTL_SECS: u64 = 604_800;

const NONCE_LEN: usize = 12;

/// A decoded session is only authenticated when the logged-in flag is set
/// AND the role identifier is present; either alone is not enough.
pub trait SessionPayload {
    fn account_id(&self) -> Option<Uuid>;
    fn email(&self) -> &str;

    fn is_authenticated(&self) -> bool;
}

#[derive(Clone)]
pub struct SessionCodec {
    cookie_name: &'static str,
    cipher: Aes256Gcm,
    secure: bool,
}

impl SessionCodec {
    /// `key` must be exactly 32 bytes; anything else is a startup error, not
    /// something to limp along with.
    pub fn new(cookie_name: &'static str, key: &[u8], secure: bool) -> anyhow::Result<Self> {
        if key.len() != 32 {
            bail!(
                "session key for cookie `{}` must be 32 bytes, got {}",
                cookie_name,
                key.len()
            );
        }
        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|err| anyhow::anyhow!("cipher init for `{cookie_name}`: {err}"))?;
        Ok(Self {
            cookie_name,
            cipher,
            secure,
        })
    }

    pub fn cookie_name(&self) -> &'static str {
        self.cookie_name
    }

    /// Decodes this codec's cookie out of a raw `Cookie` request header.
    /// Absence, tamper, and decryption failure are all `None`.
    pub fn load<P: DeserializeOwned>(&self, cookie_header: Option<&str>) -> Option<P> {
        let raw = cookie_value(cookie_header?, self.cookie_name)?;
        let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
        if bytes.len() <= NONCE_LEN {
            return None;
        }
        let (nonce, ciphertext) = bytes.split_at(NONCE_LEN);
        let plain = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .ok()?;
        serde_json::from_slice(&plain).ok()
    }

    /// Seals `payload` into a `Set-Cookie` header value with the fixed
    /// attribute set (`HttpOnly`, `SameSite=Lax`, 7-day `Max-Age`, `Secure`
    /// in production).
    pub fn issue<P: Serialize>(&self, payload: &P) -> Result<HeaderValue, Error> {
        let plain = serde_json::to_vec(payload).map_err(Error::internal)?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plain.as_slice())
            .map_err(Error::internal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);

        let cookie = format!(
            "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax{}",
            self.cookie_name,
            URL_SAFE_NO_PAD.encode(sealed),
            SESSION_TTL_SECS,
            if self.secure { "; Secure" } else { "" },
        );
        HeaderValue::from_str(&cookie).map_err(Error::internal)
    }

    /// `Set-Cookie` value that expires this codec's cookie immediately.
    pub fn clear(&self) -> HeaderValue {
        let cookie = format!(
            "{}=; Max-Age=0; Path=/; HttpOnly; SameSite=Lax{}",
            self.cookie_name,
            if self.secure { "; Secure" } else { "" },
        );
        // Static name and attributes only, always a valid header value.
        HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
    }
}

fn cookie_value<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header.split(';').find_map(|pair| {
        let (k, v) = pair.trim().split_once('=')?;
        (k == name).then_some(v)
    })
}
