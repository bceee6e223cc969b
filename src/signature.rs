//! Request signing
//!
//! The Platform authenticates a request by recomputing a SHA-256 digest over
//! the shared secret followed by every parameter as `name=value`, names in
//! sorted order. A request also carries an `expires` timestamp; the server
//! rejects it once that time has passed.

use std::collections::BTreeMap;

use chrono::Utc;
use sha2::{Digest, Sha256};

/// Seconds a signed request stays valid when the caller gave no `expires`.
pub const DEFAULT_EXPIRY_SECS: i64 = 30;

pub const EXPIRES_PARAM: &str = "expires";
pub const SIGNATURE_PARAM: &str = "signature";
pub const KEY_PARAM: &str = "key";

/// Hex SHA-256 of `secret` followed by `name=value` for each parameter.
///
/// `BTreeMap` iterates in byte order of the names, which is the order the
/// server sorts in.
pub fn generate_signature(secret: &str, params: &BTreeMap<String, String>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    for (name, value) in params {
        hasher.update(name.as_bytes());
        hasher.update(b"=");
        hasher.update(value.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// Add `expires` (if missing), `signature` and `key` to an encoded parameter set.
///
/// Any stale `signature` or `key` from a previous call is dropped first so it
/// never ends up in the signed string.
pub fn sign_params(api_key: &str, secret: &str, params: &mut BTreeMap<String, String>) {
    params.remove(SIGNATURE_PARAM);
    params.remove(KEY_PARAM);
    params
        .entry(EXPIRES_PARAM.to_string())
        .or_insert_with(|| (Utc::now().timestamp() + DEFAULT_EXPIRY_SECS).to_string());

    let signature = generate_signature(secret, params);
    params.insert(SIGNATURE_PARAM.to_string(), signature);
    params.insert(KEY_PARAM.to_string(), api_key.to_string());
}
