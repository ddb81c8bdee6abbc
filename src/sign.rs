use md5::{Digest, Md5};
use rand::Rng;

/// Hex md5 over `app_key + word + salt + secret_key`, the scheme openapi.youdao.com expects.
pub fn sign(app_key: &str, secret_key: &str, word: &str, salt: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(app_key.as_bytes());
    hasher.update(word.as_bytes());
    hasher.update(salt.as_bytes());
    hasher.update(secret_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// A new salt for every request.
pub fn fresh_salt() -> String {
    rand::thread_rng().gen_range(1..=65536u32).to_string()
}
