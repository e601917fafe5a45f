use hmac::{digest::InvalidLength, Hmac, Mac};
use log::trace;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 over the concatenation of `parts`, hex encoded.
pub fn calculate_hmac(secret: &str, parts: &[&[u8]]) -> Result<String, InvalidLength> {
    let mac = keyed_mac(secret, parts)?;
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks a hex-encoded HMAC-SHA256 signature over the concatenation of `parts`. The comparison is constant time.
pub fn verify_hmac(secret: &str, parts: &[&[u8]], signature_hex: &str) -> bool {
    let Ok(signature) = hex::decode(signature_hex.trim()) else {
        trace!("🔐️ Signature is not valid hex");
        return false;
    };
    keyed_mac(secret, parts).map(|mac| mac.verify_slice(&signature).is_ok()).unwrap_or(false)
}

fn keyed_mac(secret: &str, parts: &[&[u8]]) -> Result<HmacSha256, InvalidLength> {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())?;
    for part in parts {
        mac.update(part);
    }
    Ok(mac)
}
