//! Key-pair authentication for the SQL REST API.

pub use jwt_simple::algorithms::RS256KeyPair;
use jwt_simple::prelude::*;

use crate::errors::SnowflakeResult;

/// Tokens are accepted for at most an hour; stay just under it.
const TOKEN_LIFETIME_MINS: u64 = 59;

/// The account locator without any region or cloud suffix, upper-cased:
/// `xy12345.us-east-1` becomes `XY12345`.
fn account_locator(account: &str) -> String {
    account
        .split('.')
        .next()
        .unwrap_or(account)
        .to_ascii_uppercase()
}

/// `SHA256:<base64>` of the public key, padded standard base64 as Snowflake stores it.
fn public_key_fingerprint(key_pair: &RS256KeyPair) -> String {
    let mut fingerprint = key_pair
        .public_key()
        .sha256_thumbprint()
        .replace('-', "+")
        .replace('_', "/");
    while fingerprint.len() % 4 != 0 {
        fingerprint.push('=');
    }
    format!("SHA256:{fingerprint}")
}

/// Sign a JWT for `user` in `account`.
///
/// The subject is `<ACCOUNT>.<USER>` and the issuer appends the public key
/// fingerprint to it.
pub(crate) fn create_token(
    key_pair: &RS256KeyPair,
    account: &str,
    user: &str,
) -> SnowflakeResult<String> {
    let subject = format!("{}.{}", account_locator(account), user.to_ascii_uppercase());
    let issuer = format!("{subject}.{}", public_key_fingerprint(key_pair));
    log::debug!("signing token for {issuer}");
    let claims = Claims::create(Duration::from_mins(TOKEN_LIFETIME_MINS))
        .with_issuer(issuer)
        .with_subject(subject);
    Ok(key_pair.sign(claims)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_verifies_and_names_the_user() -> SnowflakeResult<()> {
        let key = RS256KeyPair::generate(2048)?;
        let token = create_token(&key, "xy12345.us-east-1", "svc_user")?;
        let claims = key
            .public_key()
            .verify_token::<NoCustomClaims>(&token, None)?;
        assert_eq!(claims.subject.as_deref(), Some("XY12345.SVC_USER"));
        let issuer = claims.issuer.unwrap_or_default();
        assert!(issuer.starts_with("XY12345.SVC_USER.SHA256:"));
        assert!(issuer.ends_with('='));
        Ok(())
    }

    #[test]
    fn locator_drops_region() {
        assert_eq!(account_locator("abc.eu-west-1.aws"), "ABC");
        assert_eq!(account_locator("ORG-ACCT"), "ORG-ACCT");
    }
}
