//! Placeholder substitution for the bundled Glue ETL script.

use sha2::{Digest, Sha256};

pub const CURATED_BUCKET_PLACEHOLDER: &str = "GLUE_CURATED_BUCKET";
pub const ACCOUNT_ID_PLACEHOLDER: &str = "ACCOUNT_ID";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptParameters {
    pub curated_bucket: String,
    pub account_id: String,
}

/// Replaces every curated-bucket token, then every account-id token.
///
/// Values are inserted verbatim. The account-id pass runs over the output of
/// the bucket pass, so a bucket name containing `ACCOUNT_ID` is rewritten too.
pub fn render_script(template: &str, params: &ScriptParameters) -> String {
    template
        .replace(CURATED_BUCKET_PLACEHOLDER, &params.curated_bucket)
        .replace(ACCOUNT_ID_PLACEHOLDER, &params.account_id)
}

pub fn script_fingerprint(body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(body.as_bytes());
    format!("{:x}", hasher.finalize())
}
