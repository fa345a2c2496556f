pub const SCRIPT_FILENAME: &str = "dcp-script.py";
pub const SCRIPTS_PREFIX: &str = "scripts";

pub fn script_object_key() -> String {
    format!("{SCRIPTS_PREFIX}/{SCRIPT_FILENAME}")
}

pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}
