//! Output file naming.
//!
//! Encrypted files get a `.enc` suffix. Decrypted files drop a trailing
//! `.enc` and get `.dec`, so `report.pdf.enc` becomes `report.pdf.dec` and
//! `report.pdf` becomes `report.pdf.dec`.

use common::protocol::Operation;

pub const ENCRYPTED_SUFFIX: &str = ".enc";
pub const DECRYPTED_SUFFIX: &str = ".dec";

const FALLBACK_NAME: &str = "upload";

/// Reduce a client-supplied file name to a safe single path component.
///
/// Keeps only the last `/`- or `\`-separated component, replaces every character
/// outside `[A-Za-z0-9._-]` with `_`, and strips leading dots.
pub fn sanitize(raw: &str) -> String {
    let last = raw.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or_default();
    let cleaned: String = last
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_owned()
    } else {
        trimmed.to_owned()
    }
}

/// Whether `name` can be used as-is to address a stored artifact.
pub fn is_safe(name: &str) -> bool {
    !name.is_empty() && sanitize(name) == name
}

/// Name under which the result of `op` on `input_name` is stored.
pub fn output_name(op: Operation, input_name: &str) -> String {
    match op {
        Operation::Encrypt => format!("{input_name}{ENCRYPTED_SUFFIX}"),
        Operation::Decrypt => {
            let stem = input_name
                .strip_suffix(ENCRYPTED_SUFFIX)
                .filter(|s| !s.is_empty())
                .unwrap_or(input_name);
            format!("{stem}{DECRYPTED_SUFFIX}")
        }
    }
}
