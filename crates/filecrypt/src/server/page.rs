//! The upload page served at `GET /` and redrawn after a browser submit.

use common::protocol::Operation;

/// Two multipart forms posting to `/`, one per operation.
///
/// `{encrypt_notice}` and `{decrypt_notice}` mark where the outcome of the
/// last submit is shown.
const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>AES File Encrypt &amp; Decrypt</title>
</head>
<body>
<h2>AES File Encrypt &amp; Decrypt</h2>

<form method="POST" action="/" enctype="multipart/form-data">
    <h4>Encrypt a file</h4>
    {encrypt_notice}
    <input type="hidden" name="form_type" value="encrypt">
    <label>File: <input type="file" name="file" required></label><br>
    <label>Key: <input type="text" name="key" required></label><br>
    <small>Keys may be any length. Legacy envelopes only use the first 16 bytes.</small><br>
    <label>Format:
        <select name="format">
            <option value="legacy-cbc">legacy-cbc</option>
            <option value="sealed-v1">sealed-v1 (authenticated)</option>
        </select>
    </label><br>
    <button type="submit">Encrypt</button>
</form>

<form method="POST" action="/" enctype="multipart/form-data">
    <h4>Decrypt a file</h4>
    {decrypt_notice}
    <input type="hidden" name="form_type" value="decrypt">
    <label>File (.enc): <input type="file" name="file" required></label><br>
    <label>Key: <input type="text" name="key" required></label><br>
    <small>The key must match the one used to encrypt.</small><br>
    <label>Format:
        <select name="format">
            <option value="legacy-cbc">legacy-cbc</option>
            <option value="sealed-v1">sealed-v1 (authenticated)</option>
        </select>
    </label><br>
    <button type="submit">Decrypt</button>
</form>
</body>
</html>
"#;

/// Outcome of a submit, shown above the form that was submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Success { filename: String, download_url: String },
    Failure { message: String },
}

impl Notice {
    fn to_html(&self, op: Operation) -> String {
        match self {
            Notice::Success {
                filename,
                download_url,
            } => format!(
                r#"<div class="alert alert-success" role="alert">{} succeeded! <a href="{}">Download {}</a></div>"#,
                capitalised(op),
                escape(download_url),
                escape(filename),
            ),
            Notice::Failure { message } => format!(
                r#"<div class="alert alert-danger" role="alert">Error: {}</div>"#,
                escape(message)
            ),
        }
    }
}

/// Render the page, with `notice` shown in the card for `op`.
pub fn render(notice: Option<(Operation, &Notice)>) -> String {
    let (encrypt, decrypt) = match notice {
        Some((op @ Operation::Encrypt, n)) => (n.to_html(op), String::new()),
        Some((op @ Operation::Decrypt, n)) => (String::new(), n.to_html(op)),
        None => (String::new(), String::new()),
    };
    INDEX_HTML
        .replace("{encrypt_notice}", &encrypt)
        .replace("{decrypt_notice}", &decrypt)
}

fn capitalised(op: Operation) -> &'static str {
    match op {
        Operation::Encrypt => "Encryption",
        Operation::Decrypt => "Decryption",
    }
}

// Messages can echo client input (e.g. an unknown format name).
fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}
