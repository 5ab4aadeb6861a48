use std::io::Write;

use reqwest::Method;

fn ansi_wrap(text: &str, prefix: &str, suffix: &str) -> String {
    format!("{prefix}{text}{suffix}")
}

fn cyan(text: &str) -> String {
    ansi_wrap(text, "\x1b[36m", "\x1b[39m")
}

fn dim(text: &str) -> String {
    ansi_wrap(text, "\x1b[2m", "\x1b[22m")
}

/// Re-indents a JSON body for display; non-JSON bodies are returned as-is.
pub fn pretty_body(body: &[u8]) -> String {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => serde_json::to_string_pretty(&value)
            .unwrap_or_else(|_| String::from_utf8_lossy(body).into_owned()),
        Err(_) => String::from_utf8_lossy(body).into_owned(),
    }
}

pub(crate) fn trace_request(method: &Method, url: &str, body: Option<&[u8]>) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", cyan(&format!("URL: {method} {url}")));
    if let Some(body) = body {
        let _ = writeln!(stderr, "{}", pretty_body(body));
    }
}

pub(crate) fn trace_response(status: u16, body: &[u8]) {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "{}", dim(&format!("status: {status}")));
    let _ = writeln!(stderr, "{}", pretty_body(body));
}

#[cfg(test)]
mod tests {
    use super::pretty_body;

    #[test]
    fn pretty_body_indents_json() {
        let rendered = pretty_body(br#"{"id":"run_1","status":"queued"}"#);
        assert_eq!(rendered, "{\n  \"id\": \"run_1\",\n  \"status\": \"queued\"\n}");
    }

    #[test]
    fn pretty_body_keeps_plain_text() {
        assert_eq!(pretty_body(b"bad gateway"), "bad gateway");
    }
}
