//! Build failures rendered as CSS
//!
//! A stylesheet request always gets a stylesheet back. When the build
//! fails, the error text is shown on the page through `body:before`.

use crate::error::ShowcaseError;

/// Render an error as a single CSS rule displaying its text
pub fn render_error(err: &ShowcaseError) -> String {
    let message = match err {
        ShowcaseError::Build { message } => message.clone(),
        other => other.diagnostic(),
    };
    render_message(&message)
}

/// Render arbitrary text as a diagnostic stylesheet
pub fn render_message(message: &str) -> String {
    format!(
        "body:before{{white-space: pre; content:\"{}\";}}",
        escape_css_string(message)
    )
}

/// Escape text for use inside a double-quoted CSS string
///
/// Newlines become `\A ` (the trailing space ends the hex escape so a
/// following hex digit is not swallowed).
pub fn escape_css_string(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\A "),
            '\r' => {}
            c if c.is_control() => out.push_str(&format!("\\{:X} ", c as u32)),
            c => out.push(c),
        }
    }
    out
}
