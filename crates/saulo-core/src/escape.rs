/// Escape the five HTML-significant characters so `text` can be placed in markup.
///
/// Every other character passes through unchanged. Already-escaped input is
/// escaped again (`&amp;` becomes `&amp;amp;`).
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
