// Copyright (c) 2020 White Leaf
//
// This software is released under the MIT License.
// https://opensource.org/licenses/MIT

/// Escape text so it can be placed inside HTML markup
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }

    escaped
}

/// Drop tags and undo `escape`, used to show HTML replies on a terminal
pub fn strip_tags(markup: &str) -> String {
    let mut text = String::with_capacity(markup.len());
    let mut in_tag = false;

    for c in markup.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_markup() {
        assert_eq!(
            escape("<b>Fathers & Sons</b>"),
            "&lt;b&gt;Fathers &amp; Sons&lt;/b&gt;"
        );
        assert_eq!(escape("Leo Tolstoy"), "Leo Tolstoy");
    }

    #[test]
    fn strip_markup() {
        let markup = format!("📖 <b>{}</b>\nAuthor: X", escape("Fathers & Sons"));
        assert_eq!(strip_tags(&markup), "📖 Fathers & Sons\nAuthor: X");
    }
}
