// src/utils/html.rs

/// Sanitizes lesson bodies, which clients render as HTML.
///
/// Whitelist-based: safe tags such as <b> or <p> survive, <script> and
/// <iframe> are removed together with their content, and event-handler
/// attributes are stripped. Plain-text fields (titles, question text,
/// answers) are stored verbatim and never pass through here.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_scripts_keeps_formatting() {
        let cleaned = clean_html("<p>Borrowing</p><script>alert(1)</script>");

        assert_eq!(cleaned, "<p>Borrowing</p>");
    }

    #[test]
    fn strips_event_handlers() {
        let cleaned = clean_html(r#"<img src="a.png" onerror="alert(1)">"#);

        assert!(!cleaned.contains("onerror"));
    }

    #[test]
    fn plain_text_is_unchanged() {
        assert_eq!(clean_html("Lifetimes"), "Lifetimes");
    }
}
