/// Escape user-supplied text before it is rendered as markup.
///
/// Ampersand must be replaced first, otherwise the entities produced by the
/// later replacements would themselves be escaped.
pub fn sanitize(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_script_tag() {
        assert_eq!(
            sanitize("<script>&\"</script>"),
            "&lt;script&gt;&amp;&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_no_double_escaping() {
        // If '<' were replaced before '&', the '&' of '&lt;' would get
        // re-escaped into '&amp;lt;'.
        let out = sanitize("a < b & c");
        assert_eq!(out, "a &lt; b &amp; c");
        assert!(!out.contains("&amp;amp;"));
        assert!(!out.contains("&amp;lt;"));
    }

    #[test]
    fn test_plain_text_untouched() {
        assert_eq!(sanitize("dock 12 looks empty"), "dock 12 looks empty");
    }
}
