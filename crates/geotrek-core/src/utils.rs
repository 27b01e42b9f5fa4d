//! Rounding, number formatting and text helpers

/// Round a value to a fixed number of decimal digits
#[inline]
pub fn round_to(value: f64, precision: u32) -> f64 {
    let factor = 10f64.powi(precision as i32);
    (value * factor).round() / factor
}

/// Format a float the way the partner feeds expect it: always with a decimal part
///
/// `3.0` becomes `"3.0"`, `46.5` stays `"46.5"`.
pub fn format_decimal(value: f64) -> String {
    let text = format!("{}", value);
    if text.contains('.') || text.contains('e') || !value.is_finite() {
        text
    } else {
        format!("{}.0", text)
    }
}

/// Remove markup tags from rich-text content and trim the result
///
/// This is a plain tag stripper, not an HTML parser. Only `&nbsp;`, `&lt;`, `&gt;`
/// and `&amp;` are decoded; other entities (`&eacute;`, `&#233;`) are kept verbatim,
/// and a literal `<` in text starts a tag that swallows up to the next `>`.
pub fn strip_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
        .trim()
        .to_string()
}

/// Build a URL-safe slug from a display name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for c in name.chars().flat_map(|c| c.to_lowercase()) {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        "-".to_string()
    } else {
        slug
    }
}

/// Join a base URL and an absolute path without doubling the separator
pub fn build_url(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(1.123456789, 7), 1.1234568);
        assert_eq!(round_to(141.42, 1), 141.4);
        assert_eq!(round_to(-0.5, 0), -1.0);
    }

    #[test]
    fn test_format_decimal() {
        assert_eq!(format_decimal(3.0), "3.0");
        assert_eq!(format_decimal(46.5), "46.5");
        assert_eq!(format_decimal(-1.25), "-1.25");
    }

    #[test]
    fn test_strip_html() {
        assert_eq!(strip_html("<p>description  Jolie</p>"), "description  Jolie");
        assert_eq!(strip_html("a &amp; b"), "a & b");
        assert_eq!(strip_html("plain"), "plain");
        assert_eq!(strip_html("&lt;b&gt;&nbsp;x "), "<b> x");
        assert_eq!(strip_html("caf&eacute; &#233;"), "caf&eacute; &#233;");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Voie Lactée du Col"), "voie-lact-e-du-col");
        assert_eq!(slugify("  Trek 1  "), "trek-1");
        assert_eq!(slugify("!!"), "-");
    }

    #[test]
    fn test_build_url() {
        assert_eq!(
            build_url("http://testserver/", "/api/en/treks/1/trek.gpx"),
            "http://testserver/api/en/treks/1/trek.gpx"
        );
        assert_eq!(build_url("", "/api"), "/api");
    }
}
