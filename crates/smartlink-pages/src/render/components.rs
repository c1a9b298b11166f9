//! Shared HTML pieces for SmartLink pages.

use maud::{Markup, PreEscaped, Render, html};

/// Inline CSS for static SmartLink pages.
pub const PAGE_CSS: &str = r#"
*{margin:0;padding:0;box-sizing:border-box}
:root{--bg:#0b0b10;--fg:#f2f2f5;--fg2:#a6a6b0;--accent:#1db954;--surface:#16161d}
body{font-family:Inter,-apple-system,BlinkMacSystemFont,"Segoe UI",Roboto,sans-serif;line-height:1.5;color:var(--fg);background:var(--bg);min-height:100vh;display:flex;align-items:center;justify-content:center;padding:1.5rem 1rem}
main{max-width:420px;width:100%;text-align:center}
a{color:var(--accent);text-decoration:none}
a:hover{text-decoration:underline}
.cover{width:100%;aspect-ratio:1;object-fit:cover;border-radius:12px;margin-bottom:1.25rem;background:var(--surface)}
.track{font-size:1.6rem;font-weight:700;letter-spacing:-.02em}
.artist{color:var(--fg2);font-size:1.05rem;margin-bottom:1.25rem}
.platforms{list-style:none;display:flex;flex-direction:column;gap:.5rem;margin-bottom:1.25rem}
.platforms a{display:block;padding:.65rem 1rem;border-radius:8px;background:var(--surface);color:var(--fg);font-weight:500}
.platforms a:hover{text-decoration:none;outline:1px solid var(--accent)}
.redirect{font-size:.85rem;color:var(--fg2)}
"#;

/// Content-Security-Policy for static pages.
///
/// The only script is the inline redirect; images may come from any HTTPS CDN.
pub const CSP_HEADER: &str = "default-src 'none'; style-src 'unsafe-inline'; script-src 'unsafe-inline'; img-src https: data:; form-action 'none'; frame-ancestors 'none'";

/// Text rendered with `& < > " '` escaped.
///
/// maud's own escaping leaves `'` untouched.
pub struct Escaped<'a>(pub &'a str);

impl Render for Escaped<'_> {
    fn render_to(&self, buffer: &mut String) {
        escape_into(self.0, buffer);
    }
}

/// Append `input` to `out`, HTML-escaped.
pub fn escape_into(input: &str, out: &mut String) {
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}

/// Open Graph / Twitter Card metadata for a page.
pub struct OpenGraphData<'a> {
    pub title: &'a str,
    pub description: &'a str,
    /// OG type, e.g. "music.song".
    pub og_type: &'a str,
    pub image: &'a str,
    pub url: &'a str,
    pub site_name: &'a str,
    /// Twitter card type ("summary", "summary_large_image").
    pub twitter_card_type: &'a str,
}

/// Render the `<meta>` tags crawlers read for link previews.
pub fn social_meta(og: &OpenGraphData<'_>) -> Markup {
    html! {
        // Open Graph
        meta property="og:type" content=(og.og_type);
        meta property="og:title" content=(Escaped(og.title));
        meta property="og:description" content=(Escaped(og.description));
        meta property="og:image" content=(Escaped(og.image));
        meta property="og:url" content=(Escaped(og.url));
        meta property="og:site_name" content=(Escaped(og.site_name));

        // Twitter Card
        meta name="twitter:card" content=(og.twitter_card_type);
        meta name="twitter:title" content=(Escaped(og.title));
        meta name="twitter:description" content=(Escaped(og.description));
        meta name="twitter:image" content=(Escaped(og.image));
    }
}

/// Inline script sending visitors to `target` after `delay_ms`.
///
/// `target` is embedded as a JSON string literal.
pub fn redirect_script(target: &str, delay_ms: u64) -> Markup {
    let literal = serde_json::to_string(target).unwrap_or_else(|_| "\"/\"".to_string());
    let js = format!("setTimeout(function(){{window.location.replace({literal});}},{delay_ms});");
    html! {
        script { (PreEscaped(js)) }
    }
}

/// Check if a URL is safe to use in `src` or `href` attributes.
pub fn is_safe_url(url: &str) -> bool {
    url.starts_with("https://") || url.starts_with("http://")
}

/// Truncate a string to a maximum byte length, appending "..." if truncated.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let mut end = max_len;
        while !s.is_char_boundary(end) && end > 0 {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}
