//! Inline-style and link helpers. Alert templates carry their structure in
//! `style` attributes rather than class names, so most strategies key on
//! font size, weight and colour.

use std::sync::OnceLock;

use regex::Regex;
use scraper::ElementRef;
use url::Url;

/// Lowercased `style` attribute with all whitespace removed.
pub fn style_of(el: ElementRef<'_>) -> String {
    el.value()
        .attr("style")
        .map(|s| s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase())
        .unwrap_or_default()
}

pub fn has_style(el: ElementRef<'_>) -> bool {
    !style_of(el).is_empty()
}

fn font_size_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"font-size:(\d+(?:\.\d+)?)(px|pt)?").unwrap())
}

/// Font size in px from a normalised style string; pt is converted.
pub fn font_size_px(style: &str) -> Option<f32> {
    let caps = font_size_regex().captures(style)?;
    let value: f32 = caps.get(1)?.as_str().parse().ok()?;
    match caps.get(2).map(|m| m.as_str()) {
        Some("pt") => Some(value * 4.0 / 3.0),
        _ => Some(value),
    }
}

pub fn element_font_px(el: ElementRef<'_>) -> Option<f32> {
    font_size_px(&style_of(el))
}

pub fn is_bold(style: &str) -> bool {
    ["font-weight:bold", "font-weight:bolder", "font-weight:600", "font-weight:700", "font-weight:800", "font-weight:900"]
        .iter()
        .any(|w| style.contains(w))
}

/// `#abc` → `#aabbcc`, lowercased; other values are only lowercased.
fn expand_hex(value: &str) -> String {
    let v = value.trim().trim_end_matches("!important").to_lowercase();
    match v.strip_prefix('#') {
        Some(digits) if digits.len() == 3 && digits.chars().all(|c| c.is_ascii_hexdigit()) => {
            let mut out = String::from("#");
            for c in digits.chars() {
                out.push(c);
                out.push(c);
            }
            out
        }
        _ => v,
    }
}

/// Whether the `color` declaration (not `background-color` and the like)
/// equals `hex`, in either the `#abc` or `#aabbcc` spelling.
pub fn has_color(style: &str, hex: &str) -> bool {
    let wanted = expand_hex(hex);
    style
        .split(';')
        .filter_map(|decl| decl.split_once(':'))
        .any(|(prop, value)| prop.trim() == "color" && expand_hex(value) == wanted)
}

/// Follow known link-wrapping redirectors (Outlook SafeLinks, Scholar
/// redirects) to the real target.
pub fn resolve_href(href: &str) -> String {
    let href = href.trim();
    let wrapped = href.contains("safelinks.protection.outlook.com")
        || (href.contains("scholar.google.") && href.contains("url="));
    if !wrapped {
        return href.to_string();
    }
    Url::parse(href)
        .ok()
        .and_then(|u| u.query_pairs().find(|(k, _)| k == "url").map(|(_, v)| v.into_owned()))
        .unwrap_or_else(|| href.to_string())
}

/// Host of a (resolved) link, lowercased, without `www.`.
pub fn host_of(href: &str) -> Option<String> {
    let url = Url::parse(href).ok()?;
    let host = url.host_str()?.to_lowercase();
    Some(host.trim_start_matches("www.").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_matches_only_the_color_property() {
        assert!(has_color("color:#006621;line-height:18px", "#006621"));
        assert!(has_color("font-size:13px;color:#060", "#006600"));
        assert!(has_color("color:#AABBCC", "#abc"));
        assert!(!has_color("background-color:#006621", "#006621"));
        assert!(!has_color("color:#222", "#006621"));
    }

    #[test]
    fn test_font_size_units() {
        assert_eq!(font_size_px("color:#000;font-size:18px;"), Some(18.0));
        assert_eq!(font_size_px("font-size:12pt"), Some(16.0));
        assert_eq!(font_size_px("font-size:15"), Some(15.0));
        assert_eq!(font_size_px("color:red"), None);
    }

    #[test]
    fn test_bold_detection() {
        assert!(is_bold("font-weight:700;color:#333"));
        assert!(is_bold("font-weight:bold"));
        assert!(!is_bold("font-weight:400"));
    }

    #[test]
    fn test_safelinks_are_unwrapped() {
        let wrapped = "https://nam02.safelinks.protection.outlook.com/?url=https%3A%2F%2Fwww.ahajournals.org%2Fdoi%2F10.1161%2FCIRCRESAHA.124.324567&data=05%7C02";
        assert_eq!(resolve_href(wrapped), "https://www.ahajournals.org/doi/10.1161/CIRCRESAHA.124.324567");
        assert_eq!(resolve_href("https://example.org/a"), "https://example.org/a");
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://www.biorxiv.org/content/10.1101/2024.01.01.1v1").as_deref(), Some("biorxiv.org"));
        assert_eq!(host_of("not a url"), None);
    }
}
