//! Strips a rendered page down to the markup that carries readable text

use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};

/// Meta `name`/`property` prefixes worth keeping for the model
const RELEVANT_META: [&str; 7] = [
    "og:",
    "fb:",
    "twitter:",
    "article:",
    "description",
    "keywords",
    "title",
];

lazy_static! {
    static ref STYLES_AND_SCRIPTS: Selector = Selector::parse("style, script").unwrap();
    static ref HEAD_META: Selector = Selector::parse("head meta").unwrap();
    static ref HEAD_CHILDREN: Selector = Selector::parse("head > *").unwrap();
    static ref NON_TEXT: Selector = Selector::parse(
        "nav, footer, aside, form, input, button, iframe, noscript, svg, img, video"
    )
    .unwrap();
}

fn is_relevant_meta(name: Option<&str>) -> bool {
    match name {
        Some(name) => {
            let name = name.to_lowercase();
            RELEVANT_META.iter().any(|prefix| name.starts_with(prefix))
        }
        None => false,
    }
}

/// Detach every element matched by `selector` that `keep` rejects
fn remove_matching<F>(document: &mut Html, selector: &Selector, keep: F)
where
    F: Fn(&ElementRef<'_>) -> bool,
{
    let ids: Vec<_> = document
        .select(selector)
        .filter(|element| !keep(element))
        .map(|element| element.id())
        .collect();
    for id in ids {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

pub fn sanitize_html(html: &str) -> String {
    let mut document = Html::parse_document(html);

    remove_matching(&mut document, &STYLES_AND_SCRIPTS, |_| false);
    remove_matching(&mut document, &HEAD_META, |meta| {
        let attrs = meta.value();
        is_relevant_meta(attrs.attr("name").or_else(|| attrs.attr("property")))
    });
    remove_matching(&mut document, &HEAD_CHILDREN, |child| {
        matches!(child.value().name(), "meta" | "title")
    });
    remove_matching(&mut document, &NON_TEXT, |_| false);

    document.html()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Paris forecast</title>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width">
  <meta name="Description" content="Ten day forecast">
  <meta property="og:title" content="Paris">
  <link rel="stylesheet" href="/main.css">
  <style>body { color: red; }</style>
  <script>track()</script>
</head>
<body>
  <nav><a href="/">Home</a></nav>
  <main>
    <h1>Weather in Paris</h1>
    <p>Sunny with a high of 21°C.</p>
    <img src="sun.png">
    <svg><circle r="4"></circle></svg>
    <form><input name="q"><button>Go</button></form>
    <iframe src="https://ads.example.com"></iframe>
  </main>
  <aside>Related</aside>
  <footer>Cookies</footer>
  <noscript>Enable JS</noscript>
  <video src="clip.mp4"></video>
  <script>more()</script>
</body>
</html>"#;

    #[test]
    fn test_keeps_text_content() {
        let clean = sanitize_html(PAGE);
        assert!(clean.contains("<h1>Weather in Paris</h1>"));
        assert!(clean.contains("Sunny with a high of 21°C."));
        assert!(clean.contains("<title>Paris forecast</title>"));
    }

    #[test]
    fn test_removes_non_text_elements() {
        let clean = sanitize_html(PAGE);
        for tag in [
            "<script", "<style", "<nav", "<footer", "<aside", "<form", "<input", "<button",
            "<iframe", "<noscript", "<svg", "<img", "<video", "<link",
        ] {
            assert!(!clean.contains(tag), "{tag} should be removed");
        }
    }

    #[test]
    fn test_filters_head_meta() {
        let clean = sanitize_html(PAGE);
        assert!(clean.contains("Ten day forecast"));
        assert!(clean.contains("og:title"));
        assert!(!clean.contains("viewport"));
        assert!(!clean.contains("charset"));
    }

    #[test]
    fn test_relevant_meta_prefixes() {
        assert!(is_relevant_meta(Some("twitter:card")));
        assert!(is_relevant_meta(Some("KEYWORDS")));
        assert!(!is_relevant_meta(Some("robots")));
        assert!(!is_relevant_meta(None));
    }
}
