//! `sitemap.xml` generation.
//!
//! Lists every `.html` file in the output directory, in sorted path order:
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
//!   <url>
//!     <loc>https://webduino.io/tutorials/intro/intro.html</loc>
//!     <changefreq>daily</changefreq>
//!     <priority>0.5</priority>
//!   </url>
//! </urlset>
//! ```
//!
//! An `index.html` is listed as its directory URL. No `lastmod` is written,
//! so rebuilding unchanged input yields an identical file.

use crate::config::SitemapConfig;
use maud::{PreEscaped, html};
use std::fs;
use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// XML namespace for sitemap
const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

/// File name written into the output directory.
pub const SITEMAP_FILE: &str = "sitemap.xml";

/// `/`-separated paths of every `.html` file under `output`, sorted.
pub fn html_pages(output: &Path) -> io::Result<Vec<String>> {
    let mut pages = Vec::new();
    if !output.is_dir() {
        return Ok(pages);
    }
    for entry in WalkDir::new(output).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let is_html = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("html"))
            .unwrap_or(false);
        if entry.file_type().is_file() && is_html {
            let rel = path.strip_prefix(output).unwrap_or(path);
            pages.push(
                rel.components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/"),
            );
        }
    }
    pages.sort();
    Ok(pages)
}

/// Public URL of an output-relative page path.
pub fn page_url(site_url: &str, rel: &str) -> String {
    let path = match rel.strip_suffix("index.html") {
        Some(dir) if dir.is_empty() || dir.ends_with('/') => dir,
        _ => rel,
    };
    format!("{site_url}/{path}")
}

/// Render the sitemap document.
pub fn render_sitemap(site_url: &str, pages: &[String], config: &SitemapConfig) -> String {
    let priority = config.priority.to_string();
    let urlset = html! {
        urlset xmlns=(SITEMAP_NS) {
            @for page in pages {
                url {
                    loc { (page_url(site_url, page)) }
                    changefreq { (config.changefreq) }
                    priority { (priority) }
                }
            }
        }
    };
    let document = html! {
        (PreEscaped(XML_DECLARATION))
        "\n"
        (urlset)
        "\n"
    };
    document.into_string()
}

/// Write `sitemap.xml` into `output`, listing the pages found there.
///
/// Returns the number of URLs listed.
pub fn write_sitemap(output: &Path, site_url: &str, config: &SitemapConfig) -> io::Result<usize> {
    let pages = html_pages(output)?;
    fs::create_dir_all(output)?;
    fs::write(output.join(SITEMAP_FILE), render_sitemap(site_url, &pages, config))?;
    Ok(pages.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn index_maps_to_directory() {
        assert_eq!(page_url("https://a.io", "index.html"), "https://a.io/");
        assert_eq!(page_url("https://a.io", "docs/index.html"), "https://a.io/docs/");
        assert_eq!(
            page_url("https://a.io", "tutorials/intro/intro.html"),
            "https://a.io/tutorials/intro/intro.html"
        );
        // Only a whole `index.html` segment counts
        assert_eq!(page_url("https://a.io", "myindex.html"), "https://a.io/myindex.html");
    }

    #[test]
    fn empty_sitemap_has_urlset() {
        let xml = render_sitemap("https://a.io", &[], &SitemapConfig::default());
        assert!(xml.starts_with(XML_DECLARATION));
        assert!(xml.contains(&format!(r#"<urlset xmlns="{SITEMAP_NS}"></urlset>"#)));
        assert!(!xml.contains("<url>"));
    }

    #[test]
    fn entries_carry_changefreq_and_priority() {
        let pages = vec!["tutorials/a.html".to_string()];
        let xml = render_sitemap("https://a.io", &pages, &SitemapConfig::default());
        assert!(xml.contains(
            "<url><loc>https://a.io/tutorials/a.html</loc><changefreq>daily</changefreq><priority>0.5</priority></url>"
        ));
        assert!(!xml.contains("lastmod"));
    }

    #[test]
    fn loc_is_escaped() {
        let pages = vec!["a&b.html".to_string()];
        let xml = render_sitemap("https://a.io", &pages, &SitemapConfig::default());
        assert!(xml.contains("<loc>https://a.io/a&amp;b.html</loc>"));
    }

    #[test]
    fn write_sitemap_lists_sorted_html_only() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path();
        fs::create_dir_all(out.join("tutorials/b")).unwrap();
        fs::write(out.join("tutorials/b/b.html"), "").unwrap();
        fs::write(out.join("index.html"), "").unwrap();
        fs::write(out.join("style.css"), "").unwrap();

        let count = write_sitemap(out, "https://a.io", &SitemapConfig::default()).unwrap();
        assert_eq!(count, 2);
        let xml = fs::read_to_string(out.join(SITEMAP_FILE)).unwrap();
        let root = xml.find("<loc>https://a.io/</loc>").unwrap();
        let page = xml.find("<loc>https://a.io/tutorials/b/b.html</loc>").unwrap();
        assert!(root < page);
    }

    #[test]
    fn same_input_same_bytes() {
        let pages = vec!["x.html".to_string(), "y/index.html".to_string()];
        let config = SitemapConfig::default();
        assert_eq!(
            render_sitemap("https://a.io", &pages, &config),
            render_sitemap("https://a.io", &pages, &config)
        );
    }
}
