//! Remote directory listings.
//!
//! The Census server publishes each geography as a directory such as
//! `https://www2.census.gov/geo/tiger/TIGER2014/TRACT/` whose HTML index links one zip
//! archive per state (or a single national archive).

/// Builds the URL of a geography directory for `year`.
///
/// # Examples
///
/// ```
/// use tiger_fetch::listing::remote_dir_url;
///
/// assert_eq!(
///     remote_dir_url("https://www2.census.gov/geo/tiger/", 2014, "tract"),
///     "https://www2.census.gov/geo/tiger/TIGER2014/TRACT/"
/// );
/// ```
#[must_use]
pub fn remote_dir_url(base_url: &str, year: u16, remote_dir: &str) -> String {
    format!(
        "{}/TIGER{year}/{}/",
        base_url.trim_end_matches('/'),
        remote_dir.to_ascii_uppercase()
    )
}

/// Extracts the archive names linked from a directory index.
///
/// Only `href` targets ending in `.zip` are kept, reduced to their final path segment,
/// without duplicates and in document order.
#[must_use]
pub fn parse_listing(html: &str) -> Vec<String> {
    let lower = html.to_ascii_lowercase();
    let mut names: Vec<String> = Vec::new();
    let mut from = 0;

    while let Some(pos) = lower[from..].find("href=") {
        let open = from + pos + "href=".len();
        from = open;
        let quote = match html[open..].chars().next() {
            Some(q @ ('"' | '\'')) => q,
            Some(_) => continue,
            None => break,
        };
        let value_start = open + quote.len_utf8();
        let Some(len) = html[value_start..].find(quote) else {
            break;
        };
        let target = &html[value_start..value_start + len];
        from = value_start + len;

        if !target.to_ascii_lowercase().ends_with(".zip") {
            continue;
        }
        let name = target.rsplit('/').next().unwrap_or(target);
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Keeps the archives relevant to one state.
///
/// These are the state's own files (`_{fips}_` in the name) plus national files
/// (`_us_`), except the national ZCTA archive, which is too large to pull in
/// implicitly.
#[must_use]
pub fn filter_for_state(names: &[String], fips: &str) -> Vec<String> {
    let state_marker = format!("_{fips}_");
    names
        .iter()
        .filter(|name| {
            name.contains(&state_marker) || (name.contains("_us_") && !name.contains("_us_zcta5"))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = r#"<!DOCTYPE HTML PUBLIC "-//W3C//DTD HTML 3.2 Final//EN">
<html><head><title>Index of /geo/tiger/TIGER2014/TRACT</title></head>
<body><h1>Index of /geo/tiger/TIGER2014/TRACT</h1>
<table>
<tr><td><a href="/geo/tiger/TIGER2014/">Parent Directory</a></td></tr>
<tr><td><a href="tl_2014_01_tract.zip">tl_2014_01_tract.zip</a></td><td>2014-07-01</td></tr>
<tr><td><a HREF='tl_2014_41_tract.zip'>tl_2014_41_tract.zip</a></td></tr>
<tr><td><a href="/geo/tiger/TIGER2014/TRACT/tl_2014_53_tract.zip">tl_2014_53_tract.zip</a></td></tr>
<tr><td><a href="tl_2014_41_tract.zip">again</a></td></tr>
<tr><td><a href="tl_2014_41_tract.shp.xml">metadata</a></td></tr>
</table></body></html>"#;

    #[test]
    fn test_parse_listing_keeps_zip_links() {
        assert_eq!(
            parse_listing(INDEX),
            vec![
                "tl_2014_01_tract.zip",
                "tl_2014_41_tract.zip",
                "tl_2014_53_tract.zip",
            ]
        );
    }

    #[test]
    fn test_parse_listing_without_links() {
        assert!(parse_listing("<html><body>Not Found</body></html>").is_empty());
        assert!(parse_listing("<a href=tl_2014_41_tract.zip>").is_empty());
    }

    #[test]
    fn test_filter_for_state() {
        let names: Vec<String> = [
            "tl_2014_41_tract.zip",
            "tl_2014_53_tract.zip",
            "tl_2014_us_county.zip",
            "tl_2014_us_zcta510.zip",
            "tl_2014_us_zcta5.zip",
        ]
        .iter()
        .map(ToString::to_string)
        .collect();

        assert_eq!(
            filter_for_state(&names, "41"),
            vec!["tl_2014_41_tract.zip", "tl_2014_us_county.zip"]
        );
    }

    #[test]
    fn test_remote_dir_url_uppercases_directory() {
        assert_eq!(
            remote_dir_url("https://example.test/tiger", 2012, "cousub"),
            "https://example.test/tiger/TIGER2012/COUSUB/"
        );
    }
}
