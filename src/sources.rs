use crate::types::Source;

/// Static catalog of VC firms the pipeline ingests. The registry is an
/// immutable configuration value injected into the pipeline at
/// construction; alternate catalogs can be supplied in tests.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source {
            name: "Andreessen Horowitz".to_string(),
            slug: "a16z".to_string(),
            homepage_url: "https://a16z.com".to_string(),
            feed_url: "https://a16z.com/feed/".to_string(),
            page_url: "https://a16z.com/articles".to_string(),
            logo_url: "https://a16z.com/wp-content/themes/twentytwentythree-child/img/header-a16z-logo.svg".to_string(),
        },
        Source {
            name: "Sequoia Capital".to_string(),
            slug: "sequoia".to_string(),
            homepage_url: "https://www.sequoiacap.com".to_string(),
            feed_url: "https://www.sequoiacap.com/feed/".to_string(),
            page_url: "https://www.sequoiacap.com/article".to_string(),
            logo_url: "https://www.sequoiacap.com/static/assets/logos/sequoia-logo.svg".to_string(),
        },
        Source {
            name: "Benchmark".to_string(),
            slug: "benchmark".to_string(),
            homepage_url: "https://www.benchmark.com".to_string(),
            feed_url: "https://www.benchmark.com/blog/feed.xml".to_string(),
            page_url: "https://www.benchmark.com/blog".to_string(),
            logo_url: "https://www.benchmark.com/images/logo.svg".to_string(),
        },
        Source {
            name: "Accel".to_string(),
            slug: "accel".to_string(),
            homepage_url: "https://www.accel.com".to_string(),
            feed_url: "https://www.accel.com/feed.xml".to_string(),
            page_url: "https://www.accel.com/stories".to_string(),
            logo_url: "https://www.accel.com/assets/logos/accel-logo.svg".to_string(),
        },
        Source {
            name: "Bessemer Venture Partners".to_string(),
            slug: "bessemer".to_string(),
            homepage_url: "https://www.bvp.com".to_string(),
            feed_url: "https://www.bvp.com/feed".to_string(),
            page_url: "https://www.bvp.com/insights".to_string(),
            logo_url: "https://www.bvp.com/images/bvp-logo.svg".to_string(),
        },
    ]
}

/// Lowercase, strip everything but word characters, spaces and hyphens,
/// then collapse whitespace and hyphen runs into single hyphens. Used for
/// firm identity when registering ad-hoc sources.
pub fn slugify(input: &str) -> String {
    let mut cleaned = String::with_capacity(input.len());
    for ch in input.to_lowercase().trim().chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ' ' || ch == '-' {
            cleaned.push(ch);
        }
    }

    let mut slug = String::with_capacity(cleaned.len());
    let mut last_was_hyphen = false;
    for ch in cleaned.trim().chars() {
        let mapped = if ch == ' ' || ch == '-' { '-' } else { ch };
        if mapped == '-' {
            if !last_was_hyphen {
                slug.push('-');
            }
            last_was_hyphen = true;
        } else {
            slug.push(mapped);
            last_was_hyphen = false;
        }
    }
    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_is_ordered_and_stable() {
        let first = default_sources();
        let second = default_sources();
        assert_eq!(first.len(), 5);
        let slugs: Vec<_> = first.iter().map(|s| s.slug.clone()).collect();
        let again: Vec<_> = second.iter().map(|s| s.slug.clone()).collect();
        assert_eq!(slugs, again);
        assert_eq!(slugs[0], "a16z");
    }

    #[test]
    fn registry_entries_have_locators() {
        for source in default_sources() {
            assert!(!source.feed_url.is_empty(), "{} missing feed url", source.name);
            assert!(source.homepage_url.starts_with("https://"));
        }
    }

    #[test]
    fn slugify_normalizes_names() {
        assert_eq!(slugify("Bessemer Venture Partners"), "bessemer-venture-partners");
        assert_eq!(slugify("  A16Z -- Crypto!  "), "a16z-crypto");
        assert_eq!(slugify("Union Square Ventures (USV)"), "union-square-ventures-usv");
    }
}
