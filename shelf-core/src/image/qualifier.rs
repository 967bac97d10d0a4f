//! URL qualification for remote image-transformation providers

use regex::Regex;
use url::Url;

/// Default quality written when the request carries none
pub const DEFAULT_QUALITY: u8 = 75;

/// Hosts understood out of the box (subdomains included)
pub const DEFAULT_PROVIDER_HOSTS: &[&str] = &["unsplash.com"];

/// Query keys owned by the provider transform
const TRANSFORM_KEYS: &[&str] = &["w", "h", "q", "fm", "auto", "crop", "fit"];

/// Size and quality hints taken from an image request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformHints {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub quality: Option<u8>,
}

/// Rewrites provider URLs with sizing, quality and format parameters.
///
/// Anything that is not a well-formed URL on a known provider host passes
/// through untouched.
#[derive(Debug, Clone)]
pub struct Qualifier {
    hosts: Regex,
    default_quality: u8,
}

impl Default for Qualifier {
    fn default() -> Self {
        // The default host list is a constant, so the pattern always compiles.
        Self::new(DEFAULT_PROVIDER_HOSTS, DEFAULT_QUALITY)
            .unwrap_or_else(|_| unreachable!("default provider pattern is valid"))
    }
}

impl Qualifier {
    /// Build a qualifier for the given provider hosts
    pub fn new<S: AsRef<str>>(hosts: &[S], default_quality: u8) -> Result<Self, regex::Error> {
        let alternatives: Vec<String> = hosts
            .iter()
            .map(|h| regex::escape(h.as_ref().trim().trim_start_matches('.')))
            .collect();
        let pattern = format!(r"(?i)^(?:[a-z0-9-]+\.)*(?:{})$", alternatives.join("|"));

        Ok(Self {
            hosts: Regex::new(&pattern)?,
            default_quality: default_quality.min(100),
        })
    }

    /// Whether the source points at a known provider
    pub fn is_provider_url(&self, source: &str) -> bool {
        self.parse_provider(source).is_some()
    }

    /// Produce the qualified URL for `source`.
    ///
    /// Existing keys are overwritten in place and new ones appended, so
    /// qualifying an already qualified URL returns it unchanged.
    pub fn qualify(&self, source: &str, hints: TransformHints) -> String {
        let Some(mut url) = self.parse_provider(source) else {
            return source.to_string();
        };
        let mut pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        if let Some(width) = hints.width {
            set_param(&mut pairs, "w", width.to_string());
        }
        if let Some(height) = hints.height {
            set_param(&mut pairs, "h", height.to_string());
        }
        let quality = hints.quality.map_or(self.default_quality, |q| q.min(100));
        set_param(&mut pairs, "q", quality.to_string());
        set_param(&mut pairs, "fm", "webp".to_string());
        set_param(&mut pairs, "auto", "format,compress".to_string());

        // A caller-supplied crop directive wins over the cover default
        if !pairs.iter().any(|(k, _)| k == "crop") {
            set_param(&mut pairs, "crop", "smart".to_string());
            set_param(&mut pairs, "fit", "crop".to_string());
        }

        write_query(&mut url, &pairs);
        url.into()
    }

    /// Parse `source` and keep it only if it names a provider host
    fn parse_provider(&self, source: &str) -> Option<Url> {
        let url = Url::parse(source).ok()?;
        let host = url.host_str()?;
        self.hosts.is_match(host).then_some(url)
    }
}

/// Remove provider transform parameters, leaving the bare image reference.
///
/// Non-provider and malformed sources are returned unchanged.
pub fn strip_transform_params(qualifier: &Qualifier, source: &str) -> String {
    let Some(mut url) = qualifier.parse_provider(source) else {
        return source.to_string();
    };
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter(|(k, _)| !TRANSFORM_KEYS.contains(&k.as_str()))
        .collect();

    write_query(&mut url, &pairs);
    url.into()
}

/// Set `key` in place, dropping any repeats so it carries one value
fn set_param(pairs: &mut Vec<(String, String)>, key: &str, value: String) {
    match pairs.iter().position(|(k, _)| k == key) {
        Some(idx) => {
            pairs[idx].1 = value;
            let mut seen = 0;
            pairs.retain(|(k, _)| {
                if k != key {
                    return true;
                }
                seen += 1;
                seen == 1
            });
        }
        None => pairs.push((key.to_string(), value)),
    }
}

fn write_query(url: &mut Url, pairs: &[(String, String)]) {
    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(pairs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const COVER: &str = "https://images.unsplash.com/photo-1544947950-fa07a98d237f?w=800&q=80";

    #[test]
    fn test_qualify_provider_url() {
        let qualifier = Qualifier::default();
        let hints = TransformHints {
            width: Some(200),
            height: Some(300),
            quality: Some(80),
        };

        let qualified = qualifier.qualify(COVER, hints);
        assert_eq!(
            qualified,
            "https://images.unsplash.com/photo-1544947950-fa07a98d237f\
             ?w=200&q=80&h=300&fm=webp&auto=format%2Ccompress&crop=smart&fit=crop"
        );
    }

    #[test]
    fn test_qualify_uses_default_quality() {
        let qualifier = Qualifier::default();
        let qualified = qualifier.qualify(
            "https://images.unsplash.com/photo-1",
            TransformHints::default(),
        );
        assert!(qualified.contains("q=75"));
        assert!(!qualified.contains("w="));
        assert!(!qualified.contains("h="));
    }

    #[test]
    fn test_existing_crop_directive_is_kept() {
        let qualifier = Qualifier::default();
        let source = "https://images.unsplash.com/photo-1?crop=entropy&fit=max";
        let qualified = qualifier.qualify(source, TransformHints::default());

        assert!(qualified.contains("crop=entropy"));
        assert!(qualified.contains("fit=max"));
        assert!(!qualified.contains("crop=smart"));
    }

    #[test]
    fn test_non_provider_untouched() {
        let qualifier = Qualifier::default();
        for source in [
            "https://example.com/cover.jpg?w=10",
            "https://notunsplash.com/cover.jpg",
            "data:image/svg+xml;base64,AAAA",
            "",
        ] {
            assert_eq!(qualifier.qualify(source, TransformHints::default()), source);
        }
    }

    #[test]
    fn test_duplicate_keys_collapse() {
        let qualifier = Qualifier::default();
        let qualified = qualifier.qualify(
            "https://images.unsplash.com/photo-1?q=10&ixid=abc&q=20",
            TransformHints::default(),
        );
        assert!(qualified
            .starts_with("https://images.unsplash.com/photo-1?q=75&ixid=abc&fm=webp&"));
        assert_eq!(qualified.matches("q=").count(), 1);
    }

    #[test]
    fn test_malformed_provider_url_untouched() {
        let qualifier = Qualifier::default();
        for source in [
            "unsplash.com/photo-1",
            "https://",
            "https://images.unsplash.com:notaport/photo-1",
            "https://images.unsplash.com:99999/photo-1",
            "https://[::1/photo-1",
        ] {
            assert_eq!(qualifier.qualify(source, TransformHints::default()), source);
        }
    }

    #[test]
    fn test_fragment_preserved() {
        let qualifier = Qualifier::default();
        let qualified = qualifier.qualify(
            "https://images.unsplash.com/photo-1#top",
            TransformHints::default(),
        );
        assert!(qualified.ends_with("#top"));
        assert!(qualified.contains("?q=75"));
    }

    #[test]
    fn test_custom_provider_hosts() {
        let qualifier = Qualifier::new(&["imgix.net"][..], 60).unwrap();
        assert!(qualifier.is_provider_url("https://shelf.imgix.net/a.png"));
        assert!(!qualifier.is_provider_url("https://images.unsplash.com/a.png"));

        let qualified = qualifier.qualify("https://shelf.imgix.net/a.png", TransformHints::default());
        assert!(qualified.contains("q=60"));
    }

    #[test]
    fn test_strip_transform_params() {
        let qualifier = Qualifier::default();
        let qualified = qualifier.qualify(
            "https://images.unsplash.com/photo-1?ixlib=rb-4.1.0",
            TransformHints {
                width: Some(10),
                ..Default::default()
            },
        );

        assert_eq!(
            strip_transform_params(&qualifier, &qualified),
            "https://images.unsplash.com/photo-1?ixlib=rb-4.1.0"
        );
        assert_eq!(
            strip_transform_params(&qualifier, "https://example.com/a?w=1"),
            "https://example.com/a?w=1"
        );
    }
}
