//! Deterministic fallback image assignment

use std::sync::Arc;

/// Known-good book cover images used when a source cannot be loaded
pub const BOOK_COVER_FALLBACKS: &[&str] = &[
    "https://images.unsplash.com/photo-1660479123634-2c700dfbbbdb?ixlib=rb-4.1.0&q=80&w=400&h=600&fit=crop",
    "https://images.unsplash.com/photo-1683871268982-a19153dbb35d?ixlib=rb-4.1.0&q=80&w=400&h=600&fit=crop",
    "https://images.unsplash.com/photo-1556566952-11eff3d06ed4?ixlib=rb-4.1.0&q=80&w=400&h=600&fit=crop",
    "https://images.unsplash.com/photo-1632096936824-565d39f8e5eb?ixlib=rb-4.1.0&q=80&w=400&h=600&fit=crop",
    "https://images.unsplash.com/photo-1693075586720-ad1cdebc35c8?ixlib=rb-4.1.0&q=80&w=400&h=600&fit=crop",
    "https://images.unsplash.com/photo-1695037520057-0e9cb68f321d?ixlib=rb-4.1.0&q=80&w=400&h=600&fit=crop",
];

/// Maps a source string onto one entry of a fixed fallback list.
///
/// The index is `len(source) mod N`, with the length counted in UTF-16 code
/// units. Selection depends on nothing but the input, so it is stable across
/// calls and restarts. The list is shared read-only between pipelines.
#[derive(Debug, Clone)]
pub struct FallbackSelector {
    images: Arc<[String]>,
}

impl Default for FallbackSelector {
    fn default() -> Self {
        Self {
            images: BOOK_COVER_FALLBACKS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl FallbackSelector {
    /// Build a selector over a custom list; an empty list yields `None`
    pub fn new<I, S>(images: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let images: Arc<[String]> = images.into_iter().map(Into::into).collect();
        if images.is_empty() {
            None
        } else {
            Some(Self { images })
        }
    }

    /// Index of the fallback assigned to `source`
    pub fn index_for(&self, source: &str) -> usize {
        source.encode_utf16().count() % self.images.len()
    }

    /// Fallback assigned to `source`
    pub fn select(&self, source: &str) -> &str {
        &self.images[self.index_for(source)]
    }

    /// The full ordered list
    pub fn images(&self) -> &[String] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selection_by_length() {
        let selector = FallbackSelector::default();
        assert_eq!(selector.len(), 6);
        assert_eq!(selector.select(""), BOOK_COVER_FALLBACKS[0]);
        assert_eq!(selector.select("abcdefg"), BOOK_COVER_FALLBACKS[1]);
        assert_eq!(selector.select("abcde"), BOOK_COVER_FALLBACKS[5]);
    }

    #[test]
    fn test_utf16_length() {
        let selector = FallbackSelector::new(["a", "b", "c"]).unwrap();
        // One char outside the BMP counts as two code units
        assert_eq!(selector.index_for("\u{1F4DA}"), 2);
        assert_eq!(selector.index_for("책"), 1);
    }

    #[test]
    fn test_empty_list_rejected() {
        assert!(FallbackSelector::new(Vec::<String>::new()).is_none());
    }
}
