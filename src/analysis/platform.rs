//! Platform ("core") hook classification by name prefix.

/// Prefixes WordPress core uses for its own hooks.
pub const DEFAULT_PLATFORM_PREFIXES: &[&str] =
    &["wp_", "pre_", "post_", "after_", "before_", "the_", "admin_"];

/// Classifies hook names as platform-provided or project-defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformPrefixes {
    prefixes: Vec<String>,
}

impl PlatformPrefixes {
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    /// A classifier that never matches.
    pub fn none() -> Self {
        Self {
            prefixes: Vec::new(),
        }
    }

    /// True if `name` starts with any configured prefix.
    pub fn is_platform_hook(&self, name: &str) -> bool {
        self.prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }
}

impl Default for PlatformPrefixes {
    fn default() -> Self {
        Self::new(DEFAULT_PLATFORM_PREFIXES.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prefixes() {
        let platform = PlatformPrefixes::default();
        assert!(platform.is_platform_hook("wp_head"));
        assert!(platform.is_platform_hook("the_content"));
        assert!(!platform.is_platform_hook("my_custom_hook"));
        // prefix, not substring
        assert!(!platform.is_platform_hook("my_wp_head"));
    }

    #[test]
    fn test_custom_prefixes_override_defaults() {
        let platform = PlatformPrefixes::new(["woocommerce_"]);
        assert!(platform.is_platform_hook("woocommerce_cart_loaded"));
        assert!(!platform.is_platform_hook("wp_head"));
        assert!(!PlatformPrefixes::none().is_platform_hook("wp_head"));
    }
}
