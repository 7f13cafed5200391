//! Content-type allow-list applied at upload.

pub const APPLICATION_PDF: &str = "application/pdf";
pub const IMAGE_PNG: &str = "image/png";
pub const IMAGE_JPEG: &str = "image/jpeg";
pub const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentTypePolicy {
    allowed: Vec<String>,
}

impl Default for ContentTypePolicy {
    fn default() -> Self {
        Self::new([APPLICATION_PDF, IMAGE_PNG, IMAGE_JPEG])
    }
}

impl ContentTypePolicy {
    pub fn new<I, T>(allowed: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Parses a comma-separated list, ignoring blanks.
    pub fn from_list(list: &str) -> Self {
        Self::new(
            list.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty()),
        )
    }

    /// Exact match only: no parameters, no case folding.
    pub fn is_acceptable(&self, content_type: &str) -> bool {
        self.allowed.iter().any(|allowed| allowed == content_type)
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_allow_list() {
        let policy = ContentTypePolicy::default();
        assert!(policy.is_acceptable("application/pdf"));
        assert!(policy.is_acceptable("image/png"));
        assert!(policy.is_acceptable("image/jpeg"));

        assert!(!policy.is_acceptable("image/gif"));
        assert!(!policy.is_acceptable("text/plain"));
        assert!(!policy.is_acceptable("application/octet-stream"));
        assert!(!policy.is_acceptable("IMAGE/PNG"));
        assert!(!policy.is_acceptable("application/pdf; charset=binary"));
        assert!(!policy.is_acceptable(""));
    }

    #[test]
    fn test_from_list() {
        let policy = ContentTypePolicy::from_list(" image/png, image/webp ,,");
        assert_eq!(policy.allowed(), ["image/png", "image/webp"]);
        assert!(policy.is_acceptable("image/webp"));
        assert!(!policy.is_acceptable("application/pdf"));
    }
}
