//! Utility functions and helpers for the flowermatch service

/// Join a base URL and a catalog-relative path with exactly one `/` between them
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}

/// Read an environment variable, treating blank values as unset
pub(crate) fn env_var(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_url() {
        assert_eq!(
            join_url("http://localhost:8080", "/images/a.jpg"),
            "http://localhost:8080/images/a.jpg"
        );
        assert_eq!(
            join_url("http://localhost:8080/", "/images/a.jpg"),
            "http://localhost:8080/images/a.jpg"
        );
        assert_eq!(
            join_url("http://localhost:8080", "images/a.jpg"),
            "http://localhost:8080/images/a.jpg"
        );
    }

    #[test]
    fn test_env_var_blank_is_unset() {
        std::env::set_var("FLOWERMATCH_TEST_BLANK", "   ");
        assert_eq!(env_var("FLOWERMATCH_TEST_BLANK"), None);
        std::env::remove_var("FLOWERMATCH_TEST_BLANK");
    }
}
