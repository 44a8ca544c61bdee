use std::env;

/// Retrieves an environment variable and splits it into a vector of strings
/// based on a delimiter. Empty or unset variables yield an empty vector.
pub fn get_env_var_as_vec(var: &str, delimiter: char) -> Vec<String> {
    env::var(var)
        .unwrap_or_default()
        .split(delimiter)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Retrieves an environment variable, falling back to a default when unset
/// or empty.
pub fn get_env_var_or(var: &str, default: &str) -> String {
    match env::var(var) {
        Ok(val) if !val.trim().is_empty() => val,
        _ => default.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unset_var_yields_empty_vec() {
        assert!(get_env_var_as_vec("NEWSWIRE_TEST_UNSET_VAR", ';').is_empty());
    }

    #[test]
    fn test_get_env_var_or_default() {
        assert_eq!(
            get_env_var_or("NEWSWIRE_TEST_UNSET_VAR", "fallback"),
            "fallback"
        );
    }
}
