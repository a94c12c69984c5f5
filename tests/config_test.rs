use std::env;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[cfg(test)]
mod config_tests {
    use super::*;
    use analytics_report::config::Config;

    #[test]
    fn test_default_config_values() {
        let config = Config::default();

        // Test logging defaults
        assert_eq!(config.logging.level, "WARN");
        assert_eq!(config.logging.format, "pretty");
        assert_eq!(config.logging.output, "console");

        // Test API defaults
        assert!(config.api.endpoint.ends_with("/v4/reports:batchGet"));
        assert_eq!(config.api.view_id, "");
        assert_eq!(config.api.access_token, None);
        assert_eq!(config.api.page_size, 10_000);
        assert_eq!(config.api.timeout_secs, 60);
        assert_eq!(config.api.max_retries, 3);

        // Test pagination and domain defaults
        assert_eq!(config.pagination.max_pages, 1000);
        assert!(config.aliases.is_empty());
        assert!(config.search.collections.is_empty());
        assert_eq!(config.monthly.host_prefix, "");

        // Test output defaults
        assert_eq!(config.output.directory, PathBuf::from("reports"));
        assert!(config.output.json_pretty);
    }

    #[test]
    fn test_env_variable_override() {
        env::set_var("ANALYTICS_VIEW_ID", "42472462");
        env::set_var("ANALYTICS_PAGE_SIZE", "70000");
        env::set_var("ANALYTICS_MAX_PAGES", "25");
        env::set_var("ANALYTICS_OUTPUT_DIR", "/tmp/analytics-out");

        let mut config = Config::default();
        config
            .apply_env_overrides()
            .expect("Failed to apply env overrides");

        assert_eq!(config.api.view_id, "42472462");
        assert_eq!(config.api.page_size, 70_000);
        assert_eq!(config.pagination.max_pages, 25);
        assert_eq!(config.output.directory, PathBuf::from("/tmp/analytics-out"));

        // Invalid numbers are rejected
        env::set_var("ANALYTICS_MAX_PAGES", "many");
        let mut config = Config::default();
        assert!(config.apply_env_overrides().is_err());

        // Cleanup
        env::remove_var("ANALYTICS_VIEW_ID");
        env::remove_var("ANALYTICS_PAGE_SIZE");
        env::remove_var("ANALYTICS_MAX_PAGES");
        env::remove_var("ANALYTICS_OUTPUT_DIR");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        // Test valid config
        assert!(config.validate().is_ok());

        // Test invalid page size
        config.api.page_size = 0;
        assert!(config.validate().is_err());
        config.api.page_size = 100_001;
        assert!(config.validate().is_err());

        // Reset and test invalid max pages
        config = Config::default();
        config.pagination.max_pages = 0;
        assert!(config.validate().is_err());

        // Reset and test invalid timeout
        config = Config::default();
        config.api.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_file_loading() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("test-config.toml");

        let test_config = r#"
[logging]
level = "DEBUG"
format = "json"
output = "console"

[api]
view_id = "118513499"
page_size = 70000
timeout_secs = 30

[pagination]
max_pages = 50

[aliases]
"t.co" = "twitter"
"l.facebook.com" = "facebook"
"us5.campaign-archive.com" = "mailchimp"

[search]
collections = ["digital.lib.utk.edu/collections/islandora/search"]
facet_prefixes = ["utk_mods_", "rels_"]

[monthly]
host_prefix = "https://stream.lib.utk.edu"

[output]
directory = "/custom/reports"
json_pretty = false
        "#;

        fs::write(&config_path, test_config).expect("Failed to write test config");

        let config = Config::load_from_file(&config_path).expect("Failed to load config");
        config.validate().expect("Loaded config should validate");

        assert_eq!(config.logging.level, "DEBUG");
        assert_eq!(config.api.view_id, "118513499");
        assert_eq!(config.api.page_size, 70_000);
        assert_eq!(config.api.max_retries, 3);
        assert_eq!(config.pagination.max_pages, 50);
        assert_eq!(config.aliases.get("t.co").map(String::as_str), Some("twitter"));
        assert_eq!(config.aliases.len(), 3);
        assert_eq!(config.search.collections.len(), 1);
        assert_eq!(config.search.facet_prefixes.len(), 2);
        assert_eq!(config.monthly.host_prefix, "https://stream.lib.utk.edu");
        assert_eq!(config.output.directory, PathBuf::from("/custom/reports"));
        assert!(!config.output.json_pretty);
    }

    #[test]
    fn test_missing_file_is_error() {
        let temp_dir = tempdir().expect("Failed to create temp dir");
        let result = Config::load(Some(&temp_dir.path().join("absent.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = Config::default();
        config.aliases.insert("t.co".to_string(), "twitter".to_string());

        let temp_dir = tempdir().expect("Failed to create temp dir");
        let path = temp_dir.path().join("saved.toml");
        config.save_to_file(&path).expect("Failed to save config");

        let toml_string = fs::read_to_string(&path).expect("Failed to read saved config");
        assert!(toml_string.contains("[logging]"));
        assert!(toml_string.contains("[api]"));
        assert!(toml_string.contains("[pagination]"));
        assert!(toml_string.contains("[aliases]"));
        assert!(toml_string.contains("[output]"));

        let deserialized = Config::load_from_file(&path).expect("Failed to reload config");
        assert_eq!(config.api.page_size, deserialized.api.page_size);
        assert_eq!(deserialized.aliases.get("t.co").map(String::as_str), Some("twitter"));
    }
}
