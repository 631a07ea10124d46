#[cfg(test)]
mod tests{
    use crm_lens::{
        config::CrmConfig,
        errors::ConfigError,
    };
    use serial_test::serial;

    const MODEL_VAR: &str = "CRM_LENS_NARRATIVE__MODEL";
    const TOP_K_VAR: &str = "CRM_LENS_NARRATIVE__TOP_K";

    fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crm_lens.toml");
        std::fs::write(&path, contents).unwrap();
        (dir, path)
    }

    #[test]
    #[serial]
    fn test_environment_overrides_file() {
        let (_dir, path) = write_config("[narrative]\nmodel = \"from-file\"\ntop_k = 20\nsample_limit = 5\n");
        unsafe {
            std::env::set_var(MODEL_VAR, "from-env");
            std::env::set_var(TOP_K_VAR, "10");
        }
        let config = CrmConfig::load_from_path(&path);
        unsafe {
            std::env::remove_var(MODEL_VAR);
            std::env::remove_var(TOP_K_VAR);
        }
        let config = config.unwrap();
        assert_eq!(config.narrative.model, "from-env");
        assert_eq!(config.narrative.top_k, 10);
        assert_eq!(config.narrative.sample_limit, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_file_overrides_defaults() {
        let (_dir, path) = write_config("[logging]\nlevel = \"warn\"\n");
        let config = CrmConfig::load_from_path(&path).unwrap();
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.narrative.model, "gemini-1.5-flash");
    }

    #[test]
    #[serial]
    fn test_bad_environment_value_is_parse_error() {
        let (_dir, path) = write_config("");
        unsafe {
            std::env::set_var(TOP_K_VAR, "many");
        }
        let result = CrmConfig::load_from_path(&path);
        unsafe {
            std::env::remove_var(TOP_K_VAR);
        }
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }
}
