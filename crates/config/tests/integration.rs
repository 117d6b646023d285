//! Integration tests for config

#[cfg(test)]
mod tests {
    use pd_config::*;
    use pd_errors::{ConfigError, Error};
    use pd_types::{BuildIdReader, Client};
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to ensure env var tests don't run concurrently
    static ENV_TEST_MUTEX: Mutex<()> = Mutex::new(());

    const ENV_VARS: [&str; 6] = [
        "PD_ENABLED",
        "PD_ENDPOINT",
        "PD_API_KEY_OVERRIDE",
        "PD_ENABLE_ATTESTATION",
        "PD_MAX_CONCURRENT",
        "PD_STATE_PATH",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(
            temp_file,
            r#"
[general]
enabled = false
max_concurrent_operations = 8

[service]
endpoint = "https://blobs.test"
timeout_secs = 5

[service.endpoints]
text-input = "https://inference.test"

[security]
reencryption = "disabled"

[clients.text-input]
id = "custom.text"
build_id_flag = {{ namespace = "inference", name = "text_build" }}

[flags.inference]
text_build = 1234

[network_usage]
allowed_clients = ["custom.text"]
        "#
        )
        .unwrap();

        let config = Config::load_from_file(temp_file.path()).await.unwrap();
        config.validate().unwrap();
        assert!(!config.general.enabled);
        assert_eq!(config.general.max_concurrent_operations, 8);
        assert_eq!(config.service.endpoint, "https://blobs.test");
        assert_eq!(config.service.connect_timeout_secs, 15);
        assert_eq!(config.security.reencryption, ReencryptionPolicy::Disabled);

        let registry = config.client_registry().unwrap();
        assert_eq!(registry.client_id(Client::TextInput), Some("custom.text"));
        assert_eq!(
            registry.client_id(Client::TextOutput),
            Some(Client::TextOutput.default_client_id())
        );

        let flag = registry.config(Client::TextInput).unwrap().build_id_flag().unwrap();
        assert_eq!(config.build_id_reader().read_build_id(flag), Some(1234));

        assert_eq!(
            config.endpoint_overrides(&registry).unwrap(),
            vec![("custom.text".to_string(), "https://inference.test".to_string())]
        );
        assert_eq!(config.allowed_clients(&registry), vec!["custom.text".to_string()]);
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        config.validate().unwrap();
        assert!(config.general.enabled);
        assert_eq!(config.general.max_concurrent_operations, 4);
        assert!(!config.security.enable_attestation);
        assert_eq!(config.security.reencryption, ReencryptionPolicy::RequestKey);
        assert_eq!(config.service.max_response_bytes, 32 * 1024 * 1024);

        let registry = config.client_registry().unwrap();
        assert_eq!(config.allowed_clients(&registry).len(), Client::ALL.len());
    }

    #[test]
    fn test_duplicate_client_ids_fail_validation() {
        let config = Config::from_toml(
            r#"
[clients.text-input]
id = "shared"

[clients.text-output]
id = "shared"
"#,
        )
        .unwrap();
        assert!(matches!(
            config.validate(),
            Err(Error::Config(ConfigError::Invalid { .. }))
        ));
    }

    #[test]
    fn test_unknown_client_name_is_rejected() {
        let config = Config::from_toml("[clients.not-a-client]\nid = \"x\"\n").unwrap();
        assert!(matches!(
            config.client_registry(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_attestation_requires_command() {
        let config = Config::from_toml("[security]\nenable_attestation = true\n").unwrap();
        assert!(config.validate().is_err());

        let config = Config::from_toml(
            "[security]\nenable_attestation = true\nattestation_command = [\"attest\"]\n",
        )
        .unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn test_merge_env() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PD_ENABLED", "no");
        std::env::set_var("PD_ENDPOINT", "https://env.test");
        std::env::set_var("PD_API_KEY_OVERRIDE", "override");
        std::env::set_var("PD_MAX_CONCURRENT", "2");
        std::env::set_var("PD_STATE_PATH", "/tmp/pd-state.json");

        let mut config = Config::default();
        config.merge_env().unwrap();

        assert!(!config.general.enabled);
        assert_eq!(config.service.endpoint, "https://env.test");
        assert_eq!(config.service.api_key_override.as_deref(), Some("override"));
        assert_eq!(config.general.max_concurrent_operations, 2);
        assert_eq!(config.state_path(), PathBuf::from("/tmp/pd-state.json"));

        clear_env();
    }

    #[test]
    fn test_invalid_env_value() {
        let _guard = ENV_TEST_MUTEX.lock().unwrap();
        clear_env();

        std::env::set_var("PD_ENABLE_ATTESTATION", "sometimes");

        let mut config = Config::default();
        assert!(config.merge_env().is_err());

        clear_env();
    }
}
