use super::*;
use serial_test::serial;

fn clear_env() {
    const VARS: &[&str] = &[
        "SEARCH_PORT",
        "SEARCH_BIND_ADDR",
        "RERANK_SLA_TARGET_MS",
        "RERANK_SLOW_LOG_MS",
        "RERANK_MAX_CANDIDATES",
        "RERANK_MIN_CANDIDATES",
        "RERANK_DEFAULT_LIMIT",
        "RERANK_REASON_LIMIT",
        "RERANK_ENABLE_FALLBACK",
        "REDIS_HOST",
        "REDIS_PORT",
        "REDIS_PASSWORD",
        "REDIS_TLS",
        "RERANK_REDIS_PREFIX",
        "RERANK_CACHE_TTL_SECONDS",
        "RERANK_CACHE_DISABLE",
        "RERANK_L1_CAPACITY",
        "PRIMARY_API_KEY",
        "PRIMARY_ENABLE",
        "PGVECTOR_INDEX_TYPE",
        "PGVECTOR_URL",
        "PGVECTOR_POOL_MIN",
        "PGVECTOR_POOL_MAX",
    ];
    // SAFETY: test-only, single-threaded-per-test via #[serial].
    for var in VARS {
        unsafe { env::remove_var(var) };
    }
}

fn with_env_vars<F: FnOnce() -> R, R>(vars: &[(&str, &str)], f: F) -> R {
    // SAFETY: test-only, guarded by #[serial].
    for (k, v) in vars {
        unsafe { env::set_var(k, v) };
    }
    let result = f();
    for (k, _) in vars {
        unsafe { env::remove_var(k) };
    }
    result
}

#[test]
fn test_default_config_is_valid() {
    let config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.socket_addr(), "127.0.0.1:8080");
}

#[test]
fn test_default_providers_disabled_without_api_key() {
    let config = Config::default();
    assert!(!config.primary_provider.enabled);
    assert!(!config.fallback_provider.enabled);
}

#[test]
#[serial]
fn test_from_env_with_defaults() {
    clear_env();
    let config = Config::from_env().expect("should parse with defaults");
    assert_eq!(config.port, 8080);
    assert_eq!(config.max_candidates, constants::DEFAULT_MAX_CANDIDATES);
}

#[test]
#[serial]
fn test_from_env_custom_port_and_bind() {
    clear_env();
    with_env_vars(&[("SEARCH_PORT", "9090"), ("SEARCH_BIND_ADDR", "0.0.0.0")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.port, 9090);
        assert_eq!(config.socket_addr(), "0.0.0.0:9090");
    });
}

#[test]
#[serial]
fn test_invalid_port_zero() {
    clear_env();
    with_env_vars(&[("SEARCH_PORT", "0")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_port_not_a_number() {
    clear_env();
    with_env_vars(&[("SEARCH_PORT", "abc")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPort { .. }));
    });
}

#[test]
#[serial]
fn test_invalid_bool_value() {
    clear_env();
    with_env_vars(&[("RERANK_ENABLE_FALLBACK", "maybe")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::ParseFailure { .. }));
    });
}

#[test]
#[serial]
fn test_bool_accepts_common_spellings() {
    clear_env();
    for (value, expected) in [("1", true), ("true", true), ("0", false), ("off", false)] {
        with_env_vars(&[("RERANK_ENABLE_FALLBACK", value)], || {
            let config = Config::from_env().expect("should parse");
            assert_eq!(config.enable_fallback, expected, "value={value}");
        });
    }
}

#[test]
#[serial]
fn test_provider_enabled_when_api_key_present() {
    clear_env();
    with_env_vars(&[("PRIMARY_API_KEY", "sk-test")], || {
        let config = Config::from_env().expect("should parse");
        assert!(config.primary_provider.enabled);
        assert_eq!(config.primary_provider.api_key.as_deref(), Some("sk-test"));
    });
}

#[test]
#[serial]
fn test_provider_explicit_disable_overrides_api_key() {
    clear_env();
    with_env_vars(
        &[("PRIMARY_API_KEY", "sk-test"), ("PRIMARY_ENABLE", "false")],
        || {
            let config = Config::from_env().expect("should parse");
            assert!(!config.primary_provider.enabled);
        },
    );
}

#[test]
#[serial]
fn test_pgvector_index_type_parsing() {
    clear_env();
    with_env_vars(&[("PGVECTOR_INDEX_TYPE", "diskann")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.pgvector_index_type, IndexType::DiskAnn);
    });

    clear_env();
    with_env_vars(&[("PGVECTOR_INDEX_TYPE", "bogus")], || {
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidIndexType { .. }));
    });
}

#[test]
fn test_validate_rejects_min_greater_than_max_candidates() {
    let config = Config {
        min_candidates: 10,
        max_candidates: 5,
        ..Config::default()
    };
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ConfigError::CrossField { .. }));
}

#[test]
fn test_validate_rejects_zero_min_candidates() {
    let config = Config {
        min_candidates: 0,
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_validate_rejects_pool_min_greater_than_max() {
    let config = Config {
        pgvector_pool_min: 50,
        pgvector_pool_max: 10,
        ..Config::default()
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_redis_url_without_password() {
    let config = Config::default();
    assert_eq!(config.redis_url(), "redis://localhost:6379");
}

#[test]
fn test_redis_url_with_password_and_tls() {
    let config = Config {
        redis_password: Some("hunter2".to_string()),
        redis_tls: true,
        ..Config::default()
    };
    assert_eq!(config.redis_url(), "rediss://:hunter2@localhost:6379");
}

#[test]
#[serial]
fn test_from_env_ipv6_bind_addr() {
    clear_env();
    with_env_vars(&[("SEARCH_BIND_ADDR", "::1")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(
            config.bind_addr,
            IpAddr::V6(std::net::Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
    });
}

#[test]
#[serial]
fn test_cache_ttl_override_optional() {
    clear_env();
    let config = Config::from_env().expect("should parse");
    assert_eq!(config.cache_ttl_override_secs, None);

    clear_env();
    with_env_vars(&[("RERANK_CACHE_TTL_SECONDS", "120")], || {
        let config = Config::from_env().expect("should parse");
        assert_eq!(config.cache_ttl_override_secs, Some(120));
    });
}
