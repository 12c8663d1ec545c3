use std::collections::HashMap;

use super::*;

fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
    move |key| map.get(key).cloned()
}

#[test]
fn port_defaults_to_3000() {
    let config = ServerConfig::from_lookup(vars(&[
        ("SUPABASE_URL", "https://x.supabase.co"),
        ("SUPABASE_SERVICE_ROLE_KEY", "service"),
    ]))
    .unwrap();
    assert_eq!(config.port, 3000);
    assert_eq!(config.provider.api_key, "service");
}

#[test]
fn port_is_read_from_env() {
    let config = ServerConfig::from_lookup(vars(&[
        ("SUPABASE_URL", "https://x.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon"),
        ("PORT", "8080"),
    ]))
    .unwrap();
    assert_eq!(config.port, 8080);
    assert_eq!(config.provider.api_key, "anon");
}

#[test]
fn invalid_port_is_rejected() {
    let err = ServerConfig::from_lookup(vars(&[
        ("SUPABASE_URL", "https://x.supabase.co"),
        ("SUPABASE_ANON_KEY", "anon"),
        ("PORT", "eighty"),
    ]))
    .unwrap_err();
    assert_eq!(err, ConfigError::Invalid { var: "PORT", value: "eighty".into() });
}

#[test]
fn missing_provider_url_is_reported() {
    let err = ServerConfig::from_lookup(vars(&[("SUPABASE_ANON_KEY", "anon")])).unwrap_err();
    assert_eq!(err, ConfigError::Missing { var: "SUPABASE_URL" });
}
