use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serial_test::serial;

use siteship::load_config::{build_config, deploy_config, deploy_globs, DeployTarget};
use siteship_core::error::SyncError;

fn set_full_deploy_env() {
    env::set_var("FTP_HOST", "ftp.example.test");
    env::set_var("FTP_USER", "deploy");
    env::set_var("FTP_PASSWORD", "secret");
    env::set_var("FTP_STAGING_ROOT", "/www/staging");
    env::set_var("FTP_PRODUCTION_ROOT", "/www/site");
}

fn clear_deploy_env() {
    for name in [
        "FTP_HOST",
        "FTP_USER",
        "FTP_PASSWORD",
        "FTP_STAGING_ROOT",
        "FTP_PRODUCTION_ROOT",
        "DIST_DIR",
        "SYNC_CONCURRENCY",
        "SYNC_TIMEOUT_SECS",
    ] {
        env::remove_var(name);
    }
}

#[test]
#[serial]
fn deploy_config_resolves_the_staging_target() {
    clear_deploy_env();
    set_full_deploy_env();

    let config = deploy_config(DeployTarget::Staging).expect("Config should load");

    assert_eq!(config.destination_root, "/www/staging");
    assert_eq!(config.base_path, PathBuf::from("dist"));
    assert_eq!(
        config.local_globs,
        vec!["dist/**".to_string(), "!dist/tmp/**".to_string()]
    );
    assert_eq!(config.credentials.host, "ftp.example.test");
    assert_eq!(config.concurrency_limit, 10);
    assert_eq!(config.transfer_timeout, Duration::from_secs(30));
}

#[test]
#[serial]
fn deploy_config_honors_overrides() {
    clear_deploy_env();
    set_full_deploy_env();
    env::set_var("DIST_DIR", "public");
    env::set_var("SYNC_CONCURRENCY", "4");
    env::set_var("SYNC_TIMEOUT_SECS", "120");

    let config = deploy_config(DeployTarget::Production).expect("Config should load");

    assert_eq!(config.destination_root, "/www/site");
    assert_eq!(config.base_path, PathBuf::from("public"));
    assert_eq!(config.local_globs[0], "public/**");
    assert_eq!(config.concurrency_limit, 4);
    assert_eq!(config.transfer_timeout, Duration::from_secs(120));
}

#[test]
#[serial]
fn missing_required_variable_names_it() {
    clear_deploy_env();
    set_full_deploy_env();
    env::remove_var("FTP_PASSWORD");

    let err = deploy_config(DeployTarget::Staging).unwrap_err();
    assert!(matches!(err, SyncError::Configuration { .. }));
    assert!(err.to_string().contains("FTP_PASSWORD"));
}

#[test]
#[serial]
fn unparsable_concurrency_is_a_configuration_error() {
    clear_deploy_env();
    set_full_deploy_env();
    env::set_var("SYNC_CONCURRENCY", "many");

    let err = deploy_config(DeployTarget::Staging).unwrap_err();
    assert!(err.to_string().contains("SYNC_CONCURRENCY"));
}

#[test]
#[serial]
fn zero_concurrency_is_rejected() {
    clear_deploy_env();
    set_full_deploy_env();
    env::set_var("SYNC_CONCURRENCY", "0");

    let err = deploy_config(DeployTarget::Staging).unwrap_err();
    assert!(err.to_string().contains("SYNC_CONCURRENCY"));
}

#[test]
#[serial]
fn build_config_always_loads_with_defaults() {
    clear_deploy_env();

    let config = build_config();
    assert_eq!(config.dist_dir, PathBuf::from("dist"));
    assert!(config.styles_command.contains("sass"));
    assert!(config.serve_command.contains("browser-sync"));
}

#[test]
fn deploy_globs_exclude_the_scratch_directory() {
    let globs = deploy_globs("dist");
    assert_eq!(globs, vec!["dist/**".to_string(), "!dist/tmp/**".to_string()]);
}
