//! Expansion against role files on disk.

use std::fs;

use serde_json::json;

use galley_runlist::{DiskRoleFetcher, RoleFetcher, RunList};

fn write_role(dir: &std::path::Path, name: &str, body: serde_json::Value) {
    fs::write(dir.join(format!("{name}.json")), body.to_string()).unwrap();
}

#[tokio::test]
async fn loads_and_expands_roles_from_role_files() {
    let dir = tempfile::tempdir().unwrap();
    write_role(
        dir.path(),
        "webserver",
        json!({
            "name": "webserver",
            "run_list": ["role[base]", "recipe[apache2]"],
            "default_attributes": {"apache": {"port": 80}},
        }),
    );
    write_role(
        dir.path(),
        "base",
        json!({
            "name": "base",
            "run_list": ["recipe[ntp]"],
            "override_attributes": {"tz": "UTC"},
        }),
    );

    let fetcher = DiskRoleFetcher::new(dir.path());
    let expansion = RunList::parse(["role[webserver]"])
        .unwrap()
        .expand("_default", &fetcher)
        .await
        .unwrap();

    assert_eq!(expansion.recipes().names(), ["ntp", "apache2"]);
    assert_eq!(
        expansion.default_attrs()["apache"]["port"],
        json!(80)
    );
    assert_eq!(expansion.override_attrs()["tz"], json!("UTC"));
    assert!(!expansion.has_errors());
}

#[tokio::test]
async fn missing_role_file_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let fetcher = DiskRoleFetcher::new(dir.path());

    let err = fetcher.fetch_role("ghost").await.unwrap_err();
    assert!(matches!(
        err,
        galley_runlist::FetchError::NotFound { ref name } if name == "ghost"
    ));

    // An expansion over the same directory records the miss and carries on.
    let expansion = RunList::parse(["role[ghost]", "recipe[kitty]"])
        .unwrap()
        .expand("_default", &fetcher)
        .await
        .unwrap();
    assert!(expansion.has_errors());
    assert_eq!(expansion.errors(), ["ghost"]);
    assert_eq!(expansion.recipes().names(), ["kitty"]);
}

#[tokio::test]
async fn unparseable_role_file_counts_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("mangled.json"), "{not json").unwrap();

    let fetcher = DiskRoleFetcher::new(dir.path());
    let err = fetcher.fetch_role("mangled").await.unwrap_err();
    assert!(matches!(
        err,
        galley_runlist::FetchError::NotFound { .. }
    ));
}

#[tokio::test]
async fn environment_run_lists_apply_from_disk_too() {
    let dir = tempfile::tempdir().unwrap();
    write_role(
        dir.path(),
        "stubby",
        json!({
            "name": "stubby",
            "run_list": ["one", "two"],
            "env_run_lists": {"production": ["one", "two", "five"]},
        }),
    );

    let fetcher = DiskRoleFetcher::new(dir.path());
    let run_list = RunList::parse(["role[stubby]", "kitty"]).unwrap();

    let expansion = run_list.expand("production", &fetcher).await.unwrap();
    assert_eq!(
        expansion.recipes().names(),
        ["one", "two", "five", "kitty"]
    );

    let expansion = run_list.expand("_default", &fetcher).await.unwrap();
    assert_eq!(expansion.recipes().names(), ["one", "two", "kitty"]);
}
