use module_publisher::cli::PublishArgs;
use module_publisher::load_config::{load_config, resolve_config};
use std::fs::write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

fn yaml_file(contents: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), contents).unwrap();
    file
}

#[test]
fn test_yaml_values_fill_unset_arguments() {
    let config = yaml_file(
        r#"
workdir: ./release
ledger_file: versions.json
commit_message_file: message.txt
upload_concurrency: 4
storage:
  bucket: cfbs
  public_base_url: https://cdn.example.com
"#,
    );

    let resolved = resolve_config(PublishArgs {
        config: Some(config.path().to_path_buf()),
        ..Default::default()
    })
    .expect("Config should resolve");

    assert_eq!(resolved.publish.workdir, PathBuf::from("./release"));
    assert_eq!(resolved.publish.index_file, "cfbs.json");
    assert_eq!(resolved.publish.commit_message_file, "message.txt");
    assert_eq!(resolved.publish.upload_concurrency, 4);
    assert_eq!(
        resolved.publish.commit_message_path(),
        PathBuf::from("./release/message.txt")
    );
    assert_eq!(resolved.storage.bucket, "cfbs");
    assert_eq!(
        resolved.storage.public_base_url.as_deref(),
        Some("https://cdn.example.com")
    );
}

#[test]
fn test_arguments_override_yaml() {
    let config = yaml_file("workdir: /from/yaml\nstorage:\n  bucket: yaml-bucket\n");

    let resolved = resolve_config(PublishArgs {
        workdir: Some(PathBuf::from("/from/args")),
        bucket: Some("arg-bucket".into()),
        upload_concurrency: Some(2),
        config: Some(config.path().to_path_buf()),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(resolved.publish.workdir, PathBuf::from("/from/args"));
    assert_eq!(resolved.publish.upload_concurrency, 2);
    assert_eq!(resolved.storage.bucket, "arg-bucket");
    assert_eq!(resolved.storage.public_base_url, None);
}

#[test]
fn test_missing_required_values_are_reported() {
    let no_bucket = resolve_config(PublishArgs {
        workdir: Some(PathBuf::from("/work")),
        ..Default::default()
    })
    .unwrap_err();
    assert!(no_bucket.to_string().contains("bucket is not set"));

    let no_workdir = resolve_config(PublishArgs {
        bucket: Some("cfbs".into()),
        ..Default::default()
    })
    .unwrap_err();
    assert!(no_workdir.to_string().contains("working directory is not set"));
}

#[test]
fn test_load_config_rejects_invalid_yaml() {
    let config = yaml_file("upload_concurrency: [not, a, number]\n");
    let err = load_config(config.path()).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config YAML"));

    let err = load_config("/definitely/not/here.yaml").unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
