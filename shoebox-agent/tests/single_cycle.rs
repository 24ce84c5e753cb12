use std::path::{Path, PathBuf};

use shoebox_agent::{Cli, Exit};

fn write_config(root: &Path) -> PathBuf {
    for dir in ["inbox", "photos"] {
        std::fs::create_dir(root.join(dir)).unwrap();
    }
    let path = root.join("shoebox.toml");
    std::fs::write(
        &path,
        format!(
            r#"
logdir = "{root}/logs"
lockfile = "{root}/shoebox.lock"
pollinginterval = "1m"
source = "{root}/inbox"
destination = ["{root}/photos"]
exiftool = "{root}/no-such-exiftool"

[notifications]
enabled = false
"#,
            root = root.display()
        ),
    )
    .unwrap();
    path
}

#[tokio::test]
async fn single_cycle_leaves_unidentifiable_files_and_cleans_up() {
    let root = tempfile::tempdir().unwrap();
    let config = write_config(root.path());
    let photo = root.path().join("inbox/IMG_0001.HEIC");
    std::fs::write(&photo, b"not really a photo").unwrap();

    let exit = shoebox_agent::run(Cli {
        config: Some(config),
        once: true,
        ..Cli::default()
    })
    .await;

    assert_eq!(exit, Exit::Completed);
    // Without a metadata tool the file type is unknown, so nothing moves.
    assert!(photo.exists());
    assert_eq!(std::fs::read_dir(root.path().join("photos")).unwrap().count(), 0);
    assert!(!root.path().join("shoebox.lock").exists());

    let logs: Vec<_> = std::fs::read_dir(root.path().join("logs"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(logs.len(), 1);
    assert!(logs[0].ends_with(".log"));
}

#[tokio::test]
async fn missing_configuration_fails_before_anything_else() {
    let root = tempfile::tempdir().unwrap();

    let exit = shoebox_agent::run(Cli {
        config: Some(root.path().join("absent.toml")),
        once: true,
        ..Cli::default()
    })
    .await;

    assert_eq!(exit, Exit::Failed);
    assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
}
