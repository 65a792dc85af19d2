use async_trait::async_trait;
use curl_uploader_core::config::UploadConfig;
use curl_uploader_core::contract::{MockToolLocator, MockTransferRunner, TransferRunner};
use curl_uploader_core::upload::{upload, UploadState};
use curl_uploader_core::verify::UploadWarning;
use curl_uploader_core::UploadError;
use std::fs::write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::{tempdir, TempDir};
use tokio::sync::mpsc::UnboundedSender;

const URL: &str = "https://example.com/upload";

fn fixture(names: &[&str]) -> (TempDir, String) {
    let tmp = tempdir().unwrap();
    for name in names {
        write(tmp.path().join(name), b"payload").unwrap();
    }
    let dir = tmp.path().to_string_lossy().replace('\\', "/");
    (tmp, dir)
}

fn config(files: String) -> UploadConfig {
    UploadConfig {
        files,
        url: URL.to_string(),
        ..Default::default()
    }
}

fn curl_locator() -> MockToolLocator {
    let mut locator = MockToolLocator::new();
    locator
        .expect_locate()
        .withf(|tool| tool == "curl")
        .returning(|_| Some(PathBuf::from("/usr/bin/curl")));
    locator
}

/// A runner that prints `output` in two chunks and exits with `exit_code`.
fn scripted_runner(output: &'static str, exit_code: i32) -> MockTransferRunner {
    let mut runner = MockTransferRunner::new();
    runner
        .expect_run()
        .times(1)
        .returning(move |_program, _args, stdout| {
            let (head, tail) = output.split_at(output.len() / 2);
            stdout.send(head.as_bytes().to_vec()).unwrap();
            stdout.send(tail.as_bytes().to_vec()).unwrap();
            Ok(exit_code)
        });
    runner
}

#[tokio::test]
async fn single_literal_file_ends_arguments_with_path_and_url() {
    let (_tmp, dir) = fixture(&["report.json"]);
    let path = format!("{dir}/report.json");

    let mut runner = MockTransferRunner::new();
    let expected_path = path.clone();
    runner
        .expect_run()
        .withf(move |program, args, _| {
            program == Path::new("/usr/bin/curl")
                && args.len() >= 2
                && args[args.len() - 2] == expected_path
                && args[args.len() - 1] == URL
        })
        .times(1)
        .returning(|_, _, stdout| {
            stdout.send(b"\r100    7  100    7\n".to_vec()).unwrap();
            Ok(0)
        });

    let report = upload(&config(path.clone()), &curl_locator(), &runner)
        .await
        .expect("upload should succeed");

    assert_eq!(report.files, vec![path.clone()]);
    assert_eq!(report.expected, 1);
    assert_eq!(report.completed, 1);
    assert_eq!(report.arguments, vec!["-T".to_string(), path, URL.to_string()]);
    assert_eq!(report.state, UploadState::Verified);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn glob_passes_one_brace_list_target() {
    let (_tmp, dir) = fixture(&["a.log", "b.log", "notes.txt"]);
    let expected_target = format!("{{{dir}/a.log,{dir}/b.log}}");

    let mut runner = MockTransferRunner::new();
    let target = expected_target.clone();
    runner
        .expect_run()
        .withf(move |_, args, _| args[0] == "-T" && args[1] == target && args[2] == URL)
        .times(1)
        .returning(|_, _, stdout| {
            stdout.send(b"\n100 a\n100 b".to_vec()).unwrap();
            Ok(0)
        });

    let report = upload(&config(format!("{dir}/*.log")), &curl_locator(), &runner)
        .await
        .expect("upload should succeed");

    assert_eq!(report.files, vec![format!("{dir}/a.log"), format!("{dir}/b.log")]);
    assert_eq!(report.arguments[1], expected_target);
}

#[tokio::test]
async fn all_markers_present_means_success_without_warning() {
    let (_tmp, dir) = fixture(&["a.log", "b.log"]);
    let runner = scripted_runner("header\r100   10  100   10\n\r100   20  100   20\n", 0);

    let report = upload(&config(format!("{dir}/*.log")), &curl_locator(), &runner)
        .await
        .expect("upload should succeed");

    assert_eq!(report.exit_code, 0);
    assert_eq!(report.completed, 2);
    assert!(report.warnings.is_empty());
}

#[tokio::test]
async fn missing_marker_is_a_warning_not_a_failure() {
    let (_tmp, dir) = fixture(&["a.log", "b.log"]);
    let output = "header\r100   10  100   10\n\r 40   20   40    8\n";
    let runner = scripted_runner(output, 0);

    let report = upload(&config(format!("{dir}/*.log")), &curl_locator(), &runner)
        .await
        .expect("exit code 0 must still succeed");

    assert_eq!(report.completed, 1);
    assert_eq!(report.expected, 2);
    assert_eq!(report.warnings.len(), 1);
    let warning = &report.warnings[0];
    assert!(warning.to_string().contains("1 of 2"));
    match warning {
        UploadWarning::IncompleteTransfer { tested_output, .. } => {
            assert_eq!(tested_output, output);
        }
    }
}

#[tokio::test]
async fn non_zero_exit_code_is_transfer_failed() {
    let (_tmp, dir) = fixture(&["a.log"]);
    let runner = scripted_runner("curl: (7) Failed to connect\n", 7);

    let err = upload(&config(format!("{dir}/a.log")), &curl_locator(), &runner)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::TransferFailed { exit_code: 7 }), "got {err:?}");
    assert!(err.to_string().contains('7'));
}

#[tokio::test]
async fn unmatched_pattern_fails_before_anything_runs() {
    let (_tmp, dir) = fixture(&["a.log"]);
    let pattern = format!("{dir}/missing/*.zip");

    let mut locator = MockToolLocator::new();
    locator.expect_locate().never();
    let mut runner = MockTransferRunner::new();
    runner.expect_run().never();

    let err = upload(&config(pattern.clone()), &locator, &runner)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::NoMatchingFiles { .. }), "got {err:?}");
    assert!(err.to_string().contains(&pattern));
}

#[tokio::test]
async fn missing_tool_fails_before_execution() {
    let (_tmp, dir) = fixture(&["a.log"]);

    let mut locator = MockToolLocator::new();
    locator.expect_locate().returning(|_| None);
    let mut runner = MockTransferRunner::new();
    runner.expect_run().never();

    let err = upload(&config(format!("{dir}/a.log")), &locator, &runner)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::ToolNotFound { ref tool } if tool == "curl"), "got {err:?}");
}

#[tokio::test]
async fn configured_tool_name_is_located() {
    let (_tmp, dir) = fixture(&["a.log"]);

    let mut locator = MockToolLocator::new();
    locator
        .expect_locate()
        .withf(|tool| tool == "curl-8")
        .times(1)
        .returning(|_| Some(PathBuf::from("/opt/curl-8")));
    let runner = scripted_runner("\n100 done", 0);

    let upload_config = UploadConfig {
        tool: Some("curl-8".into()),
        ..config(format!("{dir}/a.log"))
    };
    upload(&upload_config, &locator, &runner)
        .await
        .expect("upload should succeed");
}

#[tokio::test]
async fn credentials_are_masked_in_the_report() {
    let (_tmp, dir) = fixture(&["a.log"]);

    let mut runner = MockTransferRunner::new();
    runner
        .expect_run()
        .withf(|_, args, _| args.iter().any(|a| a == "alice:s3cret"))
        .returning(|_, _, _| Ok(0));

    let upload_config = UploadConfig {
        username: Some("alice".into()),
        password: Some("s3cret".into()),
        ..config(format!("{dir}/a.log"))
    };
    let report = upload(&upload_config, &curl_locator(), &runner)
        .await
        .expect("upload should succeed");

    assert!(report.arguments.contains(&"alice:***".to_string()));
    assert!(!report.arguments.iter().any(|a| a.contains("s3cret")));
}

struct StalledRunner;

#[async_trait]
impl TransferRunner for StalledRunner {
    async fn run(
        &self,
        _program: &Path,
        _args: &[String],
        stdout: UnboundedSender<Vec<u8>>,
    ) -> Result<i32, UploadError> {
        stdout.send(b"  0 ".to_vec()).ok();
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(0)
    }
}

#[tokio::test]
async fn timeout_stops_a_stalled_transfer() {
    let (_tmp, dir) = fixture(&["a.log"]);
    let upload_config = UploadConfig {
        timeout_secs: Some(1),
        ..config(format!("{dir}/a.log"))
    };

    let err = upload(&upload_config, &curl_locator(), &StalledRunner)
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::TimedOut(d) if d == Duration::from_secs(1)), "got {err:?}");
}
