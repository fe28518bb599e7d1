mod common;

use common::{files_in, RecordingLogger, ScriptedEngine};
use httpmock::prelude::*;
use mixdown_core::{
    get_mix_preset, MixError, MixPipeline, MixerConfig, OutputFormat, UrlMixOptions,
};
use tempfile::tempdir;

async fn serve(server: &MockServer, path: &'static str, body: &'static [u8]) {
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(200)
                .header("Content-Type", "audio/mpeg")
                .body(body);
        })
        .await;
}

#[tokio::test]
async fn downloads_mixes_and_keeps_only_the_output() {
    let tmp = tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let server = MockServer::start_async().await;
    serve(&server, "/vocal.mp3", b"VOCAL-BYTES").await;
    serve(&server, "/beat.mp3", b"BEAT-BYTES").await;

    let pipeline =
        MixPipeline::with_engine(MixerConfig::new(&scratch), ScriptedEngine::succeeding());
    let options = UrlMixOptions::from(get_mix_preset("social-viral").settings);
    let logger = RecordingLogger::default();

    let result = pipeline
        .mix_from_urls(
            &server.url("/vocal.mp3"),
            &server.url("/beat.mp3"),
            &options,
            Some(&logger),
        )
        .await
        .unwrap();

    assert!(result.success);
    assert_eq!(result.format, OutputFormat::Social);
    assert_eq!(result.processing.lufs_target, -11.0);
    assert!(result.output_path.starts_with(&scratch));
    assert!(result.output_path.exists());
    assert_eq!(files_in(&scratch), vec![result.output_path.clone()]);

    let inputs = pipeline.engine().input_bytes.lock().unwrap();
    assert_eq!(inputs[0].0, b"VOCAL-BYTES");
    assert_eq!(inputs[0].1, b"BEAT-BYTES");

    assert!(logger
        .messages("info")
        .iter()
        .any(|m| m == "Downloading audio files for mixing"));
}

#[tokio::test]
async fn output_override_is_honoured() {
    let tmp = tempdir().unwrap();
    let server = MockServer::start_async().await;
    serve(&server, "/v", b"v").await;
    serve(&server, "/b", b"b").await;

    let target = tmp.path().join("release.mp3");
    let pipeline = MixPipeline::with_engine(
        MixerConfig::new(tmp.path().join("scratch")),
        ScriptedEngine::succeeding(),
    );
    let options = UrlMixOptions {
        output_path: Some(target.clone()),
        ..UrlMixOptions::default()
    };

    let result = pipeline
        .mix_from_urls(&server.url("/v"), &server.url("/b"), &options, None)
        .await
        .unwrap();

    assert_eq!(result.output_path, target);
    assert!(target.exists());
    assert!(files_in(&tmp.path().join("scratch")).is_empty());
}

#[tokio::test]
async fn http_404_fails_with_status_and_leaves_nothing() {
    let tmp = tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let server = MockServer::start_async().await;
    serve(&server, "/vocal.mp3", b"VOCAL-BYTES").await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/beat.mp3");
            then.status(404).body("not found");
        })
        .await;

    let pipeline =
        MixPipeline::with_engine(MixerConfig::new(&scratch), ScriptedEngine::succeeding());
    let err = pipeline
        .mix_from_urls(
            &server.url("/vocal.mp3"),
            &server.url("/beat.mp3"),
            &UrlMixOptions::default(),
            None,
        )
        .await
        .unwrap_err();

    match &err {
        MixError::Download { status, .. } => assert_eq!(*status, 404),
        other => panic!("expected download error, got {other:?}"),
    }
    assert_eq!(err.status_code(), Some(404));
    assert!(err.is_retryable());
    assert_eq!(pipeline.engine().spawn_count(), 0);
    assert!(files_in(&scratch).is_empty(), "{:?}", files_in(&scratch));
}

#[tokio::test]
async fn connection_failure_is_a_network_error() {
    let tmp = tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let server = MockServer::start_async().await;
    serve(&server, "/beat.mp3", b"BEAT-BYTES").await;

    let pipeline =
        MixPipeline::with_engine(MixerConfig::new(&scratch), ScriptedEngine::succeeding());
    let err = pipeline
        .mix_from_urls(
            "http://127.0.0.1:1/vocal.mp3",
            &server.url("/beat.mp3"),
            &UrlMixOptions::default(),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, MixError::Network { .. }), "{err:?}");
    assert!(err.is_retryable());
    assert!(files_in(&scratch).is_empty());
}

#[tokio::test]
async fn engine_failure_cleans_every_scratch_file() {
    let tmp = tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let server = MockServer::start_async().await;
    serve(&server, "/vocal.mp3", b"VOCAL-BYTES").await;
    serve(&server, "/beat.mp3", b"BEAT-BYTES").await;

    let pipeline = MixPipeline::with_engine(
        MixerConfig::new(&scratch),
        ScriptedEngine::failing("Error while filtering: Invalid argument"),
    );
    let err = pipeline
        .mix_from_urls(
            &server.url("/vocal.mp3"),
            &server.url("/beat.mp3"),
            &UrlMixOptions::default(),
            None,
        )
        .await
        .unwrap_err();

    match err {
        MixError::Processing { message } => {
            assert_eq!(message, "Error while filtering: Invalid argument")
        }
        other => panic!("expected processing error, got {other:?}"),
    }
    assert_eq!(pipeline.engine().spawn_count(), 1);
    assert!(files_in(&scratch).is_empty(), "{:?}", files_in(&scratch));
}

#[tokio::test]
async fn bad_scheme_is_rejected_before_touching_disk() {
    let tmp = tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let pipeline =
        MixPipeline::with_engine(MixerConfig::new(&scratch), ScriptedEngine::succeeding());

    let err = pipeline
        .mix_from_urls(
            "ftp://example.com/v.mp3",
            "https://example.com/b.mp3",
            &UrlMixOptions::default(),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, MixError::InputValidation(_)));
    assert!(!scratch.exists());
}

#[tokio::test]
async fn blank_output_override_is_rejected_before_downloading() {
    let tmp = tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let server = MockServer::start_async().await;
    let vocal = server
        .mock_async(|when, then| {
            when.method(GET).path("/vocal.mp3");
            then.status(200).body("VOCAL-BYTES");
        })
        .await;
    let beat = server
        .mock_async(|when, then| {
            when.method(GET).path("/beat.mp3");
            then.status(200).body("BEAT-BYTES");
        })
        .await;

    let pipeline =
        MixPipeline::with_engine(MixerConfig::new(&scratch), ScriptedEngine::succeeding());
    let options = UrlMixOptions {
        output_path: Some("".into()),
        ..UrlMixOptions::default()
    };
    let err = pipeline
        .mix_from_urls(
            &server.url("/vocal.mp3"),
            &server.url("/beat.mp3"),
            &options,
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, MixError::InputValidation(_)), "{err:?}");
    assert_eq!(vocal.hits_async().await, 0);
    assert_eq!(beat.hits_async().await, 0);
    assert_eq!(pipeline.engine().spawn_count(), 0);
    assert!(!scratch.exists());
}

#[tokio::test]
async fn failed_cleanup_does_not_mask_the_engine_error() {
    let tmp = tempdir().unwrap();
    let scratch = tmp.path().join("scratch");
    let server = MockServer::start_async().await;
    serve(&server, "/vocal.mp3", b"VOCAL-BYTES").await;
    serve(&server, "/beat.mp3", b"BEAT-BYTES").await;

    // A directory at the output path cannot be unlinked as a file.
    let blocked = tmp.path().join("blocked.mp3");
    std::fs::create_dir(&blocked).unwrap();

    let pipeline = MixPipeline::with_engine(
        MixerConfig::new(&scratch),
        ScriptedEngine {
            write_output: false,
            ..ScriptedEngine::failing("Conversion failed!")
        },
    );
    let options = UrlMixOptions {
        output_path: Some(blocked.clone()),
        ..UrlMixOptions::default()
    };
    let logger = RecordingLogger::default();

    let err = pipeline
        .mix_from_urls(
            &server.url("/vocal.mp3"),
            &server.url("/beat.mp3"),
            &options,
            Some(&logger),
        )
        .await
        .unwrap_err();

    match err {
        MixError::Processing { message } => assert_eq!(message, "Conversion failed!"),
        other => panic!("expected processing error, got {other:?}"),
    }
    assert!(blocked.is_dir());
    assert!(logger.messages("error").iter().any(|m| m == "Cleanup failed"));
    assert!(files_in(&scratch).is_empty(), "{:?}", files_in(&scratch));
}
