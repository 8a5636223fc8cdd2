use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;
use std::time::Duration;

use saw_rank_core::{CriterionType, DecisionMatrix, ScoreRequest};
use saw_rank_remote::{
    build_catalog_provider, build_import_provider, build_scoring_provider, CatalogConfig,
    HttpScoringConfig, ImportUpload, ImportUploadConfig, ProviderError, ScoringProviderConfig,
};

/// Accept one connection, answer it with `status`/`body`, and hand back the raw
/// request text.
fn serve_once(status: u16, content_type: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
    let addr = listener.local_addr().expect("stub addr");
    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));

        let mut head = String::new();
        let mut content_length = 0usize;
        let mut chunked = false;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).expect("read header") == 0 {
                break;
            }
            let lower = line.to_ascii_lowercase();
            if let Some(v) = lower.strip_prefix("content-length:") {
                content_length = v.trim().parse().unwrap_or(0);
            }
            if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
                chunked = true;
            }
            head.push_str(&line);
            if line == "\r\n" {
                break;
            }
        }

        let mut body_in = Vec::new();
        if chunked {
            loop {
                let mut size_line = String::new();
                reader.read_line(&mut size_line).expect("chunk size");
                let size = usize::from_str_radix(size_line.trim(), 16).unwrap_or(0);
                let mut chunk = vec![0_u8; size + 2];
                reader.read_exact(&mut chunk).expect("chunk body");
                if size == 0 {
                    break;
                }
                body_in.extend_from_slice(&chunk[..size]);
            }
        } else {
            body_in.resize(content_length, 0);
            reader.read_exact(&mut body_in).expect("read body");
        }

        let mut stream = stream;
        let reply = format!(
            "HTTP/1.1 {status} X\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(reply.as_bytes()).expect("write reply");
        stream.flush().expect("flush");
        format!("{head}{}", String::from_utf8_lossy(&body_in))
    });
    (format!("http://{addr}"), handle)
}

fn example_request() -> ScoreRequest {
    ScoreRequest {
        alternatives: vec!["A".to_string(), "B".to_string()],
        criteria: vec!["Price".to_string(), "Rating".to_string()],
        weights: vec![0.5, 0.5],
        decision_matrix: DecisionMatrix::new(vec![vec![100.0, 8.0], vec![50.0, 4.0]]),
        criteria_types: vec![CriterionType::Cost, CriterionType::Benefit],
    }
}

#[tokio::test]
async fn local_provider_ranks_in_process() {
    let provider = build_scoring_provider(ScoringProviderConfig::Local).expect("local provider");
    let outcome = provider.score(example_request()).await.expect("score");
    assert_eq!(provider.name(), "local");
    assert_eq!(outcome.ranking[0].alternative, "A");
    assert_eq!(outcome.ranking[1].rank, 2);
}

#[tokio::test]
async fn http_scoring_sends_request_shape_and_reads_success() {
    let (base, handle) = serve_once(
        200,
        "application/json",
        r#"{"success":true,"ranking":[{"alternative":"A","score":0.75,"rank":1},{"alternative":"B","score":0.75,"rank":2}],"normalized_matrix":[[0.5,1.0],[1.0,0.5]]}"#,
    );
    let provider = build_scoring_provider(ScoringProviderConfig::Http(HttpScoringConfig::new(
        format!("{base}/calculate_saw"),
    )))
    .expect("http provider");

    let outcome = provider.score(example_request()).await.expect("score");
    assert_eq!(outcome.ranking.len(), 2);
    assert_eq!(outcome.normalized_matrix[1], vec![1.0, 0.5]);

    let raw = handle.join().expect("stub thread");
    assert!(raw.starts_with("POST /calculate_saw"));
    assert!(raw.contains(r#""criteria_types":["cost","benefit"]"#));
    assert!(raw.contains(r#""decision_matrix":[[100.0,8.0],[50.0,4.0]]"#));
    assert!(raw.contains(r#""alternatives":["A","B"]"#));
}

#[tokio::test]
async fn http_scoring_surfaces_failure_payload_verbatim() {
    let (base, handle) = serve_once(
        400,
        "application/json",
        r#"{"success":false,"error":"Decision matrix dimensions mismatch"}"#,
    );
    let provider = build_scoring_provider(ScoringProviderConfig::Http(HttpScoringConfig::new(
        format!("{base}/calculate_saw"),
    )))
    .expect("http provider");

    match provider.score(example_request()).await {
        Err(ProviderError::Remote(msg)) => assert_eq!(msg, "Decision matrix dimensions mismatch"),
        other => panic!("expected remote failure, got {other:?}"),
    }
    handle.join().expect("stub thread");
}

#[tokio::test]
async fn http_scoring_maps_plain_server_errors_to_api_errors() {
    let (base, handle) = serve_once(502, "text/plain", "bad gateway");
    let provider = build_scoring_provider(ScoringProviderConfig::Http(HttpScoringConfig::new(
        format!("{base}/calculate_saw"),
    )))
    .expect("http provider");

    match provider.score(example_request()).await {
        Err(ProviderError::Api { status, body }) => {
            assert_eq!(status, 502);
            assert_eq!(body, "bad gateway");
        }
        other => panic!("expected api error, got {other:?}"),
    }
    handle.join().expect("stub thread");
}

#[tokio::test]
async fn http_scoring_rejects_incomplete_rankings() {
    let (base, handle) = serve_once(
        200,
        "application/json",
        r#"{"success":true,"ranking":[{"alternative":"A","score":1.0,"rank":1}],"normalized_matrix":[[1.0,1.0],[0.5,0.5]]}"#,
    );
    let provider = build_scoring_provider(ScoringProviderConfig::Http(HttpScoringConfig::new(
        format!("{base}/calculate_saw"),
    )))
    .expect("http provider");

    assert!(matches!(
        provider.score(example_request()).await,
        Err(ProviderError::InvalidResponse(_))
    ));
    handle.join().expect("stub thread");
}

#[tokio::test]
async fn http_scoring_validates_before_sending() {
    let provider = build_scoring_provider(ScoringProviderConfig::Http(HttpScoringConfig::new(
        "http://127.0.0.1:9/calculate_saw",
    )))
    .expect("http provider");
    let mut request = example_request();
    request.weights.pop();
    assert!(matches!(
        provider.score(request).await,
        Err(ProviderError::Validation(_))
    ));
}

#[tokio::test]
async fn catalog_list_and_lookup_parse_records() {
    let (base, handle) = serve_once(
        200,
        "application/json",
        r#"{"success":true,"games":[{"name":"Hades","price_numeric":2499,"rating_score":4.8},{"appid":7}]}"#,
    );
    let provider = build_catalog_provider(CatalogConfig::new(base)).expect("catalog provider");
    let records = provider.list().await.expect("list");
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name.as_deref(), Some("Hades"));
    assert_eq!(records[0].price_minor, Some(2_499.0));
    assert!(records[1].name.is_none());
    let raw = handle.join().expect("stub thread");
    assert!(raw.starts_with("GET /get_steam_games"));

    let (base, handle) = serve_once(
        200,
        "application/json",
        r#"{"success":true,"game":{"name":"Celeste","min_ram_gb":2}}"#,
    );
    let provider = build_catalog_provider(CatalogConfig::new(base)).expect("catalog provider");
    let record = provider.lookup(" 504230 ").await.expect("lookup");
    assert_eq!(record.name.as_deref(), Some("Celeste"));
    let raw = handle.join().expect("stub thread");
    assert!(raw.starts_with("GET /search_steam_game/504230"));

    assert!(matches!(
        provider.lookup("../admin").await,
        Err(ProviderError::Config(_))
    ));
}

#[tokio::test]
async fn catalog_lookup_failure_is_remote_error() {
    let (base, handle) = serve_once(
        404,
        "application/json",
        r#"{"success":false,"error":"Game with AppID 1 not found"}"#,
    );
    let provider = build_catalog_provider(CatalogConfig::new(base)).expect("catalog provider");
    assert!(matches!(
        provider.lookup("1").await,
        Err(ProviderError::Remote(msg)) if msg.contains("not found")
    ));
    handle.join().expect("stub thread");
}

#[tokio::test]
async fn import_upload_posts_multipart_file() {
    let (base, handle) = serve_once(
        200,
        "application/json",
        r#"{"success":true,"criteria_from_file":["Price","Rating"],"alternatives":["A","B"],"decision_matrix":[[100,8],[50,4]]}"#,
    );
    let provider = build_import_provider(ImportUploadConfig::new(format!("{base}/upload_saw_data")))
        .expect("import provider");
    let imported = provider
        .upload(ImportUpload {
            file_name: "matrix.xlsx".to_string(),
            bytes: b"fake-spreadsheet".to_vec(),
        })
        .await
        .expect("upload");
    assert_eq!(imported.alternatives, vec!["A", "B"]);
    assert_eq!(imported.criteria, vec!["Price", "Rating"]);

    let raw = handle.join().expect("stub thread");
    assert!(raw.starts_with("POST /upload_saw_data"));
    assert!(raw.contains(r#"name="file""#));
    assert!(raw.contains(r#"filename="matrix.xlsx""#));
    assert!(raw.contains("fake-spreadsheet"));
}
