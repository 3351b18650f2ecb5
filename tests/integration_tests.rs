//! Integration tests for the LingoSync gateway
//!
//! These tests run the real router on a local port, with the translation
//! engine, OCR, speech recognition and TTS services replaced by mock servers.

use std::io::Write;
use std::sync::Arc;

use base64::Engine as _;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::{
    matchers::{method, path},
    Mock, MockServer, Request, Respond, ResponseTemplate,
};

use lingosync::adapters::{DocumentAdapter, ImageAdapter, SpeechAdapter};
use lingosync::engine::{EngineHandle, HttpEngineLoader};
use lingosync::i18n::{LanguageDetector, TranslationMetrics, WhatlangDetector};
use lingosync::ocr::HttpOcrEngine;
use lingosync::server::{self, AppState, HttpOptions};
use lingosync::speech::{HttpSpeechRecognizer, HttpSpeechSynthesizer};
use lingosync::translation::ChunkedTranslator;
use lingosync::uploads::UploadDir;

const ENGLISH_SPEECH: &str = "Good morning everyone, thank you for coming to the meeting today. \
     We will talk about the new project and the plans for the next year.";

// ==================== Test Helpers ====================

/// Engine mock answering `<target>text` for every request
struct EchoTranslation;

impl Respond for EchoTranslation {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let body: Value = serde_json::from_slice(&request.body).expect("engine request body");
        ResponseTemplate::new(200).set_body_json(json!({
            "translation_text": format!(
                "<{}>{}",
                body["tgt_lang"].as_str().unwrap_or_default(),
                body["text"].as_str().unwrap_or_default()
            )
        }))
    }
}

struct TestOptions {
    engine_ready: bool,
    max_chunk_chars: Option<usize>,
    api_key: Option<&'static str>,
}

impl Default for TestOptions {
    fn default() -> Self {
        Self {
            engine_ready: true,
            max_chunk_chars: None,
            api_key: None,
        }
    }
}

struct TestApp {
    base_url: String,
    client: reqwest::Client,
    upload_dir: TempDir,
    ocr: MockServer,
    stt: MockServer,
    tts: MockServer,
    metrics: &'static TranslationMetrics,
    // Kept alive for the lifetime of the app
    _engine: MockServer,
}

impl TestApp {
    fn url(&self, route: &str) -> String {
        format!("{}{}", self.base_url, route)
    }

    fn upload_dir_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.upload_dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    async fn post_upload(&self, route: &str, file_name: &str, bytes: Vec<u8>, target: &str) -> reqwest::Response {
        let form = Form::new()
            .part("file", Part::bytes(bytes).file_name(file_name.to_string()))
            .text("target_lang", target.to_string());
        self.client
            .post(self.url(route))
            .multipart(form)
            .send()
            .await
            .expect("request")
    }
}

async fn mount_engine(server: &MockServer, ready: bool) {
    if ready {
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": "ready",
                "device": "cpu",
                "model": "nllb-200-distilled-600M"
            })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(EchoTranslation)
            .mount(server)
            .await;
    } else {
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(server)
            .await;
    }
}

async fn spawn_app(options: TestOptions) -> TestApp {
    let engine = MockServer::start().await;
    let ocr = MockServer::start().await;
    let stt = MockServer::start().await;
    let tts = MockServer::start().await;
    mount_engine(&engine, options.engine_ready).await;

    let upload_dir = TempDir::new().unwrap();
    let uploads = UploadDir::new(upload_dir.path());
    let client = reqwest::Client::new();
    let metrics: &'static TranslationMetrics = Box::leak(Box::new(TranslationMetrics::new()));

    let handle = Arc::new(EngineHandle::new(Arc::new(HttpEngineLoader::new(
        client.clone(),
        &engine.uri(),
    ))));
    let translator = Arc::new(
        ChunkedTranslator::new(handle)
            .with_max_chunk_chars(options.max_chunk_chars)
            .with_metrics(metrics),
    );
    let detector: Arc<dyn LanguageDetector> = Arc::new(WhatlangDetector::new());

    let documents = DocumentAdapter::new(translator.clone(), detector.clone(), uploads.clone());
    let images = ImageAdapter::new(
        translator.clone(),
        detector.clone(),
        Arc::new(HttpOcrEngine::new(client.clone(), &ocr.uri())),
        uploads.clone(),
    );
    let speech = SpeechAdapter::new(
        translator.clone(),
        detector,
        Arc::new(HttpSpeechRecognizer::new(client.clone(), &stt.uri())),
        Arc::new(HttpSpeechSynthesizer::new(client.clone(), &tts.uri())),
        uploads,
    );

    let state = AppState::new(translator, documents, images, speech)
        .with_metrics(metrics)
        .with_api_key(options.api_key.map(str::to_string));
    let app = server::router(state, &HttpOptions::default());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        base_url: format!("http://{}", address),
        client,
        upload_dir,
        ocr,
        stt,
        tts,
        metrics,
        _engine: engine,
    }
}

fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    {
        let mut zip = zip::ZipWriter::new(&mut buffer);
        zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        let body: String = paragraphs
            .iter()
            .map(|p| format!("<w:p><w:r><w:t>{}</w:t></w:r></w:p>", p))
            .collect();
        write!(
            zip,
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
            body
        )
        .unwrap();
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

async fn mount_tts(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/languages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "en": "English",
            "fr": "French",
            "de": "German"
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/synthesize"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"ID3-fake-mp3".to_vec()))
        .mount(server)
        .await;
}

async fn error_message(response: reqwest::Response) -> String {
    let body: Value = response.json().await.expect("json error body");
    body["error"].as_str().expect("error field").to_string()
}

// ==================== Operational Endpoint Tests ====================

#[tokio::test]
async fn test_health_endpoint() {
    let app = spawn_app(TestOptions::default()).await;

    let response = app.client.get(app.url("/")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["started_at"].is_string());
    assert!(body["status"].is_string());
}

#[tokio::test]
async fn test_languages_endpoint() {
    let app = spawn_app(TestOptions::default()).await;

    let body: Value = app
        .client
        .get(app.url("/api/languages"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let languages = body.as_array().expect("array");
    assert!(languages.len() > 50);
    let english = languages
        .iter()
        .find(|l| l["key"] == "english")
        .expect("english listed");
    assert_eq!(english["code"], "eng_Latn");
    assert_eq!(english["iso_639_1"], "en");
}

#[tokio::test]
async fn test_metrics_requires_api_key() {
    let app = spawn_app(TestOptions {
        api_key: Some("ops-key"),
        ..Default::default()
    })
    .await;

    let denied = app.client.get(app.url("/api/metrics")).send().await.unwrap();
    assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

    let allowed = app
        .client
        .get(app.url("/api/metrics"))
        .header("X-API-Key", "ops-key")
        .send()
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
    let body: Value = allowed.json().await.unwrap();
    assert_eq!(body["requests"], 0);
}

// ==================== Text Translation Tests ====================

#[tokio::test]
async fn test_translate_text() {
    let app = spawn_app(TestOptions::default()).await;

    let response = app
        .client
        .post(app.url("/api/translate/translate"))
        .json(&json!({"text": "Hello", "source_lang": "English", "target_lang": "fr"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["translated_text"], "<fra_Latn>Hello");
    assert_eq!(app.metrics.engine_calls(), 1);
}

#[tokio::test]
async fn test_translate_long_text_is_chunked() {
    let app = spawn_app(TestOptions {
        max_chunk_chars: Some(5),
        ..Default::default()
    })
    .await;

    let response = app
        .client
        .post(app.url("/api/translate/translate"))
        .json(&json!({"text": "Hello world", "source_lang": "eng_Latn", "target_lang": "deu_Latn"}))
        .send()
        .await
        .unwrap();

    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["translated_text"],
        "<deu_Latn>Hello <deu_Latn> worl <deu_Latn>d"
    );
    assert_eq!(app.metrics.engine_calls(), 3);
}

#[tokio::test]
async fn test_translate_empty_text() {
    let app = spawn_app(TestOptions::default()).await;

    let response = app
        .client
        .post(app.url("/api/translate/translate"))
        .json(&json!({"text": "   ", "source_lang": "en", "target_lang": "fr"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "Input text cannot be empty");
}

#[tokio::test]
async fn test_translate_unknown_language() {
    let app = spawn_app(TestOptions::default()).await;

    let response = app
        .client
        .post(app.url("/api/translate/translate"))
        .json(&json!({"text": "Hello", "source_lang": "en", "target_lang": "klingon"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("klingon"));
}

#[tokio::test]
async fn test_translate_malformed_body() {
    let app = spawn_app(TestOptions::default()).await;

    let response = app
        .client
        .post(app.url("/api/translate/translate"))
        .json(&json!({"text": "Hello"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.starts_with("Invalid request"));
}

#[tokio::test]
async fn test_engine_unavailable() {
    let app = spawn_app(TestOptions {
        engine_ready: false,
        ..Default::default()
    })
    .await;

    let response = app
        .client
        .post(app.url("/api/translate/translate"))
        .json(&json!({"text": "Hello", "source_lang": "en", "target_lang": "fr"}))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert!(error_message(response)
        .await
        .starts_with("Translation engine unavailable"));
}

// ==================== Document Tests ====================

#[tokio::test]
async fn test_translate_docx_document() {
    let app = spawn_app(TestOptions::default()).await;
    let docx = docx_bytes(&[
        "The annual report shows strong growth across all of our regional offices.",
        "We thank every employee for their hard work during the year.",
    ]);

    let response = app
        .post_upload("/api/documents/translate_document", "letter.docx", docx, "french")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/pdf");
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"translated_letter.pdf\""
    );
    let bytes = response.bytes().await.unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    assert_eq!(app.upload_dir_entries(), vec!["translated_letter.pdf".to_string()]);
}

#[tokio::test]
async fn test_cyrillic_document_keeps_its_text() {
    let app = spawn_app(TestOptions::default()).await;
    let docx = docx_bytes(&["Добрый день, коллеги"]);

    let response = app
        .post_upload("/api/documents/translate_document", "memo.docx", docx, "english")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.bytes().await.unwrap();
    let pdf = lopdf::Document::load_mem(&bytes).unwrap();
    let text = pdf.extract_text(&[1]).unwrap();
    assert_eq!(text.trim(), "<eng_Latn>Добрый день, коллеги");
}

#[tokio::test]
async fn test_document_text_outside_pdf_font() {
    let app = spawn_app(TestOptions::default()).await;
    let docx = docx_bytes(&["今天的会议非常重要，我们讨论了明年的计划。"]);

    let response = app
        .post_upload("/api/documents/translate_document", "plan.docx", docx, "japanese")
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(error_message(response)
        .await
        .starts_with("Translated text cannot be rendered to PDF"));
    assert!(app.upload_dir_entries().is_empty());
}

#[tokio::test]
async fn test_unsupported_document_format() {
    let app = spawn_app(TestOptions::default()).await;

    let response = app
        .post_upload(
            "/api/documents/translate_document",
            "notes.txt",
            b"just text".to_vec(),
            "french",
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(response).await,
        "Only PDF and DOCX files are supported"
    );
    assert!(app.upload_dir_entries().is_empty());
    assert_eq!(app.metrics.engine_calls(), 0);
}

#[tokio::test]
async fn test_upload_without_target_language() {
    let app = spawn_app(TestOptions::default()).await;
    let form = Form::new().part("file", Part::bytes(b"x".to_vec()).file_name("a.pdf"));

    let response = app
        .client
        .post(app.url("/api/documents/translate_document"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(error_message(response).await.contains("target_lang"));
}

// ==================== Image Tests ====================

#[tokio::test]
async fn test_translate_image() {
    let app = spawn_app(TestOptions::default()).await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "lines": [
                {"text": "Welcome to the city museum of modern history"},
                {"text": "Please keep your ticket with you at all times"}
            ]
        })))
        .expect(1)
        .mount(&app.ocr)
        .await;

    let response = app
        .post_upload("/api/images/image-translate", "sign.png", b"\x89PNG".to_vec(), "de")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(
        body["extracted_text"],
        "Welcome to the city museum of modern history\nPlease keep your ticket with you at all times"
    );
    assert_eq!(body["detected_language"], "en");
    assert!(body["translated_text"]
        .as_str()
        .unwrap()
        .starts_with("<deu_Latn>Welcome"));
    assert!(app.upload_dir_entries().is_empty());
}

#[tokio::test]
async fn test_image_without_text() {
    let app = spawn_app(TestOptions::default()).await;
    Mock::given(method("POST"))
        .and(path("/ocr"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"lines": []})))
        .mount(&app.ocr)
        .await;

    let response = app
        .post_upload("/api/images/image-translate", "blank.png", b"\x89PNG".to_vec(), "de")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "No text detected in image");
}

// ==================== Speech Tests ====================

#[tokio::test]
async fn test_translate_speech() {
    let app = spawn_app(TestOptions::default()).await;
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"transcript": ENGLISH_SPEECH})),
        )
        .expect(1)
        .mount(&app.stt)
        .await;
    mount_tts(&app.tts).await;

    let response = app
        .post_upload("/api/speech/speech-translate", "memo.wav", b"RIFF".to_vec(), "French")
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["transcription"], ENGLISH_SPEECH);
    assert_eq!(body["detected_language"], "en");
    assert_eq!(
        body["translated_text"],
        format!("<fra_Latn>{}", ENGLISH_SPEECH)
    );
    let audio = tokio_test::assert_ok!(base64::engine::general_purpose::STANDARD
        .decode(body["audio_base64"].as_str().unwrap()));
    assert_eq!(audio, b"ID3-fake-mp3");
    assert!(app.upload_dir_entries().is_empty());
}

#[tokio::test]
async fn test_speech_unsupported_target_does_no_work() {
    let app = spawn_app(TestOptions::default()).await;
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.stt)
        .await;

    let response = app
        .post_upload("/api/speech/speech-translate", "memo.wav", b"RIFF".to_vec(), "Klingon")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(response).await,
        "Language not supported: Klingon"
    );
    assert!(app.upload_dir_entries().is_empty());
    assert_eq!(app.metrics.engine_calls(), 0);
}

#[tokio::test]
async fn test_speech_unintelligible_audio() {
    let app = spawn_app(TestOptions::default()).await;
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(422))
        .mount(&app.stt)
        .await;

    let response = app
        .post_upload("/api/speech/speech-translate", "noise.wav", b"RIFF".to_vec(), "fr")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_message(response).await, "Could not understand audio");
    assert!(app.upload_dir_entries().is_empty());
}

#[tokio::test]
async fn test_speech_service_outage() {
    let app = spawn_app(TestOptions::default()).await;
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend down"))
        .mount(&app.stt)
        .await;

    let response = app
        .post_upload("/api/speech/speech-translate", "memo.wav", b"RIFF".to_vec(), "fr")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert!(error_message(response).await.contains("backend down"));
    assert!(app.upload_dir_entries().is_empty());
}

#[tokio::test]
async fn test_speech_same_language() {
    let app = spawn_app(TestOptions::default()).await;
    Mock::given(method("POST"))
        .and(path("/recognize"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"transcript": ENGLISH_SPEECH})),
        )
        .mount(&app.stt)
        .await;
    mount_tts(&app.tts).await;

    let response = app
        .post_upload("/api/speech/speech-translate", "memo.wav", b"RIFF".to_vec(), "en")
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        error_message(response).await,
        "Source and target languages are the same"
    );
    assert_eq!(app.metrics.engine_calls(), 0);
}
