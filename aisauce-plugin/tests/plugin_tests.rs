//! Plugin against a local chat completion endpoint

use aisauce_common::Provider;
use aisauce_plugin::{AiSauce, AiSauceConfig, Item, SuggestError};
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use serial_test::serial;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

type Captured = Arc<Mutex<Vec<Value>>>;

/// Serve a completion endpoint answering with `content` and recording each
/// request body
async fn spawn_llm(status: StatusCode, content: Value) -> (String, Captured) {
    #[derive(Clone)]
    struct Llm {
        status: StatusCode,
        content: String,
        captured: Captured,
    }

    async fn completions(State(llm): State<Llm>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        llm.captured.lock().unwrap().push(body);
        let reply = json!({
            "choices": [{ "message": { "role": "assistant", "content": llm.content } }]
        });
        (llm.status, Json(reply))
    }

    let captured: Captured = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().route("/chat/completions", post(completions)).with_state(Llm {
        status,
        content: content.to_string(),
        captured: captured.clone(),
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}", addr), captured)
}

fn config_for(base_url: &str) -> AiSauceConfig {
    AiSauceConfig {
        provider: Provider {
            id: "local".to_string(),
            api_key: "sk-local".to_string(),
            api_base_url: base_url.to_string(),
            model: "test-model".to_string(),
        },
        ..AiSauceConfig::default()
    }
}

fn messy_item() -> Item {
    Item {
        path: PathBuf::from("/music/Busta Rhymes - Gimme Some More (winslow.edit).mp3"),
        title: " Busta Rhymes - Gimme Some More [Free DL via Soundcloud] ".to_string(),
        artist: "  winslow ".to_string(),
        genre: "  DnB, neurofunk  ".to_string(),
        date: "  14.11.2021  ".to_string(),
        ..Item::default()
    }
}

#[tokio::test]
async fn test_suggest_track_info_maps_response() {
    let (base, captured) = spawn_llm(
        StatusCode::OK,
        json!({
            "title": "Gimme Some More [Busta Rhymes] (winslow.edit)",
            "artist": "winslow",
            "album": "",
            "genre": "Drum And Bass; Neurofunk",
            "date": "2021"
        }),
    )
    .await;

    let plugin = AiSauce::new(&config_for(&base));
    assert!(plugin.suggestions_enabled());

    let info = plugin.suggest_track_info(&messy_item()).await.unwrap();
    assert_eq!(info.title, "Gimme Some More [Busta Rhymes] (winslow.edit)");
    assert_eq!(info.artist, "winslow");
    assert_eq!(info.genres.as_deref(), Some("Drum And Bass; Neurofunk"));
    assert_eq!(info.date.as_deref(), Some("2021"));
    assert_eq!(info.album_artist, None);

    // One request, pinned temperature, system prompt first
    let requests = captured.lock().unwrap().clone();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0]["model"], "test-model");
    assert_eq!(requests[0]["temperature"], 0.0);
    assert_eq!(requests[0]["messages"][0]["role"], "system");
    let user = requests[0]["messages"][1]["content"].as_str().unwrap();
    assert!(user.contains("winslow.edit"));
}

#[tokio::test]
async fn test_suggest_surfaces_api_errors() {
    let (base, _captured) = spawn_llm(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;
    let plugin = AiSauce::new(&config_for(&base));

    let err = plugin.suggest_track_info(&messy_item()).await.unwrap_err();
    assert!(matches!(err, SuggestError::Llm(_)));
}

#[test]
#[serial]
fn test_load_from_env_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("aisauce.toml");
    std::fs::write(
        &path,
        r#"
        user_prompt = "Fix these tags: {}"

        [provider]
        api_key = "sk-from-file"
        "#,
    )
    .unwrap();

    std::env::set_var("AISAUCE_CONFIG", &path);
    let config = AiSauceConfig::load(None);
    std::env::remove_var("AISAUCE_CONFIG");

    let config = config.unwrap();
    assert!(config.provider.has_api_key());
    assert_eq!(config.source().user_prompt, "Fix these tags: {}");
}

#[test]
#[serial]
fn test_missing_explicit_file_gives_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let config = AiSauceConfig::load(Some(&dir.path().join("absent.toml"))).unwrap();
    assert!(!config.provider.has_api_key());
}
