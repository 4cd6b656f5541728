// tests/api_tests.rs

use std::sync::Arc;

use code_clash::{
    cache::{MemoryCache, SessionCache},
    config::Config,
    routes,
    state::AppState,
    store::{MemoryStore, QuizStore, memory::OFFLINE_QUIZ_CODE},
};
use serde_json::{Value, json};

const ADMIN_PASSWORD: &str = "clash-admin";

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app_with(store: Arc<dyn QuizStore>) -> String {
    let config = Config {
        database_url: None,
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        admin_username: "admin".to_string(),
        admin_password: ADMIN_PASSWORD.to_string(),
        session_cache_dir: "unused".to_string(),
        server_port: 0,
    };

    let cache: Arc<dyn SessionCache> = Arc::new(MemoryCache::new());
    let state = AppState::new(store, cache, config).expect("Failed to build state");
    let app = routes::create_router(state);

    // Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn spawn_app() -> String {
    spawn_app_with(Arc::new(MemoryStore::new())).await
}

async fn admin_token(client: &reqwest::Client, address: &str) -> String {
    let resp: Value = client
        .post(format!("{}/api/admin/login", address))
        .json(&json!({ "username": "admin", "password": ADMIN_PASSWORD }))
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    resp["token"].as_str().expect("Token not found").to_string()
}

fn question(prompt: &str, correct: usize) -> Value {
    json!({
        "prompt": prompt,
        "options": ["A", "B", "C", "D"],
        "correct_option": correct
    })
}

async fn create_quiz(client: &reqwest::Client, address: &str, token: &str, body: Value) -> reqwest::Response {
    client
        .post(format!("{}/api/admin/quizzes", address))
        .bearer_auth(token)
        .json(&body)
        .send()
        .await
        .expect("Create quiz failed")
}

#[tokio::test]
async fn unknown_path_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_routes_require_a_valid_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let anonymous = client
        .get(format!("{}/api/admin/quizzes", address))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);

    let forged = client
        .get(format!("{}/api/admin/results", address))
        .bearer_auth("not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(forged.status().as_u16(), 401);

    let wrong_password = client
        .post(format!("{}/api/admin/login", address))
        .json(&json!({ "username": "admin", "password": "guess" }))
        .send()
        .await
        .unwrap();
    assert_eq!(wrong_password.status().as_u16(), 401);
}

#[tokio::test]
async fn quiz_code_lookup_validates_and_reports_misses() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let short = client
        .get(format!("{}/api/quizzes/code/AB1", address))
        .send()
        .await
        .unwrap();
    assert_eq!(short.status().as_u16(), 400);

    let missing = client
        .get(format!("{}/api/quizzes/code/ZZZZZZ", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
    let body: Value = missing.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("Invalid quiz code"));
}

#[tokio::test]
async fn offline_quiz_is_served_without_a_database() {
    let address = spawn_app_with(Arc::new(MemoryStore::with_offline_quiz())).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/quizzes/code/{}", address, OFFLINE_QUIZ_CODE.to_lowercase()))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let quiz: Value = response.json().await.unwrap();
    assert_eq!(quiz["code"], OFFLINE_QUIZ_CODE);
    assert_eq!(quiz["question_count"], 1);
    assert_eq!(quiz["duration_minutes"], 30);
}

#[tokio::test]
async fn incomplete_question_is_rejected() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    let mut blank = question("What is 2+2?", 1);
    blank["options"][2] = json!("");
    let response = create_quiz(
        &client,
        &address,
        &token,
        json!({ "title": "Maths", "time_limit_minutes": 10, "questions": [blank] }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 400);

    let quizzes: Vec<Value> = client
        .get(format!("{}/api/admin/quizzes", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(quizzes.is_empty());
}

#[tokio::test]
async fn full_quiz_flow() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    // 1. Author a quiz
    let response = create_quiz(
        &client,
        &address,
        &token,
        json!({
            "title": "Python Basics",
            "time_limit_minutes": 30,
            "questions": [question("Q1", 0), question("Q2", 1)]
        }),
    )
    .await;
    assert_eq!(response.status().as_u16(), 201);
    let quiz: Value = response.json().await.unwrap();
    assert_eq!(quiz["code"], "PYT001");
    assert_eq!(quiz["status"], "Draft");
    let quiz_id = quiz["id"].as_i64().unwrap();

    // 2. Activate it
    let response = client
        .put(format!("{}/api/admin/quizzes/{}", address, quiz_id))
        .bearer_auth(&token)
        .json(&json!({ "status": "Active" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // 3. Lookup hides answers
    let lookup = client
        .get(format!("{}/api/quizzes/code/%20pyt001%20", address))
        .send()
        .await
        .unwrap();
    assert_eq!(lookup.status().as_u16(), 200);
    let text = lookup.text().await.unwrap();
    assert!(!text.contains("correct_option"));

    // 4. Register a team
    let response = client
        .post(format!("{}/api/participants", address))
        .json(&json!({
            "team": "Byte, Busters",
            "college": "MIT",
            "members": ["Ada", "", "Grace"],
            "email": null
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let participant: Value = response.json().await.unwrap();
    assert_eq!(participant["members"], json!(["Ada", "Grace"]));
    assert_eq!(participant["status"], "Active");
    let participant_id = participant["id"].as_i64().unwrap();

    // 5. Take the quiz
    let response = client
        .post(format!("{}/api/sessions", address))
        .json(&json!({ "code": "pyt001", "participant_id": participant_id }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let view: Value = response.json().await.unwrap();
    assert_eq!(view["state"], "Ready");
    assert_eq!(view["answers"], json!([null, null]));
    assert!(view["remaining_seconds"].as_u64().unwrap() <= 1800);
    let session_id = view["session_id"].as_str().unwrap().to_string();
    let session_url = format!("{}/api/sessions/{}", address, session_id);

    for (q, option) in [(0, 0), (1, 2)] {
        let response = client
            .put(format!("{}/answers", session_url))
            .json(&json!({ "question_index": q, "option_index": option }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    let out_of_range = client
        .put(format!("{}/answers", session_url))
        .json(&json!({ "question_index": 5, "option_index": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(out_of_range.status().as_u16(), 400);

    let view: Value = client
        .post(format!("{}/next", session_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(view["current_question"], 1);
    assert_eq!(view["answered"], 2);

    // 6. Submit closes the session
    let response = client
        .post(format!("{}/submit", session_url))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let result: Value = response.json().await.unwrap();
    assert_eq!(result["score"], 50.0);
    assert_eq!(result["correct"], 1);
    assert_eq!(result["total"], 2);
    assert_eq!(result["team"], "Byte, Busters");

    let again = client
        .post(format!("{}/submit", session_url))
        .send()
        .await
        .unwrap();
    assert_eq!(again.status().as_u16(), 404);

    let late_answer = client
        .put(format!("{}/answers", session_url))
        .json(&json!({ "question_index": 0, "option_index": 1 }))
        .send()
        .await
        .unwrap();
    assert_eq!(late_answer.status().as_u16(), 404);
    let closed = client.get(&session_url).send().await.unwrap();
    assert_eq!(closed.status().as_u16(), 404);

    // 7. Admin views
    let results: Vec<Value> = client
        .get(format!("{}/api/admin/results?quiz_id={}", address, quiz_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["rank"], 1);

    let export = client
        .get(format!("{}/api/admin/results/export", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(export.status().as_u16(), 200);
    let disposition = export
        .headers()
        .get("content-disposition")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains("quiz_results_"));
    let csv = export.text().await.unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Rank,Team Name,College,Score (%),Correct Answers,Total Questions,Time Taken"
    );
    assert!(lines[1].starts_with("1,\"Byte, Busters\",\"MIT\",50.0%,1,2,"));

    let participants: Vec<Value> = client
        .get(format!("{}/api/admin/participants?q=byte", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["status"], "Completed");

    let dashboard: Value = client
        .get(format!("{}/api/admin/dashboard", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(dashboard["total_teams"], 1);
    assert_eq!(dashboard["active_quizzes"], 1);
    assert_eq!(dashboard["completed_today"], 1);
    assert_eq!(dashboard["total_members"], 2);

    // 8. Leaving an unfinished attempt removes it
    let view: Value = client
        .post(format!("{}/api/sessions", address))
        .json(&json!({ "code": "PYT001" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let abandoned_url = format!(
        "{}/api/sessions/{}",
        address,
        view["session_id"].as_str().unwrap()
    );
    let response = client.delete(&abandoned_url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 204);
    let gone = client.get(&abandoned_url).send().await.unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn exporting_nothing_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    let response = client
        .get(format!("{}/api/admin/results/export", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let stats: Value = client
        .get(format!("{}/api/admin/results/stats", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["total_participants"], 0);
    assert_eq!(stats["average_time"], "0:00");
}

#[tokio::test]
async fn feedback_is_collected_and_summarized() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = admin_token(&client, &address).await;

    for (rating, comment) in [(5, "Loved it"), (4, "Nice"), (2, "<b>Too hard</b>")] {
        let response = client
            .post(format!("{}/api/feedback", address))
            .json(&json!({ "team": "Byte Busters", "rating": rating, "comment": comment }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    let bad = client
        .post(format!("{}/api/feedback", address))
        .json(&json!({ "team": "Byte Busters", "rating": 6, "comment": "!" }))
        .send()
        .await
        .unwrap();
    assert_eq!(bad.status().as_u16(), 400);

    let body: Value = client
        .get(format!("{}/api/admin/feedback", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["summary"]["total"], 3);
    assert_eq!(body["summary"]["average_rating"], 3.7);
    assert_eq!(body["summary"]["positive_percentage"], 67);
    let comments: Vec<&str> = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["comment"].as_str().unwrap())
        .collect();
    assert!(comments.contains(&"Too hard"));
}

#[tokio::test]
async fn unknown_session_is_404() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!(
            "{}/api/sessions/{}/submit",
            address,
            uuid::Uuid::new_v4()
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}
