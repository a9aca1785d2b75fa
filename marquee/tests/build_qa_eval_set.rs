//! Runs the evaluation set pipeline, as wired by the script, against mocked Azure services.

use marquee::config::{Config, EvaluationConfig};
use marquee::setup;
use marquee_test_utils::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use temp_dir::TempDir;
use wiremock::MockServer;

const QA_DEPLOYMENT: &str = "gpt-4";

fn evaluation() -> EvaluationConfig {
    EvaluationConfig {
        model_name: QA_DEPLOYMENT.into(),
        subscription_id: "subscription".into(),
        resource_group: "group".into(),
        project_name: "project".into(),
    }
}

fn sample(count: usize) -> Vec<Value> {
    (0..count)
        .map(|n| {
            json!({
                "@search.score": 1.0,
                "id": n.to_string(),
                "title": format!("Movie {n}"),
                "synopsis": format!("A long synopsis of movie {n}")
            })
        })
        .collect()
}

#[test_log::test(tokio::test)]
async fn test_ten_documents_give_thirty_pairs() {
    let tempdir = TempDir::new().unwrap();
    let export_to = tempdir.child("data").join("qa.jsonl");

    let mock_server = MockServer::start().await;
    mock_search(&mock_server, "movies", sample(10)).await;
    let answer = json!({
        "question_answers": [
            {"question": "Who directed it?", "answer": "Someone did."},
            {"question": "When is it set?", "answer": "In the future."},
            {"question": "Where is it set?", "answer": "On a ship."}
        ]
    });
    mock_chat_completions(&mock_server, QA_DEPLOYMENT, &answer.to_string()).await;

    let config = Config {
        openai: openai_config(&mock_server.uri()),
        search: search_config(&mock_server.uri(), "movies"),
    };

    let report = setup::qa_evaluation_pipeline(&config, &evaluation(), &export_to)
        .unwrap()
        .run()
        .await
        .unwrap();

    assert!(report.is_complete());
    assert_eq!(report.dataset.len(), 30);

    let lines = fs_err::read_to_string(&export_to)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap())
        .collect::<Vec<_>>();
    assert_eq!(lines.len(), 30);
    assert_eq!(
        lines[4],
        json!({"question": "When is it set?", "ground_truth": "In the future."})
    );

    let requests = mock_server.received_requests().await.unwrap();
    let search: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(
        search,
        json!({
            "count": true,
            "search": "*",
            "searchFields": "synopsis",
            "select": "id, title, synopsis",
            "top": 10
        })
    );
}
