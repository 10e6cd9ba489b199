//! Hacker News source against a mocked Algolia + Firebase server, driven
//! through a full pipeline run.

use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use askbot_scout::pipeline::AnswerBot;
use askbot_scout::retry::RetryPolicy;
use askbot_scout::sources::{DiscussionSource, HackerNewsSource};
use askbot_scout::testing::{
    MemoryLedger, RecordingNotifier, RecordingPublisher, ScriptedGenerator,
};
use hn_client::HnClient;

async fn mount_item(server: &MockServer, id: u64, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/item/{id}.json")))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn hn_server() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search_by_date"))
        .and(query_param("tags", "ask_hn"))
        .and(query_param("numericFilters", "points>40"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hits": [
                {
                    "objectID": "100",
                    "title": "Ask HN: What language for CLIs?",
                    "author": "asker",
                    "created_at": "2024-03-01T12:00:00.000Z",
                    "points": 120,
                    "num_comments": 4,
                    "story_text": "I write small tools."
                },
                {
                    "objectID": "200",
                    "title": "Show HN: My CLI",
                    "author": "maker",
                    "created_at": "2024-03-01T13:00:00.000Z",
                    "points": 90
                }
            ],
            "nbHits": 2
        })))
        .mount(&server)
        .await;

    let items = [
        json!({"id": 100, "type": "story", "by": "asker", "kids": [101, 102]}),
        json!({
            "id": 101, "type": "comment", "by": "alice", "text": "Rust &#62; Go", "kids": [103]
        }),
        json!({"id": 102, "type": "comment", "deleted": true, "kids": [104]}),
        json!({"id": 103, "type": "comment", "by": "bob", "text": "agreed"}),
        json!({"id": 104, "type": "comment", "by": "carol", "text": "Python &amp; Go"}),
    ];
    for item in items {
        let id = item["id"].as_u64().unwrap();
        mount_item(&server, id, item).await;
    }

    server
}

fn source_for(server: &MockServer) -> HackerNewsSource {
    let client = HnClient::new().with_base_urls(server.uri(), server.uri());
    HackerNewsSource::new(client, 40).with_retry(RetryPolicy::immediate(2))
}

#[tokio::test]
async fn candidates_use_canonical_item_urls() {
    let server = hn_server().await;
    let posts = source_for(&server).list_candidates().await.unwrap();

    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].url, "https://news.ycombinator.com/item?id=100");
    assert_eq!(posts[0].story_text.as_deref(), Some("I write small tools."));
    assert_eq!(posts[0].created_at.to_string(), "2024-03-01");
}

#[tokio::test]
async fn full_run_answers_ask_hn_and_skips_show_hn() {
    let server = hn_server().await;
    let generator = ScriptedGenerator::new(["Rust, with Python and Go close behind."]);
    let store = Arc::new(MemoryLedger::default());
    let publisher = Arc::new(RecordingPublisher::default());
    let notifier = Arc::new(RecordingNotifier::default());

    let stats = AnswerBot::new(
        Arc::new(source_for(&server)),
        Arc::new(generator.clone()),
        store.clone(),
        publisher.clone(),
        notifier.clone(),
    )
    .run()
    .await
    .unwrap();

    assert_eq!(stats.selected, 1);
    assert_eq!(stats.answered, 1);

    let prompt = &generator.prompts()[0];
    assert!(prompt.contains("alice:Rust > Go\n\tbob:agreed\ncarol:Python & Go"));
    assert!(prompt
        .contains("Formulate an answer to this question: What language for CLIs?\nfrom asker"));
    assert!(prompt.contains("with this background from the author: I write small tools.\n"));

    let rows = store.rows();
    assert_eq!(rows[0].url, "https://news.ycombinator.com/item?id=100");
    assert_eq!(rows[0].question, "What language for CLIs?");

    assert_eq!(
        publisher.tweets(),
        vec![concat!(
            "What language for CLIs?\n",
            "Rust, with Python and Go close behind.\n",
            "https://news.ycombinator.com/item?id=100",
        )]
    );
    assert_eq!(notifier.digests()[0].subject(), "1 New Answers");
}

#[tokio::test]
async fn server_errors_abort_the_post_after_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/item/7.json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(2)
        .mount(&server)
        .await;

    let source = source_for(&server);
    let url = "https://news.ycombinator.com/item?id=7";
    let post = askbot_scout::testing::post(url, "Ask HN: x", None);
    let post = askbot_common::Post {
        id: "7".into(),
        ..post
    };

    assert!(source.fetch_tree(&post).await.is_err());
}
