use chrono::Utc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use serpsmith_core::RateIntervals;
use serpsmith_extract::{ExtractedPage, Heading};

use super::*;

fn unpaced() -> RateIntervals {
    RateIntervals {
        serp_ms: 0,
        generative_ms: 0,
        scrape_ms: 0,
        nlp_ms: 0,
    }
}

fn test_analyzer(base_url: &str, api_key: Option<&str>) -> Analyzer {
    let api = ApiClient::new(&unpaced(), 30, "serpsmith-test/0.1", 0, 0)
        .expect("client construction should not fail");
    Analyzer::new(Arc::new(api), base_url, api_key)
}

fn sample_page() -> ExtractedPage {
    ExtractedPage {
        source_url: "https://competitor.example.com/guide".to_owned(),
        headings: vec![
            Heading {
                level: 1,
                text: "Hemp Beverages".to_owned(),
            },
            Heading {
                level: 2,
                text: "Dosage".to_owned(),
            },
            Heading {
                level: 2,
                text: "Regulations".to_owned(),
            },
        ],
        paragraph_count: 8,
        word_count: 640,
        extraction_timestamp: Utc::now(),
    }
}

#[tokio::test]
async fn analyze_normalizes_topic_and_entity_weights() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .and(header("authorization", "Bearer nlp-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "entities": [
                {"name": "hemp", "type": "SUBSTANCE", "salience": 3.0},
                {"name": "FDA", "type": "ORG", "salience": 1.0},
            ],
            "topics": [
                {"label": "dosage", "weight": 2.0},
                {"label": "regulation", "weight": 1.0},
                {"label": "flavor", "weight": 1.0},
            ],
            "sentiment": 0.4,
        })))
        .expect(1)
        .mount(&server)
        .await;

    let analyzer = test_analyzer(&server.uri(), Some("nlp-key"));
    let cancel = CancellationToken::new();
    let profile = analyzer
        .analyze(&sample_page(), &cancel)
        .await
        .expect("analysis should succeed");

    assert!((profile.entities[0].salience - 0.75).abs() < 1e-9);
    assert!((profile.entities[1].salience - 0.25).abs() < 1e-9);
    let topic_sum: f64 = profile.topics.iter().map(|t| t.weight).sum();
    assert!((topic_sum - 1.0).abs() < 1e-9);
    assert!((profile.topics[0].weight - 0.5).abs() < 1e-9);
    assert!((profile.sentiment - 0.4).abs() < 1e-9);
    assert!((0.0..=1.0).contains(&profile.structural_score));
}

#[tokio::test]
async fn missing_credentials_fail_fast_without_a_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let analyzer = test_analyzer(&server.uri(), None);
    assert!(!analyzer.is_configured());
    let cancel = CancellationToken::new();
    let result = analyzer.analyze(&sample_page(), &cancel).await;
    assert!(matches!(result, Err(AnalyzeError::Unconfigured)));
}

#[tokio::test]
async fn out_of_range_sentiment_is_clamped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "entities": [],
            "topics": [],
            "sentiment": 3.5,
        })))
        .mount(&server)
        .await;

    let analyzer = test_analyzer(&server.uri(), Some("nlp-key"));
    let cancel = CancellationToken::new();
    let profile = analyzer
        .analyze(&sample_page(), &cancel)
        .await
        .expect("analysis should succeed");
    assert!((profile.sentiment - 1.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn non_object_body_yields_deserialize_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(["wrong"])))
        .mount(&server)
        .await;

    let analyzer = test_analyzer(&server.uri(), Some("nlp-key"));
    let cancel = CancellationToken::new();
    let result = analyzer.analyze(&sample_page(), &cancel).await;
    assert!(matches!(result, Err(AnalyzeError::Deserialize { .. })));
}

#[tokio::test]
async fn provider_failure_surfaces_as_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/analyze"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let analyzer = test_analyzer(&server.uri(), Some("nlp-key"));
    let cancel = CancellationToken::new();
    let result = analyzer.analyze(&sample_page(), &cancel).await;
    assert!(matches!(result, Err(AnalyzeError::UpstreamFailure(_))));
}
