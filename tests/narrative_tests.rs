#[cfg(test)]
mod tests{
    use crm_lens::{
        config::NarrativeConfig,
        errors::NarrativeError,
        narrative::{
            GeminiClient,
            NO_DATA_MESSAGE,
            UNAVAILABLE_MESSAGE,
            Prompt,
        },
        result::NarrativeResult,
        Narrative,
        NarrativeService,
        Narrator,
        PromptBuilder,
        Record,
        RequestState,
    };
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::{
        Arc,
        atomic::{
            AtomicUsize,
            Ordering
        }
    };
    use wiremock::{
        Mock,
        MockServer,
        ResponseTemplate,
        matchers::{body_partial_json, header, method, path},
    };

    struct CountingService {
        calls: AtomicUsize,
        fail: bool,
    }

    impl CountingService {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    #[async_trait]
    impl NarrativeService for CountingService {
        async fn generate(&self, prompt: &Prompt) -> NarrativeResult<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(NarrativeError::Status {
                    status: 429,
                    body: "quota exceeded".to_string(),
                });
            }
            Ok(format!("answer for {} records", prompt.sample))
        }
    }

    fn records() -> Vec<Record> {
        vec![
            Record::from_pairs([("ContactID", "CID1"), ("Region", "North"), ("PurchaseAmount", "500")]),
            Record::from_pairs([("ContactID", "CID2"), ("Region", "North"), ("PurchaseAmount", "900")]),
        ]
    }

    fn config(endpoint: String) -> NarrativeConfig {
        NarrativeConfig {
            endpoint,
            model: "test-model".to_string(),
            api_key: Some("secret".to_string()),
            timeout_secs: 5,
            ..NarrativeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_empty_set_short_circuits() {
        let service = CountingService::new(false);
        let narrator = Narrator::new(service.clone(), PromptBuilder::default());
        let empty: Vec<Record> = Vec::new();
        let narrative = narrator.answer(&empty, "Who buys most?").await;
        assert_eq!(narrative, Narrative::NoData);
        assert_eq!(narrative.text(), NO_DATA_MESSAGE);
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_calls_service_once() {
        let service = CountingService::new(false);
        let narrator = Narrator::new(service.clone(), PromptBuilder::new(1));
        let narrative = narrator.answer(&records(), "Who buys most?").await;
        assert_eq!(narrative, Narrative::Answered("answer for 1 records".to_string()));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_service_failure_becomes_placeholder() {
        let service = CountingService::new(true);
        let narrator = Narrator::new(service.clone(), PromptBuilder::default());
        let narrative = narrator.answer(&records(), "Who buys most?").await;
        assert!(matches!(narrative, Narrative::Unavailable { ref reason } if reason.contains("429")));
        assert_eq!(narrative.text(), UNAVAILABLE_MESSAGE);
        assert_eq!(RequestState::from(narrative), RequestState::Failed(UNAVAILABLE_MESSAGE.to_string()));
    }

    #[tokio::test]
    async fn test_unconfigured_narrator_is_unavailable() {
        let narrator = Narrator::from_config(&NarrativeConfig::default());
        let narrative = narrator.answer(&records(), "anything").await;
        assert_eq!(narrative.text(), UNAVAILABLE_MESSAGE);
    }

    #[tokio::test]
    async fn test_gemini_client_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .and(header("x-goog-api-key", "secret"))
            .and(body_partial_json(json!({
                "generationConfig": {"topK": 64, "maxOutputTokens": 8192}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "## North"}, {"text": "\nTwo customers."}]}
                }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(server.uri())).unwrap();
        let narrator = Narrator::new(Arc::new(client), PromptBuilder::default());
        let narrative = narrator.answer(&records(), "Summarize").await;
        assert_eq!(narrative, Narrative::Answered("## North\nTwo customers.".to_string()));
    }

    #[tokio::test]
    async fn test_gemini_client_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal"))
            .mount(&server)
            .await;

        let client = GeminiClient::new(&config(server.uri())).unwrap();
        let prompt = PromptBuilder::default().build(&records(), "q").unwrap().unwrap();
        let result = client.generate(&prompt).await;
        assert!(matches!(result, Err(NarrativeError::Status { status: 500, ref body }) if body == "internal"));
    }

    #[tokio::test]
    async fn test_gemini_client_malformed_and_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/broken:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1beta/models/test-model:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"candidates": []})))
            .mount(&server)
            .await;

        let prompt = PromptBuilder::default().build(&records(), "q").unwrap().unwrap();

        let broken = NarrativeConfig {
            model: "broken".to_string(),
            ..config(server.uri())
        };
        let client = GeminiClient::new(&broken).unwrap();
        assert!(matches!(client.generate(&prompt).await, Err(NarrativeError::Malformed { .. })));

        let client = GeminiClient::new(&config(server.uri())).unwrap();
        assert!(matches!(client.generate(&prompt).await, Err(NarrativeError::EmptyResponse)));
    }
}
