//! Calls real vendors. Keys come from the environment or a `.env` file.
//!
//! Run with `cargo test --test cross_provider -- --ignored`.

use llm_suite::{ApiKeys, ChatRequest, Client, Message};

const MODELS: &[(&str, &str)] = &[
    ("OPENAI_API_KEY", "openai:gpt-4o-mini"),
    ("ANTHROPIC_API_KEY", "anthropic:claude-3-5-haiku-latest"),
    ("GEMINI_API_KEY", "gemini:gemini-2.0-flash"),
    ("GROQ_API_KEY", "groq:llama-3.1-8b-instant"),
    ("SAMBANOVA_API_KEY", "sambanova:Meta-Llama-3.1-8B-Instruct"),
];

#[tokio::test]
#[ignore = "requires vendor API keys"]
async fn test_live_providers() {
    dotenvy::dotenv().ok();
    let client = Client::new(ApiKeys::default());

    for (env_var, model) in MODELS {
        if std::env::var(env_var).map(|v| v.is_empty()).unwrap_or(true) {
            println!("skipping {model}: {env_var} not set");
            continue;
        }

        let request = ChatRequest::new(
            *model,
            vec![Message::user("Reply with the single word: pong")],
        )
        .max_tokens(16);

        let response = client
            .chat_completion(&request)
            .await
            .unwrap_or_else(|e| panic!("{model}: {e}"));
        assert!(!response.content().trim().is_empty(), "{model}: empty reply");

        let text = client
            .stream_chat_completion(&request)
            .await
            .unwrap_or_else(|e| panic!("{model}: {e}"))
            .text()
            .await
            .unwrap_or_else(|e| panic!("{model}: {e}"));
        assert!(!text.trim().is_empty(), "{model}: empty streamed reply");
        println!("{model}: {text}");
    }
}
