//! Ask command - answers one question from the command line

use clap::Args;

use crate::domain::{AnswerPipeline, AnswerRequest};

#[derive(Args, Debug)]
pub struct AskArgs {
    /// The travel question
    pub question: String,

    /// Restrict retrieval to one city
    #[arg(long)]
    pub city: Option<String>,

    /// Chat model used for the answer
    #[arg(long, default_value = "mistral-small-latest")]
    pub model: String,

    /// Retrieval strategy; unknown names use the configured default
    #[arg(long)]
    pub strategy: Option<String>,

    /// Print the flat answer record instead of the full result
    #[arg(long)]
    pub record: bool,
}

impl AskArgs {
    fn to_request(&self) -> AnswerRequest {
        AnswerRequest {
            question: self.question.clone(),
            city: self.city.clone(),
            model: self.model.clone(),
            strategy: self.strategy.clone(),
        }
    }
}

/// Answer the question and print it as pretty JSON on stdout
pub async fn run(args: AskArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let state = crate::create_app_state(&config).await?;

    println!("{}", answer_json(&state.pipeline, &args).await?);
    Ok(())
}

async fn answer_json(pipeline: &AnswerPipeline, args: &AskArgs) -> anyhow::Result<String> {
    let result = pipeline.answer(args.to_request()).await?;

    let json = if args.record {
        serde_json::to_string_pretty(&result.record())?
    } else {
        serde_json::to_string_pretty(&result)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::state::mock;

    fn args(model: &str, record: bool) -> AskArgs {
        AskArgs {
            question: "Where can I eat koshary?".to_string(),
            city: Some("Cairo".to_string()),
            model: model.to_string(),
            strategy: Some("qdrant".to_string()),
            record,
        }
    }

    #[tokio::test]
    async fn test_answer_json_full_result() {
        let state = mock::state();

        let json = answer_json(&state.pipeline, &args(mock::MODEL, false))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["generation"]["answer"], "Try koshary at Abou Tarek.");
        assert_eq!(value["city"], "Cairo");
    }

    #[tokio::test]
    async fn test_answer_json_record() {
        let state = mock::state();

        let json = answer_json(&state.pipeline, &args(mock::MODEL, true))
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["relevance"], "RELEVANT");
        assert_eq!(value["model_used"], mock::MODEL);
        assert_eq!(value["search_type"], "Qdrant");
    }

    #[tokio::test]
    async fn test_invalid_model_fails() {
        let state = mock::state();

        let err = answer_json(&state.pipeline, &args("gpt-4", false))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unknown model choice: gpt-4"));
    }
}
