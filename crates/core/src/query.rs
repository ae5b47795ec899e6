use crate::embeddings::Embedder;
use crate::error::PipelineError;
use crate::models::{QaAnswer, RetrievedChunk};
use crate::traits::{AnswerGenerator, VectorIndex};
use tracing::{error, info};

const PROMPT_HEADER: &str = "# Your role
You are an expert at understanding the intent of the questioner and providing optimal answers from the documents.

# Instruction
Your task is to answer the question using the following retrieved context delimited by XML tags.

<retrieved context>
Retrieved Context:
";

const PROMPT_QUESTION: &str = "
</retrieved context>

# Question:
";

/// Joins retrieved chunk texts with newlines, in the order the store ranked them.
pub fn format_context(chunks: &[RetrievedChunk]) -> String {
    chunks
        .iter()
        .map(|chunk| chunk.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Fills the fixed prompt. Context and question are inserted verbatim, so
/// placeholder-like text inside either one is never substituted.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!("{PROMPT_HEADER}{context}{PROMPT_QUESTION}{question}")
}

async fn retrieve_and_generate(
    question: &str,
    top_k: usize,
    embedder: &dyn Embedder,
    store: &dyn VectorIndex,
    generator: &dyn AnswerGenerator,
) -> Result<QaAnswer, PipelineError> {
    if !store.collection_exists().await? {
        return Err(PipelineError::NoDocuments(format!(
            "collection '{}' does not exist, upload a document first",
            store.collection()
        )));
    }

    let query_vector = embedder.embed(question).await?;
    let context = store.search(&query_vector, top_k).await?;
    info!(retrieved = context.len(), top_k, "context retrieved");

    let prompt = build_prompt(&format_context(&context), question);
    let answer = generator.complete(&prompt).await?;

    Ok(QaAnswer {
        question: question.to_string(),
        answer,
        context,
    })
}

/// Retrieves the `top_k` chunks nearest to the question and asks the LLM.
///
/// The collection's existence is checked first so an empty corpus surfaces
/// as [`PipelineError::NoDocuments`] rather than a store error.
pub async fn answer_question(
    question: &str,
    top_k: usize,
    embedder: &dyn Embedder,
    store: &dyn VectorIndex,
    generator: &dyn AnswerGenerator,
) -> Result<QaAnswer, PipelineError> {
    let question = question.trim();
    if question.is_empty() {
        error!("question is empty");
        return Err(PipelineError::Input("question is empty".to_string()));
    }

    let result = retrieve_and_generate(question, top_k, embedder, store, generator).await;

    match result {
        Ok(answer) => {
            info!("answer retrieved successfully");
            Ok(answer)
        }
        Err(err) => {
            error!(error = %err, "error retrieving answer");
            Err(err)
        }
    }
}
