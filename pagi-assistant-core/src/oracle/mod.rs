use anyhow::Result;
use async_trait::async_trait;

/// External language-understanding service.
///
/// Only `ask` is required. The semantic helpers are prompt-based on top of `ask`
/// and can be overridden by clients with dedicated endpoints. Any `Err` is a
/// transport failure and aborts the current cycle iteration.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Free-form completion.
    async fn ask(&self, prompt: &str) -> Result<String>;

    /// Short title for `text`, at most `max_words` words.
    async fn summarize(&self, text: &str, max_words: usize) -> Result<String> {
        let prompt = format!(
            "{text}\n---\nSummarize the conversation above as a title of at most {max_words} words. \
             Return only the title."
        );
        let rsp = self.ask(&prompt).await?;
        Ok(rsp.trim().trim_matches('"').to_string())
    }

    /// Whether `a` continues the topic described by `b`.
    async fn is_related(&self, a: &str, b: &str) -> Result<bool> {
        let prompt = format!(
            "Paragraph 1: {b}\n---\nParagraph 2: {a}\n---\n\
             Is Paragraph 2 related to Paragraph 1? Answer only TRUE or FALSE."
        );
        let rsp = self.ask(&prompt).await?;
        Ok(parse_bool_answer(&rsp))
    }

    /// Rewrites `sentence` so it stands on its own given `context`.
    async fn rewrite(&self, sentence: &str, context: &str) -> Result<String> {
        let prompt = format!(
            "{context}\n---\nRewrite the sentence `{sentence}` so it can be understood without the \
             conversation above, keeping its meaning. Return only the rewritten sentence."
        );
        let rsp = self.ask(&prompt).await?;
        Ok(rsp.trim().to_string())
    }
}

/// TRUE/FALSE answer check; anything without an explicit TRUE is false.
pub fn parse_bool_answer(rsp: &str) -> bool {
    let upper = rsp.to_uppercase();
    upper.contains("TRUE") && !upper.contains("FALSE")
}
