use std::future::Future;
use std::io::Write;
use std::sync::Arc;
use ns_core::{EmbeddingService, Error, QueryConfig, Result, ScoredMatch, VectorIndex};
use ns_feeds::IngestManager;
use tokio::sync::mpsc;
use tracing::debug;
use crate::render::{render_matches, render_outcome};

/// Why the loop ended. All of them are a clean shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    ExitWord,
    EndOfInput,
    Interrupted,
}

#[derive(Debug)]
enum State {
    AwaitingInput,
    Embedding(String),
    Querying(Vec<f32>),
    Rendering(Vec<ScoredMatch>),
    Stopped(StopReason),
}

/// Embed `text` and fetch its `top_k` nearest articles.
pub async fn search(
    embedder: &dyn EmbeddingService,
    index: &dyn VectorIndex,
    text: &str,
    top_k: usize,
) -> Result<Vec<ScoredMatch>> {
    let vector = embedder.generate_embeddings(text).await?;
    index.query(&vector, top_k).await
}

/// Gated ingestion followed by the query loop. A skipped ingestion still
/// starts the loop. `shutdown` during ingestion is `Error::UserAbort`.
pub async fn ingest_then_search<W, S>(
    manager: &IngestManager,
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    config: QueryConfig,
    input: mpsc::Receiver<String>,
    mut output: W,
    shutdown: S,
) -> Result<StopReason>
where
    W: Write,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    let outcome = tokio::select! {
        outcome = manager.run_if_needed() => outcome?,
        _ = &mut shutdown => return Err(Error::UserAbort),
    };
    render_outcome(&mut output, &outcome)?;

    QueryLoop::new(embedder, index, config, input, output)
        .run(shutdown)
        .await
}

/// Interactive read, embed, query, render cycle.
///
/// Operator input arrives as lines on `input`; a closed channel is end of
/// input. One query is fully rendered before the next line is taken.
/// Nothing is carried over between queries.
pub struct QueryLoop<W> {
    embedder: Arc<dyn EmbeddingService>,
    index: Arc<dyn VectorIndex>,
    config: QueryConfig,
    input: mpsc::Receiver<String>,
    output: W,
}

impl<W: Write> QueryLoop<W> {
    pub fn new(
        embedder: Arc<dyn EmbeddingService>,
        index: Arc<dyn VectorIndex>,
        config: QueryConfig,
        input: mpsc::Receiver<String>,
        output: W,
    ) -> Self {
        Self {
            embedder,
            index,
            config,
            input,
            output,
        }
    }

    /// Runs until an exit word, end of input, or `shutdown` resolving.
    /// Embedding and index failures end the loop with their error.
    pub async fn run<S>(mut self, shutdown: S) -> Result<StopReason>
    where
        S: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        writeln!(self.output, "\nVítajte vo vyhľadávaní podobných správ!")?;
        writeln!(self.output, "Pre každý dotaz nájdem najrelevantnejšie správy pomocou kosínusovej podobnosti.")?;
        let hint = self.exit_hint().to_string();
        writeln!(self.output, "Pre ukončenie napíšte '{}'", hint)?;

        let mut state = State::AwaitingInput;
        loop {
            state = match state {
                State::AwaitingInput => {
                    writeln!(self.output, "\nZadajte text, ku ktorému chcete nájsť podobné správy:")?;
                    self.output.flush()?;

                    let read = tokio::select! {
                        _ = &mut shutdown => None,
                        line = self.input.recv() => Some(line),
                    };
                    match read {
                        None => State::Stopped(StopReason::Interrupted),
                        Some(None) => State::Stopped(StopReason::EndOfInput),
                        Some(Some(line)) => self.classify(line.trim())?,
                    }
                }
                State::Embedding(text) => {
                    writeln!(self.output, "\nVytváranie vektorovej reprezentácie pre text: '{}'", text)?;
                    let embedded = tokio::select! {
                        _ = &mut shutdown => None,
                        vector = self.embedder.generate_embeddings(&text) => Some(vector?),
                    };
                    match embedded {
                        Some(vector) => State::Querying(vector),
                        None => State::Stopped(StopReason::Interrupted),
                    }
                }
                State::Querying(vector) => {
                    writeln!(self.output, "Vyhľadávam najpodobnejšie správy...")?;
                    let found = tokio::select! {
                        _ = &mut shutdown => None,
                        matches = self.index.query(&vector, self.config.top_k) => Some(matches?),
                    };
                    match found {
                        Some(matches) => State::Rendering(matches),
                        None => State::Stopped(StopReason::Interrupted),
                    }
                }
                State::Rendering(matches) => {
                    debug!("Rendering {} matches", matches.len());
                    render_matches(&mut self.output, &matches)?;
                    State::AwaitingInput
                }
                State::Stopped(reason) => {
                    match reason {
                        StopReason::Interrupted => {
                            writeln!(self.output, "\nVyhľadávanie prerušené používateľom.")?
                        }
                        StopReason::ExitWord | StopReason::EndOfInput => {
                            writeln!(self.output, "\nĎakujem za použitie vyhľadávania. Dovidenia!")?
                        }
                    }
                    self.output.flush()?;
                    return Ok(reason);
                }
            };
        }
    }

    fn classify(&mut self, input: &str) -> Result<State> {
        if self.config.is_exit_word(input) {
            return Ok(State::Stopped(StopReason::ExitWord));
        }
        if input.is_empty() {
            writeln!(self.output, "Prázdny dotaz, skúste znova.")?;
            return Ok(State::AwaitingInput);
        }
        Ok(State::Embedding(input.to_string()))
    }

    fn exit_hint(&self) -> &str {
        self.config.exit_words.first().map(String::as_str).unwrap_or("koniec")
    }
}
