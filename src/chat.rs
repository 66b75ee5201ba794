//! Command drivers for the chat surface.
//!
//! Each `run_*` function backs one CLI subcommand. The turn pipeline is
//! `run_turn`: append the user message, retrieve context, assemble the
//! request, stream the reply, and commit the assistant message once the
//! stream completes. A failed turn leaves the transcript with the user
//! message only; retrying re-runs retrieval from scratch.

use anyhow::Result;
use std::io::{self, BufRead, Write};

use crate::completion::{CompletionClient, OpenAiClient};
use crate::config::Config;
use crate::retrieve;
use crate::session::Session;
use crate::store::DocumentStore;

/// Drive one conversation turn against the completion service.
///
/// Fragments are surfaced through `on_fragment` as they arrive, then the
/// concatenated reply is recorded in the transcript. On any dispatch or
/// mid-stream failure the partial buffer is discarded and the session
/// returns to idle with only the user message recorded.
pub async fn run_turn(
    session: &mut Session,
    store: &DocumentStore,
    client: &dyn CompletionClient,
    config: &Config,
    input: &str,
    mut on_fragment: impl FnMut(&str),
) -> Result<String> {
    session.submit_user_turn(input)?;

    let retrieved = retrieve::retrieve(input, store.documents(), config.retrieval.top_k);
    tracing::debug!(
        context_docs = retrieved.len(),
        "assembling completion request"
    );
    let messages = session.build_completion_request(&retrieved);

    let mut stream = match client
        .stream_chat(&config.completion.model, &messages)
        .await
    {
        Ok(stream) => stream,
        Err(err) => {
            session.abort_turn();
            return Err(err.into());
        }
    };

    let mut response = String::new();
    while let Some(item) = stream.next().await {
        match item {
            Ok(fragment) => {
                on_fragment(&fragment);
                response.push_str(&fragment);
            }
            Err(err) => {
                session.abort_turn();
                return Err(err.into());
            }
        }
    }

    session.record_assistant_turn(response.clone());
    Ok(response)
}

/// Resolve the API key: environment variable first, then an interactive
/// prompt when stdin is a terminal. The key is never logged.
fn resolve_api_key() -> Result<Option<String>> {
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        let key = key.trim().to_string();
        if !key.is_empty() {
            return Ok(Some(key));
        }
    }

    if atty::is(atty::Stream::Stdin) {
        print!("OpenAI API key: ");
        io::stdout().flush()?;
        let mut line = String::new();
        if io::stdin().lock().read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let key = line.trim().to_string();
        if !key.is_empty() {
            return Ok(Some(key));
        }
    }

    Ok(None)
}

const MISSING_KEY_NOTICE: &str =
    "Add your OpenAI API key to continue (set OPENAI_API_KEY or enter it at the prompt).";

/// Interactive REPL session.
pub async fn run_chat(config: &Config) -> Result<()> {
    let mut store = DocumentStore::load(&config.docs)?;
    println!(
        "Loaded {} document(s) from {}",
        store.len(),
        config.docs.dir.display()
    );

    let Some(api_key) = resolve_api_key()? else {
        println!("{MISSING_KEY_NOTICE}");
        return Ok(());
    };
    let client = OpenAiClient::new(&config.completion, api_key)?;

    let mut session = Session::new();
    let interactive = atty::is(atty::Stream::Stdin);
    let stdin = io::stdin();

    loop {
        if interactive {
            print!("you> ");
            io::stdout().flush()?;
        }

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input == "/quit" || input == "/exit" {
            break;
        }
        if input == "/reload" {
            store.reload()?;
            println!("Reloaded {} document(s)", store.len());
            continue;
        }

        print!("assistant> ");
        io::stdout().flush()?;

        let result = run_turn(&mut session, &store, &client, config, input, |fragment| {
            print!("{fragment}");
            let _ = io::stdout().flush();
        })
        .await;

        println!();
        if let Err(err) = result {
            eprintln!("turn failed: {err:#}");
        }
    }

    Ok(())
}

/// One-shot question: a single turn without the REPL.
pub async fn run_ask(config: &Config, question: &str) -> Result<()> {
    let store = DocumentStore::load(&config.docs)?;

    let Some(api_key) = resolve_api_key()? else {
        println!("{MISSING_KEY_NOTICE}");
        return Ok(());
    };
    let client = OpenAiClient::new(&config.completion, api_key)?;

    let mut session = Session::new();
    run_turn(&mut session, &store, &client, config, question, |fragment| {
        print!("{fragment}");
        let _ = io::stdout().flush();
    })
    .await?;
    println!();

    Ok(())
}

/// List the loaded documents with a short preview of each.
pub fn run_docs(config: &Config) -> Result<()> {
    let store = DocumentStore::load(&config.docs)?;

    if store.is_empty() {
        println!("No documents loaded from {}", config.docs.dir.display());
        return Ok(());
    }

    for (i, doc) in store.documents().iter().enumerate() {
        let words = doc.text.split_whitespace().count();
        let preview: String = doc
            .text
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(60)
            .collect();
        println!("{}. ({} words) {}", i + 1, words, preview);
    }
    println!();
    println!(
        "{} document(s) from {}",
        store.len(),
        config.docs.dir.display()
    );

    Ok(())
}

/// Show which documents a query would retrieve, with overlap scores.
pub fn run_retrieve(config: &Config, query: &str, k: Option<usize>) -> Result<()> {
    let store = DocumentStore::load(&config.docs)?;
    let k = k.unwrap_or(config.retrieval.top_k);

    let ranked = retrieve::rank(query, store.documents(), k);
    if ranked.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (position, (doc_index, score)) in ranked.iter().enumerate() {
        let doc = &store.documents()[*doc_index];
        let excerpt: String = doc.text.replace('\n', " ").trim().chars().take(80).collect();
        println!("{}. [score {}] doc #{}", position + 1, score, doc_index + 1);
        println!("    excerpt: \"{}\"", excerpt);
    }

    Ok(())
}
