//! Process one newsletter issue from stdin and print the result as JSON.
//!
//! Translation is enabled when `DEEPL_API_KEY` is set (`DEEPL_SERVER_URL`
//! overrides the free-tier endpoint); without a key the translation stage is
//! skipped rather than failing the run.
//!
//! ```text
//! cat issue.html | onesip_stdin > issue.json
//! ```

use std::env;
use std::io::Read as _;
use std::process::ExitCode;

use onesip::{DeepLClient, PipelinePolicy, TranslationOptions, Translator};

fn main() -> ExitCode {
    env_logger::init();

    let mut html = String::new();
    if let Err(err) = std::io::stdin().read_to_string(&mut html) {
        eprintln!("failed to read stdin: {err}");
        return ExitCode::FAILURE;
    }

    let (translator, policy) = configure();
    let output = match onesip::process_issue_with_policy(&html, &translator, &policy) {
        Ok(output) => output,
        Err(err) => {
            eprintln!("pipeline failed: {err}");
            return ExitCode::FAILURE;
        }
    };

    let report = serde_json::json!({
        "html": output.html,
        "issues": output.digest.issues,
        "other_news": output.digest.other_news,
        "visible_text_len": output.visible_text_len,
        "relaxed_fallback": output.relaxed_fallback,
    });
    match serde_json::to_string_pretty(&report) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("failed to serialize output: {err}");
            ExitCode::FAILURE
        }
    }
}

/// Build the translator and policy from the environment.
fn configure() -> (Translator, PipelinePolicy) {
    let options = TranslationOptions::default();
    match env::var("DEEPL_API_KEY") {
        Ok(key) if !key.trim().is_empty() => {
            let server = env::var("DEEPL_SERVER_URL")
                .unwrap_or_else(|_| DeepLClient::DEFAULT_SERVER_URL.to_string());
            let client = DeepLClient::with_server_url(key, server);
            (
                Translator::new(Box::new(client), options),
                PipelinePolicy::default(),
            )
        }
        _ => (
            Translator::unconfigured(options),
            PipelinePolicy {
                require_translation: false,
                ..PipelinePolicy::default()
            },
        ),
    }
}
