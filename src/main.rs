use clap::{Arg, Command};
use mirror_translate::sync::{
    BufferId, Formality, LanguageTag, MockMode, MockProvider, OpenAiProvider, SelectionRange,
    SessionConfig, SyncEngine, SyncEvent, TranslationProvider, highlight_segments,
};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const HELP: &str = "\
Each line replaces the content of buffer A; prefix with `b:` to edit buffer B.
Commands:
  :select a|b START END   highlight the aligned span of a selection
  :lang a|b TAG           change the language of a buffer
  :guard on|off           toggle the language guard
  :formal | :informal     set the formality of translations
  :show                   print the session
  :quit";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Command::new("mirror-translate")
        .version("0.1.0")
        .about("Two-pane translation editor: each buffer mirrors the other")
        .after_help(HELP)
        .arg(
            Arg::new("source")
                .long("source")
                .short('s')
                .help("Language of buffer A")
                .default_value("fr"),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .short('t')
                .help("Language of buffer B")
                .default_value("en"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock provider instead of the chat-completions API")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("formal")
                .long("formal")
                .help("Ask for formal translations")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("guard")
                .long("guard")
                .short('g')
                .help("Replace words typed in the other buffer's language")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("debounce-ms")
                .long("debounce-ms")
                .help("Quiet period before a translation is sent")
                .value_parser(clap::value_parser!(u64))
                .default_value("400"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print the session as JSON after every change")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let source = LanguageTag::new(matches.get_one::<String>("source").map_or("fr", |s| s.as_str()))?;
    let target = LanguageTag::new(matches.get_one::<String>("target").map_or("en", |s| s.as_str()))?;
    let debounce = matches.get_one::<u64>("debounce-ms").copied().unwrap_or(400);
    let formality = if matches.get_flag("formal") {
        Formality::Formal
    } else {
        Formality::Informal
    };
    let json = matches.get_flag("json");

    let config = SessionConfig::new(source, target)
        .with_formality(formality)
        .with_language_guard(matches.get_flag("guard"))
        .with_debounce(Duration::from_millis(debounce));

    let provider: Arc<dyn TranslationProvider> = if matches.get_flag("mock") {
        Arc::new(MockProvider::new(MockMode::Suffix))
    } else {
        if env::var("OPENAI_API_KEY").is_err() {
            eprintln!("❌ OPENAI_API_KEY environment variable not set");
            eprintln!("   Set it with: export OPENAI_API_KEY=your_api_key");
            eprintln!("   Or use --mock to use the mock provider");
            return Err("Missing API key".into());
        }
        Arc::new(OpenAiProvider::from_env()?)
    };

    let mut engine = SyncEngine::new(config, provider);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if !handle_line(&mut engine, &line, json)? {
                    return Ok(());
                }
            }
            Some(event) = engine.next_event(), if !engine.is_idle() => {
                report(&engine, &event, json)?;
            }
        }
    }

    // Input closed: let pending translations land before exiting
    while let Some(event) = engine.next_event().await {
        report(&engine, &event, json)?;
    }
    Ok(())
}

/// Apply one input line; returns `false` on `:quit`
fn handle_line(
    engine: &mut SyncEngine,
    line: &str,
    json: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    let Some(command) = line.strip_prefix(':') else {
        let (buffer, content) = match line.strip_prefix("b:") {
            Some(rest) => (BufferId::B, rest),
            None => (BufferId::A, line.strip_prefix("a:").unwrap_or(line)),
        };
        let outcome = engine.on_text_changed(buffer, content);
        info!(%buffer, ?outcome, "edit");
        return Ok(true);
    };

    let parts: Vec<&str> = command.split_whitespace().collect();
    match parts.as_slice() {
        ["quit"] | ["q"] => return Ok(false),
        ["show"] => print_session(engine, json)?,
        ["formal"] => engine.set_formality(Formality::Formal),
        ["informal"] => engine.set_formality(Formality::Informal),
        ["guard", "on"] => engine.set_language_guard(true),
        ["guard", "off"] => engine.set_language_guard(false),
        ["lang", buffer, tag] => match (parse_buffer(buffer), LanguageTag::new(tag)) {
            (Some(buffer), Ok(language)) => engine.set_language(buffer, language),
            (None, _) => warn!(buffer, "unknown buffer"),
            (_, Err(e)) => warn!(error = %e, "rejected language"),
        },
        ["select", buffer, start, end] => {
            let (Some(buffer), Ok(start), Ok(end)) =
                (parse_buffer(buffer), start.parse::<usize>(), end.parse::<usize>())
            else {
                warn!(command, "usage: :select a|b START END");
                return Ok(true);
            };
            let range = engine.select(buffer, SelectionRange { start, end });
            if range.is_none() {
                println!("(no aligned span)");
            }
            print_session(engine, json)?;
        }
        _ => eprintln!("{}", HELP),
    }
    Ok(true)
}

fn parse_buffer(name: &str) -> Option<BufferId> {
    match name {
        "a" | "A" => Some(BufferId::A),
        "b" | "B" => Some(BufferId::B),
        _ => None,
    }
}

fn report(
    engine: &SyncEngine,
    event: &SyncEvent,
    json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    match event {
        SyncEvent::Discarded { .. } => Ok(()),
        SyncEvent::Failed { .. } => {
            if let Some(notice) = engine.notice() {
                println!("⚠️  {}", notice);
            }
            Ok(())
        }
        SyncEvent::WordCorrected {
            word, replacement, ..
        } => {
            println!("✏️  {} → {}", word, replacement);
            print_session(engine, json)
        }
        SyncEvent::Translated { .. } => print_session(engine, json),
    }
}

fn print_session(engine: &SyncEngine, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(&engine.snapshot())?);
        return Ok(());
    }

    let highlight = engine.highlight();
    for id in [BufferId::A, BufferId::B] {
        let buffer = engine.buffer(id);
        let range = highlight.filter(|h| h.buffer == id).map(|h| h.range);
        let text = match highlight_segments(buffer.content(), range).as_slice() {
            [before, marked, after] => format!("{}[{}]{}", before, marked, after),
            segments => segments.concat(),
        };
        println!("{} [{}]: {}", id, buffer.language(), text);
    }
    for entry in engine.mapping().entries() {
        println!("   {} -> {}", entry.source, entry.target);
    }
    Ok(())
}
