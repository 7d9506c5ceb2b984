mod logging;
mod messages;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use recap_core::{
    BpeTokenizer, ChatId, DedupCache, InMemoryConversationStore, RecapError, SharedTokenizer,
    ThreadReconstructor, Transcript,
};
use recap_engine::{
    split_for_delivery, AccessPolicy, Caller, ChatService, DirectoryCaptionSource,
    MapReduceSummarizer, PromptSet, RecapConfig, VideoSummaryService,
};
use recap_llm::{OpenAIProvider, SharedProvider};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser)]
#[command(name = "recap")]
#[command(about = "Summarize long texts and videos, or chat, through an OpenAI-compatible model")]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(long, short, env = "RECAP_CONFIG")]
    config: Option<PathBuf>,

    /// Your user id, checked against the whitelist
    #[arg(long, default_value_t = 0)]
    user_id: i64,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a text file, or a captions JSON file rendered as SRT
    Summarize {
        file: PathBuf,
        /// Prompt language (ru or en)
        #[arg(long, default_value = "en")]
        lang: String,
        /// Ask about a topic instead of summarizing
        #[arg(long)]
        clarify: Option<String>,
        /// Merge partial summaries into one numbered list
        #[arg(long)]
        renumber: bool,
        /// Leave the cost line out
        #[arg(long)]
        no_cost: bool,
    },
    /// Summarize the video linked in a message
    Video {
        /// Message text containing the link
        text: String,
        /// Directory with `<video_id>.json` caption files
        #[arg(long)]
        captions_dir: PathBuf,
        #[arg(long, default_value_t = 0)]
        chat_id: ChatId,
        #[arg(long)]
        clarify: Option<String>,
    },
    /// Interactive chat; each message replies to the previous answer
    Chat {
        #[arg(long, default_value_t = 0)]
        chat_id: ChatId,
    },
}

/// Exit code for failures that were reported to the user.
const EXIT_REPORTED: i32 = 2;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref())?;
    let level = if cli.debug { "debug" } else { config.log_level.as_str() };
    logging::init_logging(level, config.logfile.as_deref())?;

    tracing::debug!("Loaded config: model={}, max_tokens={}", config.chat_model, config.max_tokens);

    let policy = AccessPolicy::from_whitelist(config.whitelist.iter().copied());
    let app = App::new(config)?;

    let outcome = match cli.command {
        Commands::Summarize {
            file,
            lang,
            clarify,
            renumber,
            no_cost,
        } => {
            let caller = Caller::new(cli.user_id, cli.user_id);
            policy
                .guard(
                    &caller,
                    app.summarize_file(&file, &lang, clarify.as_deref(), renumber, !no_cost),
                )
                .await
        }
        Commands::Video {
            text,
            captions_dir,
            chat_id,
            clarify,
        } => {
            let caller = Caller::new(cli.user_id, chat_id);
            let service = app.video_service(captions_dir);
            policy
                .guard(&caller, service.summarize_video(chat_id, &text, clarify.as_deref()))
                .await
        }
        Commands::Chat { chat_id } => {
            if let Err(err) = policy.authorize(&Caller::new(cli.user_id, chat_id)) {
                report(&err);
            }
            return app.run_chat(chat_id).await;
        }
    };

    match outcome {
        Ok(reply) => app.deliver(&reply),
        Err(err) => report(&err),
    }
    Ok(())
}

fn report(err: &RecapError) -> ! {
    eprintln!("{}", messages::describe(err).red());
    std::process::exit(EXIT_REPORTED);
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RecapConfig> {
    match path {
        Some(path) => RecapConfig::load(path),
        None => {
            let mut config = RecapConfig::default();
            config.apply_env_overrides();
            config.validate()?;
            Ok(config)
        }
    }
}

/// Services wired from one config.
struct App {
    config: RecapConfig,
    tokenizer: SharedTokenizer,
    provider: SharedProvider,
    summarizer: Arc<MapReduceSummarizer>,
}

impl App {
    fn new(config: RecapConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .context("OPENAI_API_KEY is not set")?;

        let tokenizer: SharedTokenizer = Arc::new(BpeTokenizer::for_model(BpeTokenizer::DEFAULT_MODEL)?);
        let provider: SharedProvider = Arc::new(
            OpenAIProvider::new(api_key)
                .with_base_url(config.base_url.as_str())
                .with_model(config.chat_model.as_str()),
        );
        let summarizer = MapReduceSummarizer::new(
            provider.clone(),
            tokenizer.clone(),
            config.cost_estimator(),
            config.chat_model.as_str(),
            config.max_tokens,
        )
        .with_map_concurrency(config.map_concurrency);

        Ok(Self {
            config,
            tokenizer,
            provider,
            summarizer: Arc::new(summarizer),
        })
    }

    fn video_service(&self, captions_dir: PathBuf) -> VideoSummaryService {
        VideoSummaryService::new(
            self.summarizer.clone(),
            Arc::new(DirectoryCaptionSource::new(captions_dir)),
            DedupCache::default(),
            self.config.languages.clone(),
        )
        .with_renumber_points(self.config.renumber_points)
        .with_cost_annotation(self.config.cost_annotation)
    }

    async fn summarize_file(
        &self,
        file: &Path,
        lang: &str,
        clarify: Option<&str>,
        renumber: bool,
        with_cost: bool,
    ) -> Result<String, RecapError> {
        let text = read_source(file).await?;
        let prompts = PromptSet::for_language(lang);

        let map_prompt = match clarify {
            Some(topic) => prompts.clarify(topic),
            None => prompts.summary.to_string(),
        };
        let reduce_prompt = (clarify.is_none() && (renumber || self.config.renumber_points))
            .then_some(prompts.renumber);

        let summary = self
            .summarizer
            .summarize(&text, &map_prompt, reduce_prompt)
            .await?;

        if with_cost && self.config.cost_annotation {
            Ok(summary.annotated(&prompts.cost_line(summary.cost.cost)))
        } else {
            Ok(summary.text)
        }
    }

    async fn run_chat(&self, chat_id: ChatId) -> anyhow::Result<()> {
        let threads = ThreadReconstructor::new(
            Arc::new(InMemoryConversationStore::new()),
            self.tokenizer.clone(),
            self.config.max_tokens,
        );
        let chat = ChatService::new(
            self.provider.clone(),
            threads,
            self.tokenizer.clone(),
            self.config.chat_model.as_str(),
        );

        println!(
            "{}",
            "Chat started. /system <prompt> sets the system prompt, /new starts a new thread, /quit exits."
                .cyan()
        );

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut next_id: i64 = 1;
        let mut reply_to = None;

        while let Some(line) = lines.next_line().await? {
            let line = match ChatInput::parse(&line) {
                ChatInput::Empty => continue,
                ChatInput::Quit => break,
                ChatInput::NewThread => {
                    reply_to = None;
                    println!("{}", "New thread".dimmed());
                    continue;
                }
                ChatInput::SystemPrompt(prompt) => {
                    chat.set_system_prompt(chat_id, prompt);
                    println!("{}", "System prompt updated".dimmed());
                    continue;
                }
                ChatInput::Message(text) => text,
            };

            let message_id = next_id;
            next_id += 2;

            match chat.reply(chat_id, message_id, line, reply_to).await {
                Ok(reply) => {
                    let reply_id = message_id + 1;
                    chat.record_reply(chat_id, reply_id, &reply.content, message_id);
                    reply_to = Some(reply_id);
                    self.deliver(&reply.content);
                }
                Err(err) => {
                    if matches!(err, RecapError::ConversationTooLong { .. }) {
                        reply_to = None;
                    }
                    eprintln!("{}", messages::describe(&err).red());
                }
            }
        }
        Ok(())
    }

    fn deliver(&self, text: &str) {
        for piece in split_for_delivery(text, self.config.delivery_chunk_chars) {
            println!("{}", piece.green());
        }
    }
}

/// One line typed into the chat.
#[derive(Debug, PartialEq)]
enum ChatInput<'a> {
    Empty,
    Quit,
    NewThread,
    SystemPrompt(&'a str),
    Message(&'a str),
}

impl<'a> ChatInput<'a> {
    /// Commands match as whole words; anything else is sent to the model.
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        let (command, rest) = match line.split_once(char::is_whitespace) {
            Some((command, rest)) => (command, rest.trim()),
            None => (line, ""),
        };
        match command {
            "" => ChatInput::Empty,
            "/quit" if rest.is_empty() => ChatInput::Quit,
            "/new" if rest.is_empty() => ChatInput::NewThread,
            "/system" => ChatInput::SystemPrompt(rest),
            _ => ChatInput::Message(line),
        }
    }
}

/// File contents; `.json` files are read as captions and rendered as SRT.
async fn read_source(file: &Path) -> Result<String, RecapError> {
    let raw = tokio::fs::read_to_string(file).await.map_err(|e| {
        tracing::warn!("Failed to read {}: {}", file.display(), e);
        RecapError::NoContent(format!("cannot read {}", file.display()))
    })?;

    if file.extension().is_some_and(|ext| ext == "json") {
        let transcript: Transcript = serde_json::from_str(&raw).map_err(|e| {
            RecapError::NoContent(format!("{} is not a captions file: {e}", file.display()))
        })?;
        return transcript.to_srt();
    }
    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use recap_core::CaptionSegment;

    #[test]
    fn cli_parses_video_command() {
        let cli = Cli::parse_from([
            "recap",
            "--user-id",
            "42",
            "video",
            "https://youtu.be/abc",
            "--captions-dir",
            "/tmp/captions",
            "--chat-id=-100",
        ]);

        assert_eq!(cli.user_id, 42);
        match cli.command {
            Commands::Video { chat_id, clarify, .. } => {
                assert_eq!(chat_id, -100);
                assert!(clarify.is_none());
            }
            _ => panic!("expected video command"),
        }
    }

    #[test]
    fn system_command_sets_the_prompt() {
        assert_eq!(
            ChatInput::parse("/system  Be brief "),
            ChatInput::SystemPrompt("Be brief")
        );
        assert_eq!(ChatInput::parse("/system"), ChatInput::SystemPrompt(""));
    }

    #[test]
    fn words_starting_with_a_command_are_messages() {
        assert_eq!(
            ChatInput::parse("/systematic question"),
            ChatInput::Message("/systematic question")
        );
        assert_eq!(ChatInput::parse("/newest news"), ChatInput::Message("/newest news"));
        assert_eq!(ChatInput::parse("/quit now"), ChatInput::Message("/quit now"));
    }

    #[test]
    fn bare_commands_and_blank_lines() {
        assert_eq!(ChatInput::parse("  /quit "), ChatInput::Quit);
        assert_eq!(ChatInput::parse("/new"), ChatInput::NewThread);
        assert_eq!(ChatInput::parse("   "), ChatInput::Empty);
        assert_eq!(ChatInput::parse(" hello there "), ChatInput::Message("hello there"));
    }

    #[tokio::test]
    async fn json_sources_render_as_srt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("talk.json");
        let transcript = Transcript::new(
            "en",
            vec![CaptionSegment {
                start: 1.0,
                duration: 2.0,
                text: "hello".to_string(),
            }],
        );
        std::fs::write(&path, serde_json::to_string(&transcript).unwrap()).unwrap();

        let text = read_source(&path).await.unwrap();
        assert_eq!(text, "1\n00:00:01,000 --> 00:00:03,000\nhello\n");
    }

    #[tokio::test]
    async fn missing_source_is_no_content() {
        let err = read_source(Path::new("/nonexistent/talk.txt")).await.unwrap_err();
        assert!(matches!(err, RecapError::NoContent(_)));
    }
}
