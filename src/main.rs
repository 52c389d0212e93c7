//! Command-line interface for lingreader
//!
//! Usage:
//!   lingreader lessons add "Title" --file story.txt
//!   lingreader read <ID>
//!   lingreader mark cat 2
//!   lingreader lookup cat --language English

use clap::{Parser, Subcommand, ValueEnum};
use lingreader::char_categories::contains_cjk;
use lingreader::progress::percent_complete;
use lingreader::speech::FileOutput;
use lingreader::{
    lesson_stats, split_sentences, split_translation_lines, Accent, FallbackLexicon, Lexicon, NewLesson, Orchestrator, Provider,
    ProviderCheck, ReaderState, Speaker, SpeechConfig, SpeechSynthesizer, Status, StatusUpdate, StorageContext,
    TextRenderer, Tokenizer, Translator, VocabFilter,
};
use std::error::Error;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Parser)]
#[command(name = "lingreader", version, about = "Read foreign-language texts and track your vocabulary")]
struct Cli {
    /// Directory holding the persisted stores
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tokens of a text (reads stdin when TEXT is omitted)
    Tokenize {
        text: Option<String>,
        #[arg(short, long)]
        json: bool,
    },
    /// Manage lessons
    Lessons {
        #[command(subcommand)]
        action: LessonAction,
    },
    /// Print a lesson with each word's status
    Read { id: i64 },
    /// Set the status of a word (0-5)
    Mark {
        word: String,
        status: u8,
        /// Custom translation to store with the status
        #[arg(short, long)]
        translation: Option<String>,
    },
    /// Translate a word and fetch its phonetic
    Lookup {
        word: String,
        #[arg(short, long, default_value = "English")]
        language: String,
    },
    /// Translate one sentence
    TranslateSentence {
        sentence: String,
        #[arg(short, long, default_value = "English")]
        language: String,
    },
    /// List the vocabulary
    Vocab {
        #[arg(short, long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },
    /// Word statistics for a lesson
    Stats { id: i64 },
    /// Show or set sentence progress for a lesson
    Progress { id: i64, completed: Option<i64> },
    /// Fill missing translations and phonetics across the vocabulary
    Fill {
        #[arg(short, long, default_value = "English")]
        language: String,
        /// Milliseconds between words
        #[arg(long, default_value_t = 300)]
        delay_ms: u64,
    },
    /// Check that the configured translation provider answers
    CheckProvider,
    /// Show or change settings
    Settings {
        #[arg(long)]
        accent: Option<Accent>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        provider: Option<String>,
        #[arg(long)]
        api_key: Option<String>,
        #[arg(long)]
        model: Option<String>,
        #[arg(long)]
        show_translations: Option<bool>,
    },
    /// Synthesize speech into an mp3 file
    Speak {
        text: String,
        #[arg(short, long, default_value = "English")]
        language: String,
        #[arg(short, long, default_value = "speech.mp3")]
        output: PathBuf,
    },
    /// Write a backup of all stores
    Export { file: PathBuf },
    /// Restore stores from a backup
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum LessonAction {
    Add {
        title: String,
        /// Read the content from a file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(short, long)]
        language: Option<String>,
        #[arg(long)]
        course_id: Option<String>,
        #[arg(long)]
        course_title: Option<String>,
    },
    List,
    Show { id: i64 },
    Delete { id: i64 },
}

#[derive(Clone, Copy, ValueEnum)]
enum FilterArg {
    All,
    Learning,
    Known,
}

impl From<FilterArg> for VocabFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => VocabFilter::All,
            FilterArg::Learning => VocabFilter::Learning,
            FilterArg::Known => VocabFilter::Known,
        }
    }
}

#[cfg(not(feature = "providers"))]
struct Offline;

#[cfg(not(feature = "providers"))]
impl Translator for Offline {
    fn translate(
        &self,
        _text: &str,
        _source_language: &str,
        _target_lang: &str,
        _config: &lingreader::ProviderConfig,
    ) -> Option<lingreader::TranslationResult> {
        None
    }
}

#[cfg(feature = "providers")]
fn providers() -> Result<(Box<dyn Translator>, Box<dyn Lexicon>), Box<dyn Error>> {
    use lingreader::http::{DictionaryApiSource, HttpTranslator};
    Ok((
        Box::new(HttpTranslator::new()?),
        Box::new(FallbackLexicon::new(DictionaryApiSource::new()?)),
    ))
}

#[cfg(not(feature = "providers"))]
fn providers() -> Result<(Box<dyn Translator>, Box<dyn Lexicon>), Box<dyn Error>> {
    Ok((Box::new(Offline), Box::new(FallbackLexicon::new(lingreader::NoPhonetics))))
}

#[cfg(feature = "providers")]
fn synthesizer(config: &SpeechConfig) -> Result<Option<Box<dyn SpeechSynthesizer>>, Box<dyn Error>> {
    Ok(lingreader::http::HttpSpeech::from_config(config)?.map(|s| Box::new(s) as Box<dyn SpeechSynthesizer>))
}

#[cfg(not(feature = "providers"))]
fn synthesizer(_config: &SpeechConfig) -> Result<Option<Box<dyn SpeechSynthesizer>>, Box<dyn Error>> {
    Ok(None)
}

fn read_stdin() -> io::Result<String> {
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn data_dir(cli: &Cli) -> PathBuf {
    cli.data_dir.clone().unwrap_or_else(|| {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lingreader")
    })
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> CliResult {
    if let Command::Tokenize { text, json } = &cli.command {
        return tokenize(text.clone(), *json);
    }

    let dir = data_dir(&cli);
    debug!(dir = %dir.display(), "opening data directory");
    let mut state = ReaderState::open(StorageContext::with_data_dir(&dir)?);

    match cli.command {
        Command::Tokenize { .. } => unreachable!("handled above"),
        Command::Lessons { action } => lessons(&mut state, action),
        Command::Read { id } => read(&state, id),
        Command::Mark {
            word,
            status,
            translation,
        } => {
            let status = Status::try_from(status)?;
            let mut update = StatusUpdate::new(status);
            if let Some(text) = translation {
                update = update.translation(text).source(Provider::Custom.as_str());
            }
            let entry = state.vocabulary.update_status(&word, update)?;
            println!("{} -> {} ({})", word, entry.status, entry.status.label());
            Ok(())
        }
        Command::Lookup { word, language } => {
            let (translator, lexicon) = providers()?;
            let orchestrator = Orchestrator::new(translator.as_ref(), lexicon.as_ref());
            let ctx = state.lookup_context(&language);
            let card = orchestrator.lookup_word(&mut state.vocabulary, &mut state.cache, &word, &ctx)?;
            println!("{}", card.word);
            if let Some(phonetic) = &card.dictionary.phonetic {
                println!("  /{}/", phonetic.trim_matches('/'));
            }
            match &card.translation {
                Some(t) => println!("  {}  [{}]", t.text, t.source_label()),
                None => println!("  (translation unavailable)"),
            }
            if let Some(url) = &card.dictionary.audio_url {
                println!("  audio: {}", url);
            }
            Ok(())
        }
        Command::TranslateSentence { sentence, language } => {
            let (translator, lexicon) = providers()?;
            let orchestrator = Orchestrator::new(translator.as_ref(), lexicon.as_ref());
            let ctx = state.lookup_context(&language);
            let outcome =
                orchestrator.translate_sentence(&mut state.cache, &mut state.fast_cache, &sentence, &ctx)?;
            match outcome.text() {
                Some(text) => {
                    for line in split_translation_lines(text) {
                        println!("{}", line);
                    }
                }
                None => println!("(translation unavailable)"),
            }
            Ok(())
        }
        Command::Vocab { filter } => {
            for (word, entry) in state.vocabulary.table(filter.into()) {
                println!(
                    "{:<20} {} {:<9} {}",
                    word,
                    entry.status,
                    entry.status.label(),
                    entry.translation.as_deref().unwrap_or("")
                );
            }
            let stats = state.vocabulary.stats();
            println!(
                "\n{} words, {} learning, {} known, {} missing data",
                stats.total, stats.learning, stats.known, stats.missing_data
            );
            Ok(())
        }
        Command::Stats { id } => {
            let lesson = state.lessons.get(id).ok_or(lingreader::LessonError::NotFound(id))?;
            let stats = lesson_stats(lesson, &state.vocabulary);
            println!("{}", lesson.title);
            println!("  words:   {}", stats.total);
            println!("  new:     {} ({}%)", stats.new_words, stats.new_percent);
            println!("  unknown: {}", stats.unknown);
            println!("  lingqs:  {}", stats.lingqs);
            println!("  known:   {}", stats.known);
            Ok(())
        }
        Command::Progress { id, completed } => {
            let lesson = state.lessons.get(id).ok_or(lingreader::LessonError::NotFound(id))?;
            let total = split_sentences(&lesson.content).len();
            if let Some(completed) = completed {
                state.progress.set(id, completed)?;
            }
            let done = state.progress.get(id);
            println!(
                "{}/{} sentences ({}%), resume at {}",
                done.min(total as u64),
                total,
                percent_complete(done, total),
                state.progress.resume_index(id, total) + 1
            );
            Ok(())
        }
        Command::Fill { language, delay_ms } => {
            let (translator, lexicon) = providers()?;
            let orchestrator = Orchestrator::new(translator.as_ref(), lexicon.as_ref());
            let ctx = state.lookup_context(&language);
            let report = orchestrator.fill_missing(
                &mut state.vocabulary,
                &mut state.cache,
                &ctx,
                Duration::from_millis(delay_ms),
            )?;
            println!("updated {} words, {} failed", report.updated, report.failed);
            Ok(())
        }
        Command::CheckProvider => {
            let (translator, lexicon) = providers()?;
            let orchestrator = Orchestrator::new(translator.as_ref(), lexicon.as_ref());
            let ctx = state.lookup_context("English");
            match orchestrator.validate_provider(&ctx)? {
                ProviderCheck::NotRequired => println!("{}: no validation needed", ctx.provider()),
                ProviderCheck::Available => println!("{}: ok", ctx.provider()),
                ProviderCheck::Failed => return Err(format!("{} did not answer", ctx.provider()).into()),
            }
            Ok(())
        }
        Command::Settings {
            accent,
            target,
            provider,
            api_key,
            model,
            show_translations,
        } => {
            let settings = state.settings.update(|s| {
                if let Some(accent) = accent {
                    s.accent = accent;
                }
                if let Some(target) = target {
                    s.target_language = target;
                }
                if let Some(provider) = provider {
                    s.translation_provider = match Provider::normalize(&provider) {
                        Provider::DeepSeek => Provider::DeepSeek,
                        _ => Provider::Default,
                    };
                }
                if let Some(key) = api_key {
                    s.deepseek_api_key = key;
                }
                if let Some(model) = model {
                    s.deepseek_model = model;
                }
                if let Some(show) = show_translations {
                    s.show_translations = show;
                }
            })?;
            println!("accent:            {}", settings.accent.as_str());
            println!("target language:   {}", settings.target_lang());
            println!("provider:          {}", settings.provider());
            println!("model:             {}", settings.deepseek_model);
            println!(
                "api key:           {}",
                if settings.deepseek_api_key.is_empty() { "unset" } else { "set" }
            );
            println!("show translations: {}", settings.show_translations);
            Ok(())
        }
        Command::Speak {
            text,
            language,
            output,
        } => {
            let config = SpeechConfig::from_env();
            let mut speaker = Speaker::new(synthesizer(&config)?, Box::new(FileOutput::new(&output)));
            speaker.speak(&text, &language, state.settings.get().accent)?;
            println!("wrote {}", output.display());
            Ok(())
        }
        Command::Export { file } => {
            let doc = state.export();
            fs::write(&file, serde_json::to_string_pretty(&doc)?)?;
            println!("exported to {}", file.display());
            Ok(())
        }
        Command::Import { file } => {
            let doc: serde_json::Value = serde_json::from_str(&fs::read_to_string(&file)?)?;
            let written = state.import(&doc)?;
            println!("restored {} stores", written);
            Ok(())
        }
    }
}

fn tokenize(text: Option<String>, json: bool) -> CliResult {
    let text = match text {
        Some(t) => t,
        None => read_stdin()?,
    };
    let tokens = Tokenizer::tokenize(&text);
    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        let words: Vec<&str> = tokens.iter().filter(|t| t.is_word()).map(|t| t.text.as_str()).collect();
        println!("{}", words.join(" / "));
    }
    Ok(())
}

fn lessons(state: &mut ReaderState, action: LessonAction) -> CliResult {
    match action {
        LessonAction::Add {
            title,
            file,
            language,
            course_id,
            course_title,
        } => {
            let content = match file {
                Some(path) => fs::read_to_string(path)?,
                None => read_stdin()?,
            };
            let mut new = NewLesson::new(title, content);
            if let Some(language) = language {
                new = new.language(language);
            }
            if let Some(id) = course_id {
                let course_title = course_title.unwrap_or_else(|| id.clone());
                new = new.course(id, course_title);
            }
            let lesson = state.lessons.add(new)?;
            println!("added lesson {} ({})", lesson.id, lesson.title);
        }
        LessonAction::List => {
            for course in state.lessons.courses() {
                println!("{}", course.title);
                for lesson in course.lessons {
                    let total = split_sentences(&lesson.content).len();
                    let done = state.progress.get(lesson.id);
                    println!(
                        "  {:>14}  {:<30} {:<10} {}%",
                        lesson.id,
                        lesson.title,
                        lesson.language,
                        percent_complete(done, total)
                    );
                }
            }
        }
        LessonAction::Show { id } => {
            let lesson = state.lessons.get(id).ok_or(lingreader::LessonError::NotFound(id))?;
            println!("{} [{} / {}]\n", lesson.title, lesson.language, lesson.level);
            println!("{}", lesson.content);
        }
        LessonAction::Delete { id } => {
            let lesson = state.lessons.delete(id)?;
            println!("deleted lesson {} ({})", lesson.id, lesson.title);
        }
    }
    Ok(())
}

/// Print the lesson with `word[level]` markers on tagged words and inline
/// translations when enabled
fn read(state: &ReaderState, id: i64) -> CliResult {
    let lesson = state.lessons.get(id).ok_or(lingreader::LessonError::NotFound(id))?;
    let tokens = Tokenizer::tokenize(&lesson.content);
    let renderer = TextRenderer::new(&state.vocabulary, state.settings.get().show_translations);

    let mut out = String::new();
    for rendered in renderer.render(&tokens) {
        out.push_str(&rendered.token.text);
        match rendered.highlight {
            Some(h) if h.level() > 0 => {
                out.push_str(&format!("[{}]", h.level()));
                if let Some(t) = rendered.translation {
                    out.push_str(&format!("({})", t));
                }
            }
            _ => {}
        }
    }
    println!("{}", out);
    if contains_cjk(&lesson.content) {
        eprintln!("note: CJK text is shown as-is and cannot be tagged word by word");
    }
    Ok(())
}
