//! Interactive study session
//!
//! A readline-based loop against one selected topic. Free text becomes a
//! chat turn with the answer streamed live; slash commands drive summaries,
//! quizzes, answers, evidence uploads and submission.

use crate::backend::{HttpBackend, QuestionKind, Topic, TutorBackend};
use crate::config::Config;
use crate::error::{GurukulError, Result};
use crate::session::timeline::{ConversationEntry, EntryBody};
use crate::session::{EvaluationReport, QuizState, Session, SubmitOutcome};

use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::sync::Arc;

/// A parsed REPL input line
#[derive(Debug, Clone, PartialEq, Eq)]
enum StudyCommand {
    Summary,
    Quiz(Option<(u32, u32, u32)>),
    Answer(usize, String),
    Answers,
    Upload(String),
    ClearUpload,
    Submit(Option<String>),
    Topic(String),
    Help,
    Quit,
    /// A slash command with missing or unparseable arguments; carries usage
    Invalid(&'static str),
    /// Not a slash command; treat as a chat message
    Chat,
}

/// Parse one input line into a study command
fn parse_study_command(input: &str) -> StudyCommand {
    if !input.starts_with('/') {
        return StudyCommand::Chat;
    }

    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or("");

    match command {
        "/summary" => StudyCommand::Summary,
        "/quiz" => {
            let counts: Vec<&str> = parts.collect();
            if counts.is_empty() {
                return StudyCommand::Quiz(None);
            }
            if counts.len() != 3 {
                return StudyCommand::Invalid("usage: /quiz [<mcqs> <fill_blank> <short_answer>]");
            }
            match (
                counts[0].parse(),
                counts[1].parse(),
                counts[2].parse(),
            ) {
                (Ok(m), Ok(f), Ok(s)) => StudyCommand::Quiz(Some((m, f, s))),
                _ => StudyCommand::Invalid("usage: /quiz [<mcqs> <fill_blank> <short_answer>]"),
            }
        }
        "/answer" => {
            let number = parts.next().and_then(|n| n.parse::<usize>().ok());
            let text: String = parts.collect::<Vec<_>>().join(" ");
            match number {
                Some(n) if n >= 1 && !text.is_empty() => StudyCommand::Answer(n, text),
                _ => StudyCommand::Invalid("usage: /answer <question number> <your answer>"),
            }
        }
        "/answers" => StudyCommand::Answers,
        "/upload" => {
            let path: String = parts.collect::<Vec<_>>().join(" ");
            if path.is_empty() {
                StudyCommand::Invalid("usage: /upload <image path>")
            } else {
                StudyCommand::Upload(path)
            }
        }
        "/clear-upload" => StudyCommand::ClearUpload,
        "/submit" => StudyCommand::Submit(parts.next().map(str::to_string)),
        "/topic" => match parts.next() {
            Some(id) => StudyCommand::Topic(id.to_string()),
            None => StudyCommand::Invalid("usage: /topic <topic_id>"),
        },
        "/help" => StudyCommand::Help,
        "/quit" | "/exit" => StudyCommand::Quit,
        _ => StudyCommand::Invalid("unknown command; try /help"),
    }
}

fn print_help() {
    println!("{}", "Commands:".bold());
    println!("  /summary                     Summarize the current topic");
    println!("  /quiz [m f s]                Generate a quiz (optionally m MCQs, f fill-blank, s short-answer)");
    println!("  /answer <n> <text>           Answer question n of the active quiz");
    println!("  /answers                     Show the active quiz and collected answers");
    println!("  /upload <path>               Upload a photographed answer sheet");
    println!("  /clear-upload                Remove the uploaded answer sheet");
    println!("  /submit [quiz_id]            Submit a quiz for evaluation");
    println!("  /topic <topic_id>            Switch topic (clears the session)");
    println!("  /help                        Show this help");
    println!("  /quit                        Leave the session");
    println!();
    println!("Anything else is sent to the tutor as a chat message.");
}

/// Run an interactive study session
///
/// # Arguments
///
/// * `config` - Global configuration (consumed)
/// * `class_level` - Optional class-level filter for topic selection
/// * `topic_id` - Optional topic to start with, skipping interactive selection
pub async fn run_study(
    config: Config,
    class_level: Option<String>,
    topic_id: Option<String>,
) -> Result<()> {
    tracing::info!("Starting interactive study session");

    let backend = Arc::new(HttpBackend::new(&config.backend)?);
    let mut session = Session::new(backend.clone(), config);

    let mut rl = DefaultEditor::new()?;

    let topics = backend.list_topics(class_level.as_deref()).await?;
    let topic = choose_topic(&mut rl, &topics, topic_id.as_deref())?;
    session.select_topic(&topic);
    println!(
        "Studying {} ({}). Type /help for commands.\n",
        topic.topic_name.bold(),
        topic.class_level
    );

    loop {
        let prompt = format!("{} ", "gurukul>".green().bold());
        match rl.readline(&prompt) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                match parse_study_command(trimmed) {
                    StudyCommand::Quit => break,
                    StudyCommand::Help => print_help(),
                    StudyCommand::Invalid(usage) => println!("{}", usage.yellow()),
                    command => {
                        if let Err(e) =
                            handle_command(&mut session, backend.as_ref(), command, trimmed).await
                        {
                            println!("{}", format!("Error: {:#}", e).red());
                        }
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        }
    }

    println!("Goodbye!");
    Ok(())
}

/// Resolve the starting topic, interactively when no id was given
fn choose_topic(
    rl: &mut DefaultEditor,
    topics: &[Topic],
    topic_id: Option<&str>,
) -> Result<Topic> {
    if let Some(id) = topic_id {
        return find_topic(topics, id);
    }

    if topics.is_empty() {
        return Err(GurukulError::Backend("No topics available".to_string()).into());
    }

    println!("{}", "Pick a topic:".bold());
    for (i, topic) in topics.iter().enumerate() {
        println!(
            "  {:>2}. {} ({})",
            i + 1,
            topic.topic_name,
            topic.class_level
        );
    }

    loop {
        let line = rl.readline("topic number> ")?;
        match line.trim().parse::<usize>() {
            Ok(n) if (1..=topics.len()).contains(&n) => return Ok(topics[n - 1].clone()),
            _ => println!(
                "{}",
                format!("Enter a number between 1 and {}", topics.len()).yellow()
            ),
        }
    }
}

fn find_topic(topics: &[Topic], topic_id: &str) -> Result<Topic> {
    topics
        .iter()
        .find(|t| t.topic_id == topic_id)
        .cloned()
        .ok_or_else(|| {
            GurukulError::Backend(format!(
                "Topic '{}' not found; run `gurukul topics` to list ids",
                topic_id
            ))
            .into()
        })
}

async fn handle_command(
    session: &mut Session,
    backend: &HttpBackend,
    command: StudyCommand,
    raw_input: &str,
) -> Result<()> {
    match command {
        StudyCommand::Summary => {
            let id = session.request_summary().await?;
            render_entry_by_id(session, id);
        }
        StudyCommand::Quiz(counts) => {
            let id = session.generate_quiz(counts).await?;
            render_entry_by_id(session, id);
        }
        StudyCommand::Answer(number, text) => {
            let question_id = session
                .question_id_for(number)
                .ok_or(GurukulError::NoActiveQuiz)?;
            session.set_answer(&question_id, &text)?;
            println!("Recorded answer for question {}.", number);
        }
        StudyCommand::Answers => match session.active_quiz() {
            Some(quiz) => render_quiz(quiz),
            None => println!("{}", "No active quiz; generate one with /quiz".yellow()),
        },
        StudyCommand::Upload(path) => {
            let content = std::fs::read(&path)?;
            let file_name = std::path::Path::new(&path)
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.clone());
            let merged = session
                .attach_evidence(&file_name, content.into())
                .await?;
            println!(
                "Uploaded {}; {} answer(s) filled in from the sheet.",
                file_name, merged
            );
        }
        StudyCommand::ClearUpload => {
            session.clear_evidence()?;
            println!("Removed the uploaded answer sheet.");
        }
        StudyCommand::Submit(quiz_id) => {
            match session.submit_quiz(quiz_id.as_deref()).await? {
                SubmitOutcome::Evaluated(id) => render_entry_by_id(session, id),
                SubmitOutcome::NothingToSubmit => println!(
                    "{}",
                    "Nothing to submit yet: answer a question or upload a sheet first".yellow()
                ),
            }
        }
        StudyCommand::Topic(topic_id) => {
            let topics = backend.list_topics(None).await?;
            let topic = find_topic(&topics, &topic_id)?;
            session.select_topic(&topic);
            println!("Now studying {}.", topic.topic_name.bold());
        }
        StudyCommand::Chat => {
            let id = session
                .send_chat(raw_input, |delta| {
                    print!("{}", delta.cyan());
                    let _ = std::io::stdout().flush();
                })
                .await?;
            println!();
            render_sources(session, id);
        }
        // Handled by the caller before dispatch.
        StudyCommand::Help | StudyCommand::Quit | StudyCommand::Invalid(_) => {}
    }
    Ok(())
}

fn render_entry_by_id(session: &Session, id: crate::session::EntryId) {
    let snapshot = session.snapshot();
    if let Some(entry) = snapshot.iter().find(|e| e.id == id) {
        render_entry(entry);
    }
}

/// Local wall-clock time an entry was created, for the rendered header
fn entry_timestamp(entry: &ConversationEntry) -> String {
    entry
        .created_at
        .with_timezone(&chrono::Local)
        .format("%H:%M")
        .to_string()
}

fn render_entry(entry: &ConversationEntry) {
    println!("{}", format!("[{}]", entry_timestamp(entry)).dimmed());
    match &entry.body {
        EntryBody::Plain { content, .. } => println!("{}", content.cyan()),
        EntryBody::Summary { content, key_points } => {
            println!("{}", content.cyan());
            if !key_points.is_empty() {
                println!("\n{}", "Key points:".bold());
                for point in key_points {
                    println!("  - {}", point);
                }
            }
        }
        EntryBody::Quiz { quiz, evaluation } => match evaluation {
            Some(report) => render_evaluation(quiz, report),
            None => render_quiz(quiz),
        },
    }
}

fn render_sources(session: &Session, id: crate::session::EntryId) {
    let snapshot = session.snapshot();
    let Some(entry) = snapshot.iter().find(|e| e.id == id) else {
        return;
    };
    if let EntryBody::Plain { sources, .. } = &entry.body {
        if sources.is_empty() {
            return;
        }
        println!("{}", "Sources:".dimmed());
        for source in sources {
            let name = source.source.as_deref().unwrap_or("textbook");
            match source.page_number {
                Some(page) => println!("{}", format!("  {} p.{}", name, page).dimmed()),
                None => println!("{}", format!("  {}", name).dimmed()),
            }
        }
    }
}

fn render_quiz(quiz: &QuizState) {
    println!(
        "{} {}",
        format!("Quiz on {}", quiz.topic_name).bold(),
        format!("({})", quiz.quiz_id).dimmed()
    );
    for (i, question) in quiz.questions.iter().enumerate() {
        println!("\n{} {}", format!("{}.", i + 1).bold(), question.prompt);
        if question.kind == QuestionKind::Mcq {
            for (j, option) in question.options.iter().enumerate() {
                let letter = (b'a' + j as u8) as char;
                println!("   {}) {}", letter, option);
            }
        }
        match quiz.answers.get(&question.id) {
            Some(answer) if !answer.is_empty() => {
                println!("   {} {}", "answer:".green(), answer)
            }
            _ => println!("   {}", "answer: (none)".dimmed()),
        }
    }
    if let Some(evidence) = &quiz.evidence {
        println!(
            "\n{}",
            format!("Attached sheet: {}", evidence.file_name).dimmed()
        );
    }
    println!();
}

fn render_evaluation(quiz: &QuizState, report: &EvaluationReport) {
    println!(
        "{} {} ({}/{} correct)",
        "Score:".bold(),
        report.display_score().bold(),
        report.correct_count,
        report.total_questions
    );

    for result in &report.question_results {
        let number = quiz
            .questions
            .iter()
            .position(|q| q.id == result.question_id)
            .map(|i| format!("{}", i + 1))
            .unwrap_or_else(|| result.question_id.clone());
        let mark = if result.is_correct {
            "✓".green()
        } else {
            "✗".red()
        };
        let review = if result.needs_review {
            " (review)".yellow().to_string()
        } else {
            String::new()
        };
        if result.feedback.is_empty() {
            println!("  {} question {}{}", mark, number, review);
        } else {
            println!("  {} question {}{}: {}", mark, number, review, result.feedback);
        }
    }

    if !report.topics_to_review.is_empty() {
        println!("{} {}", "Review:".yellow(), report.topics_to_review.join(", "));
    }
    if !report.feedback.is_empty() {
        println!("{}", report.feedback.cyan());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_text_is_chat() {
        assert_eq!(parse_study_command("why is the sky blue"), StudyCommand::Chat);
    }

    #[test]
    fn test_parse_summary() {
        assert_eq!(parse_study_command("/summary"), StudyCommand::Summary);
    }

    #[test]
    fn test_parse_quiz_default_and_explicit_counts() {
        assert_eq!(parse_study_command("/quiz"), StudyCommand::Quiz(None));
        assert_eq!(
            parse_study_command("/quiz 4 2 1"),
            StudyCommand::Quiz(Some((4, 2, 1)))
        );
    }

    #[test]
    fn test_parse_quiz_partial_counts_invalid() {
        assert!(matches!(
            parse_study_command("/quiz 4 2"),
            StudyCommand::Invalid(_)
        ));
        assert!(matches!(
            parse_study_command("/quiz four two one"),
            StudyCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_parse_answer_joins_text() {
        assert_eq!(
            parse_study_command("/answer 2 rolling friction is weaker"),
            StudyCommand::Answer(2, "rolling friction is weaker".to_string())
        );
    }

    #[test]
    fn test_parse_answer_requires_number_and_text() {
        assert!(matches!(
            parse_study_command("/answer"),
            StudyCommand::Invalid(_)
        ));
        assert!(matches!(
            parse_study_command("/answer 2"),
            StudyCommand::Invalid(_)
        ));
        assert!(matches!(
            parse_study_command("/answer 0 text"),
            StudyCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_parse_upload_keeps_spaces_in_path() {
        assert_eq!(
            parse_study_command("/upload my answer sheet.png"),
            StudyCommand::Upload("my answer sheet.png".to_string())
        );
    }

    #[test]
    fn test_parse_submit_with_and_without_id() {
        assert_eq!(parse_study_command("/submit"), StudyCommand::Submit(None));
        assert_eq!(
            parse_study_command("/submit quiz-42"),
            StudyCommand::Submit(Some("quiz-42".to_string()))
        );
    }

    #[test]
    fn test_parse_unknown_slash_command_invalid() {
        assert!(matches!(
            parse_study_command("/frobnicate"),
            StudyCommand::Invalid(_)
        ));
    }

    #[test]
    fn test_entry_timestamp_renders_hours_and_minutes() {
        use crate::session::{EntryBody, Role, Timeline};

        let mut timeline = Timeline::new();
        let id = timeline.append(Role::User, EntryBody::plain("hello"));
        let stamp = entry_timestamp(timeline.get(id).unwrap());

        assert_eq!(stamp.len(), 5);
        assert_eq!(stamp.as_bytes()[2], b':');
    }

    #[test]
    fn test_find_topic_by_id() {
        let topics: Vec<Topic> = serde_json::from_value(serde_json::json!([
            {"topic_id": "viii_friction", "topic_name": "Friction", "class_level": "Class VIII"}
        ]))
        .unwrap();
        assert!(find_topic(&topics, "viii_friction").is_ok());
        assert!(find_topic(&topics, "ix_gravity").is_err());
    }
}
