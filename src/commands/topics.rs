//! Topic listing command
//!
//! Lists class levels and their topics so a student can find a `topic_id`
//! to pass to `gurukul study`.

use crate::backend::{HttpBackend, TutorBackend};
use crate::config::Config;
use crate::error::Result;
use colored::Colorize;

/// List class levels and curriculum topics
///
/// With `--class`, only that class level's topics are shown; otherwise every
/// class level is listed in turn.
pub async fn run_topics(config: Config, class_level: Option<String>) -> Result<()> {
    let backend = HttpBackend::new(&config.backend)?;

    let class_levels = match class_level {
        Some(cl) => vec![cl],
        None => backend.list_classes().await?,
    };

    for class_level in class_levels {
        println!("{}", class_level.bold().underline());

        let topics = backend.list_topics(Some(&class_level)).await?;
        if topics.is_empty() {
            println!("  (no topics)");
            continue;
        }

        for topic in topics {
            match &topic.chapter {
                Some(chapter) => println!(
                    "  {}  {} ({})",
                    topic.topic_id.cyan(),
                    topic.topic_name,
                    chapter
                ),
                None => println!("  {}  {}", topic.topic_id.cyan(), topic.topic_name),
            }
        }
        println!();
    }

    Ok(())
}
