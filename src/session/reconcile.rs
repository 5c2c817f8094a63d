//! Positional reconciliation of OCR answers into a quiz
//!
//! The backend's OCR pass returns the answer sheet as free text. The only
//! structure we can rely on is position: students write answers top to
//! bottom, one per line. So the n-th non-blank line is paired with the n-th
//! question, and a pairing only fills a slot the student has not typed into.
//! Typed answers always win over extracted ones.

use crate::session::quiz::QuizState;

/// Merge OCR-extracted text into the quiz's answer map.
///
/// The n-th non-blank line of `extracted_text` is paired with the n-th
/// question. A pairing is applied only when the question has no non-empty
/// manual answer. Fewer lines than questions leaves the trailing questions
/// untouched; surplus lines are ignored.
///
/// Returns the number of answers actually written.
pub fn merge_extracted_answers(quiz: &mut QuizState, extracted_text: &str) -> usize {
    let lines: Vec<&str> = extracted_text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let mut merged = 0;
    let question_ids: Vec<String> = quiz.questions.iter().map(|q| q.id.clone()).collect();

    for (question_id, line) in question_ids.iter().zip(lines.iter()) {
        if quiz.has_answer(question_id) {
            tracing::debug!(
                "Skipping extracted answer for {}: manual answer present",
                question_id
            );
            continue;
        }
        quiz.set_answer(question_id.clone(), line.to_string());
        merged += 1;
    }

    tracing::info!(
        "Merged {} extracted answer(s) into quiz {} ({} line(s), {} question(s))",
        merged,
        quiz.quiz_id,
        lines.len(),
        question_ids.len()
    );

    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::QuestionKind;
    use crate::session::quiz::Question;

    fn quiz_with_questions(n: usize) -> QuizState {
        let questions = (1..=n)
            .map(|i| Question {
                id: format!("q{}", i),
                kind: QuestionKind::ShortAnswer,
                prompt: format!("question {}", i),
                options: Vec::new(),
                correct_answer: String::new(),
                explanation: None,
            })
            .collect();
        QuizState::new("quiz-1", "Crop Production", questions)
    }

    #[test]
    fn test_lines_map_to_questions_by_position() {
        let mut quiz = quiz_with_questions(3);
        let merged = merge_extracted_answers(&mut quiz, "Ploughing\nweeding\nIrrigation");

        assert_eq!(merged, 3);
        assert_eq!(quiz.answers.get("q1").unwrap(), "Ploughing");
        assert_eq!(quiz.answers.get("q2").unwrap(), "weeding");
        assert_eq!(quiz.answers.get("q3").unwrap(), "Irrigation");
    }

    #[test]
    fn test_fewer_lines_leave_trailing_questions_unset() {
        let mut quiz = quiz_with_questions(3);
        let merged = merge_extracted_answers(&mut quiz, "Ploughing\nweeding");

        assert_eq!(merged, 2);
        assert!(quiz.answers.get("q3").is_none());
    }

    #[test]
    fn test_surplus_lines_ignored() {
        let mut quiz = quiz_with_questions(1);
        let merged = merge_extracted_answers(&mut quiz, "first\nsecond\nthird");

        assert_eq!(merged, 1);
        assert_eq!(quiz.answers.len(), 1);
        assert_eq!(quiz.answers.get("q1").unwrap(), "first");
    }

    #[test]
    fn test_manual_answer_not_overwritten() {
        let mut quiz = quiz_with_questions(2);
        quiz.set_answer("q1", "typed by hand");
        let merged = merge_extracted_answers(&mut quiz, "from ocr\nalso ocr");

        assert_eq!(merged, 1);
        assert_eq!(quiz.answers.get("q1").unwrap(), "typed by hand");
        assert_eq!(quiz.answers.get("q2").unwrap(), "also ocr");
    }

    #[test]
    fn test_empty_manual_answer_is_fillable() {
        let mut quiz = quiz_with_questions(1);
        quiz.set_answer("q1", "");
        merge_extracted_answers(&mut quiz, "from ocr");

        assert_eq!(quiz.answers.get("q1").unwrap(), "from ocr");
    }

    #[test]
    fn test_blank_and_padded_lines_skipped() {
        let mut quiz = quiz_with_questions(2);
        merge_extracted_answers(&mut quiz, "\n  Ploughing  \n\n\tweeding\n");

        assert_eq!(quiz.answers.get("q1").unwrap(), "Ploughing");
        assert_eq!(quiz.answers.get("q2").unwrap(), "weeding");
    }

    #[test]
    fn test_empty_text_merges_nothing() {
        let mut quiz = quiz_with_questions(2);
        let merged = merge_extracted_answers(&mut quiz, "   \n\n");

        assert_eq!(merged, 0);
        assert!(quiz.answers.is_empty());
    }
}
