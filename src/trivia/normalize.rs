use rand::seq::SliceRandom;

use crate::{state::game::Question, trivia::models::TriviaResult};

/// Turn raw source records into playable questions.
///
/// Entities are decoded, the correct answer is mixed into the distractors
/// with a uniform shuffle, and each question receives a session-local id
/// (`q0`, `q1`, ...). Those ids are meaningless outside the session that
/// fetched them and must never be persisted.
pub fn normalize(results: Vec<TriviaResult>) -> Vec<Question> {
    let mut rng = rand::rng();

    results
        .into_iter()
        .enumerate()
        .map(|(index, result)| {
            let correct_answer = decode_entities(&result.correct_answer);

            let mut options: Vec<String> = result
                .incorrect_answers
                .iter()
                .map(|answer| decode_entities(answer))
                .collect();
            options.push(correct_answer.clone());
            options.shuffle(&mut rng);

            Question {
                id: format!("q{index}"),
                category: decode_entities(&result.category),
                text: decode_entities(&result.question),
                options,
                correct_answer,
            }
        })
        .collect()
}

/// Decode the HTML entities the trivia source embeds in its payloads.
///
/// Handles numeric references and the named entities observed in source
/// output; unknown sequences are passed through verbatim.
pub fn decode_entities(text: &str) -> String {
    let mut decoded = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(start) = rest.find('&') {
        decoded.push_str(&rest[..start]);
        let tail = &rest[start..];

        let entity = tail[1..]
            .find(';')
            .filter(|end| *end <= 10)
            .map(|end| &tail[1..1 + end]);

        match entity.and_then(decode_entity) {
            Some(ch) => {
                decoded.push(ch);
                // Skip '&', the entity name, and ';'.
                rest = &tail[entity.map(str::len).unwrap_or(0) + 2..];
            }
            None => {
                decoded.push('&');
                rest = &tail[1..];
            }
        }
    }

    decoded.push_str(rest);
    decoded
}

fn decode_entity(name: &str) -> Option<char> {
    if let Some(number) = name.strip_prefix('#') {
        let code = match number.strip_prefix(['x', 'X']) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => number.parse().ok()?,
        };
        return char::from_u32(code);
    }

    let ch = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "rsquo" => '\u{2019}',
        "lsquo" => '\u{2018}',
        "rdquo" => '\u{201d}',
        "ldquo" => '\u{201c}',
        "hellip" => '\u{2026}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "deg" => '\u{b0}',
        "eacute" => '\u{e9}',
        "egrave" => '\u{e8}',
        "aacute" => '\u{e1}',
        "iacute" => '\u{ed}',
        "oacute" => '\u{f3}',
        "uacute" => '\u{fa}',
        "ntilde" => '\u{f1}',
        "auml" => '\u{e4}',
        "ouml" => '\u{f6}',
        "uuml" => '\u{fc}',
        "szlig" => '\u{df}',
        "ccedil" => '\u{e7}',
        "pound" => '\u{a3}',
        "euro" => '\u{20ac}',
        "times" => '\u{d7}',
        "divide" => '\u{f7}',
        _ => return None,
    };
    Some(ch)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(question: &str, correct: &str, incorrect: &[&str]) -> TriviaResult {
        TriviaResult {
            category: "General Knowledge".into(),
            kind: "multiple".into(),
            difficulty: "easy".into(),
            question: question.into(),
            correct_answer: correct.into(),
            incorrect_answers: incorrect.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn decodes_named_and_numeric_entities() {
        assert_eq!(
            decode_entities("What&#039;s &quot;Schr&ouml;dinger&quot;?"),
            "What's \"Schrödinger\"?"
        );
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("caf&#xe9;"), "café");
    }

    #[test]
    fn unknown_entities_pass_through() {
        assert_eq!(decode_entities("&bogus; & rest"), "&bogus; & rest");
        assert_eq!(decode_entities("dangling &amp"), "dangling &amp");
    }

    #[test]
    fn correct_answer_always_appears_among_options() {
        let questions = normalize(vec![
            raw("Q1?", "a", &["b", "c", "d"]),
            raw("Q2?", "x&amp;y", &["u", "v", "w"]),
        ]);

        for question in &questions {
            assert!(question.options.contains(&question.correct_answer));
        }
        assert_eq!(questions[1].correct_answer, "x&y");
    }

    #[test]
    fn option_count_is_incorrect_plus_one() {
        let questions = normalize(vec![raw("Q?", "a", &["b", "c", "d"])]);
        assert_eq!(questions[0].options.len(), 4);
    }

    #[test]
    fn ids_are_sequential_per_session() {
        let questions = normalize(vec![
            raw("Q1?", "a", &["b"]),
            raw("Q2?", "a", &["b"]),
            raw("Q3?", "a", &["b"]),
        ]);
        let ids: Vec<_> = questions.iter().map(|q| q.id.as_str()).collect();
        assert_eq!(ids, vec!["q0", "q1", "q2"]);
    }
}
