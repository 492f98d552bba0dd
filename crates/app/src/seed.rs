use quiz_core::model::QuestionDraft;

/// (prompt, choices, correct index, reference)
type SampleQuestion = (&'static str, &'static [&'static str], usize, &'static str);

const SAMPLE_QUESTIONS: &[SampleQuestion] = &[
    (
        "Who built the ark?",
        &["Abraham", "Noah", "Moses", "Elijah"],
        1,
        "Genesis 6:14",
    ),
    (
        "How many days and nights did it rain during the flood?",
        &["7", "12", "40", "100"],
        2,
        "Genesis 7:12",
    ),
    (
        "Who was swallowed by a great fish?",
        &["Jonah", "Peter", "Daniel", "Samuel"],
        0,
        "Jonah 1:17",
    ),
    (
        "Which king wrote many of the Psalms?",
        &["Saul", "Solomon", "David", "Hezekiah"],
        2,
        "2 Samuel 23:1",
    ),
    (
        "Where was Jesus born?",
        &["Nazareth", "Jerusalem", "Bethlehem", "Capernaum"],
        2,
        "Matthew 2:1",
    ),
    (
        "Who was thrown into the lions' den?",
        &["Daniel", "Joseph", "Jeremiah", "Ezekiel"],
        0,
        "Daniel 6:16",
    ),
    (
        "What was the first plague of Egypt?",
        &["Frogs", "Locusts", "Water turned to blood", "Darkness"],
        2,
        "Exodus 7:20",
    ),
    (
        "Who denied Jesus three times?",
        &["Judas", "Peter", "Thomas", "John"],
        1,
        "Luke 22:61",
    ),
    (
        "Which book comes first in the New Testament?",
        &["Mark", "Acts", "Matthew", "Romans"],
        2,
        "Matthew 1:1",
    ),
    (
        "Who led the Israelites across the Jordan into Canaan?",
        &["Moses", "Aaron", "Joshua", "Caleb"],
        2,
        "Joshua 3:17",
    ),
    (
        "What did God create on the first day?",
        &["Light", "Land", "Animals", "Stars"],
        0,
        "Genesis 1:3",
    ),
    (
        "Who was the mother of Samuel?",
        &["Ruth", "Hannah", "Sarah", "Rachel"],
        1,
        "1 Samuel 1:20",
    ),
    (
        "How many disciples did Jesus choose?",
        &["7", "10", "12", "70"],
        2,
        "Mark 3:14",
    ),
    (
        "Who defeated Goliath?",
        &["Saul", "Jonathan", "David", "Samson"],
        2,
        "1 Samuel 17:50",
    ),
    (
        "What is the shortest verse in the Bible?",
        &["Jesus wept.", "Pray continually.", "God is love.", "Rejoice always."],
        0,
        "John 11:35",
    ),
    (
        "Who interpreted Pharaoh's dreams?",
        &["Joseph", "Daniel", "Moses", "Jacob"],
        0,
        "Genesis 41:25",
    ),
    (
        "On which road was Saul converted?",
        &["Road to Emmaus", "Road to Damascus", "Road to Jericho", "Road to Gaza"],
        1,
        "Acts 9:3",
    ),
    (
        "Which fruit of the Spirit is listed first?",
        &["Joy", "Peace", "Love", "Patience"],
        2,
        "Galatians 5:22",
    ),
    (
        "Who was Ruth's mother-in-law?",
        &["Naomi", "Orpah", "Leah", "Miriam"],
        0,
        "Ruth 1:4",
    ),
    (
        "What did Jesus feed the five thousand with?",
        &[
            "Five loaves and two fish",
            "Seven loaves",
            "Manna",
            "Bread and wine",
        ],
        0,
        "John 6:9",
    ),
];

/// Built-in question set used by `quiz seed`.
#[must_use]
pub fn sample_drafts() -> Vec<QuestionDraft> {
    SAMPLE_QUESTIONS
        .iter()
        .map(|(prompt, choices, correct, reference)| QuestionDraft {
            prompt: (*prompt).to_owned(),
            choices: choices.iter().map(|c| (*c).to_owned()).collect(),
            correct_choice: *correct,
            reference: Some((*reference).to_owned()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionId;

    #[test]
    fn every_sample_validates() {
        for (index, draft) in sample_drafts().into_iter().enumerate() {
            let id = QuestionId::new(index as u64 + 1);
            assert!(draft.validate(id).is_ok(), "sample {index} is invalid");
        }
    }
}
