// Chapter 1: The Threshold. Introduces the veil and the word hunt.
use super::{Chapter, Level, Mechanic};

pub fn chapter() -> Chapter {
    Chapter {
        id: "threshold".to_string(),
        title: "The Threshold".to_string(),
        direction: "Every door in this house has a story. Tonight you will learn which ones are listening, and which ones only pretend to sleep.".to_string(),
        levels: vec![
            Level {
                id: "c1-l1".to_string(),
                title: "Letters in the Dust".to_string(),
                direction: "Nine letters are hidden in the rooms you walk through every day. Look under what you lift without thinking, inside what you open without looking.".to_string(),
                action: "Find the letters. The collar stays on until the word is whole.".to_string(),
                item: Some("Collar".to_string()),
                mechanics: Some(Mechanic::WordHunt { word: Some("PINEAPPLE".to_string()) }),
            },
            Level {
                id: "c1-l2".to_string(),
                title: "First Words".to_string(),
                direction: "Sit by the window where the evening light is kindest. Write what you hope this quest will change.".to_string(),
                action: "Write one honest paragraph and save it.".to_string(),
                item: Some("Notebook".to_string()),
                mechanics: Some(Mechanic::Prompt {
                    input: Some("What do you hope this quest will change?".to_string()),
                }),
            },
        ],
    }
}
