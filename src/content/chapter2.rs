// Chapter 2: The Deck of Nights. Chance, a riddle and a sealed box.
use super::{Chapter, Level, Mechanic};

pub fn chapter() -> Chapter {
    Chapter {
        id: "nights".to_string(),
        title: "The Deck of Nights".to_string(),
        direction: "Fate keeps a calendar. Roll, draw, and let the card decide when the next door opens.".to_string(),
        levels: vec![
            Level {
                id: "c2-l1".to_string(),
                title: "Fate Draw".to_string(),
                direction: "Keep the deck beside the candle. After the die lands, draw once and commit to the night it names.".to_string(),
                action: "Draw one card. No redraws.".to_string(),
                item: Some("Candle".to_string()),
                mechanics: Some(Mechanic::DiceDraw { deck: "nights".to_string() }),
            },
            Level {
                id: "c2-l2".to_string(),
                title: "The Pale Riddle".to_string(),
                direction: "I am always watching yet never awake; I am full, then gone, then thin as a blade. Name me.".to_string(),
                action: "Answer the riddle.".to_string(),
                item: None,
                mechanics: Some(Mechanic::Riddle {
                    caption: Some("Read it twice. The answer hangs above the garden.".to_string()),
                    image: None,
                    solution: "Moon".to_string(),
                }),
            },
            Level {
                id: "c2-l3".to_string(),
                title: "The Sealed Box".to_string(),
                direction: "A box waits on the table. Weigh it, listen to it, but do not open it until your guess is spoken.".to_string(),
                action: "Lock in a guess, then open the box.".to_string(),
                item: Some("Silk ribbon".to_string()),
                mechanics: Some(Mechanic::Guess),
            },
        ],
    }
}
