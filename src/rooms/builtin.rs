// Demo route: five rooms of one house, walked in order.
use std::collections::BTreeMap;

use crate::config::QuestConfig;

use super::{RoomAction, RoomDefinition, RoomRewards, RouteDefinition};

fn room(actions: &[(&str, &str)], rewards: [&str; 3], hint: &str, clue: &str) -> RoomDefinition {
    RoomDefinition {
        actions: actions
            .iter()
            .map(|(id, text)| RoomAction { id: id.to_string(), text: text.to_string() })
            .collect(),
        rewards: RoomRewards {
            base: rewards[0].to_string(),
            high: rewards[1].to_string(),
            top: rewards[2].to_string(),
        },
        hint: hint.to_string(),
        clue: clue.to_string(),
    }
}

pub fn route() -> RouteDefinition {
    let mut rooms = BTreeMap::new();
    rooms.insert(
        "Kitchen".to_string(),
        room(
            &[
                ("kitchen-kettle", "Fill the kettle and wait for the first whistle."),
                ("kitchen-bread", "Break bread and leave one piece on the sill."),
            ],
            ["A cup of tea, made for you.", "Breakfast in bed, any morning you choose.", "A dinner of your design, cooked start to finish."],
            "Look where water meets fire.",
            "Warmth and the smell of something rising.",
        ),
    );
    rooms.insert(
        "Library".to_string(),
        room(
            &[("library-page", "Open the third book from the left and read its first line aloud.")],
            ["One poem, read to you.", "An evening of chapters, your choice of book.", "A letter, handwritten, sealed with wax."],
            "The third spine hides a folded note.",
            "Paper, dust and the quiet of closed covers.",
        ),
    );
    rooms.insert(
        "Garden".to_string(),
        room(
            &[
                ("garden-stone", "Find the flat stone by the gate and turn it over."),
                ("garden-moon", "Stand still and name what you see overhead."),
            ],
            ["A flower, picked for you.", "A walk at dusk, hand in hand.", "A night under the stars with blankets and wine."],
            "The gate stone is the only one without moss.",
            "Open air and the smell of wet earth.",
        ),
    );
    rooms.insert(
        "Bathroom".to_string(),
        room(
            &[("bath-mirror", "Breathe on the mirror and read what appears.")],
            ["A hot towel, warmed for you.", "A long bath with candles lit.", "A full evening of being pampered."],
            "Steam reveals what ink cannot.",
            "Tiles, steam and your own reflection.",
        ),
    );
    rooms.insert(
        "Bedroom".to_string(),
        room(
            &[
                ("bed-pillow", "Lift the left pillow."),
                ("bed-candle", "Light the candle and kneel until it steadies."),
            ],
            ["Ten minutes of whatever you ask.", "A massage, no time limit.", "One wish, granted without question."],
            "What rests on the left side is meant for you.",
            "The softest room in the house.",
        ),
    );
    RouteDefinition {
        route: ["Kitchen", "Library", "Garden", "Bathroom", "Bedroom"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        rooms,
        config: QuestConfig::default(),
    }
}
