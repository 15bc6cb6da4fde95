// Chapter 4: The Convergence. Stillness, then a bounded choice.
use super::{Chapter, Level, Mechanic};

pub fn chapter() -> Chapter {
    Chapter {
        id: "convergence".to_string(),
        title: "The Convergence".to_string(),
        direction: "Everything gathered now meets in one place. The game condenses and becomes deliberate.".to_string(),
        levels: vec![Level {
            id: "c4-l1".to_string(),
            title: "The Closing Ritual".to_string(),
            direction: "Set the bed as the altar. Choose a posture, hold still until the timer ends, then choose three things with intention.".to_string(),
            action: "Hold stillness, then choose.".to_string(),
            item: Some("None. Only what has already been earned.".to_string()),
            mechanics: Some(Mechanic::Convergence {
                stillness_seconds: Some(120),
                choose_count: Some(3),
            }),
        }],
    }
}
