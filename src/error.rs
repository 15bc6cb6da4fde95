use thiserror::Error;

/// Everything a quest operation can refuse or fail with.
///
/// Input rejections render in place as their `Display` text; nothing here is
/// ever shown as a blocking dialog.
#[derive(Debug, Error, PartialEq)]
pub enum QuestError {
    /// Directions must be revealed by a roll on this level first.
    #[error("Roll the d20 for this level first.")]
    NotRevealed,

    #[error("Only single letters can be added.")]
    NotALetter,

    #[error("'{0}' is not in the word.")]
    LetterNotInWord(char),

    #[error("Not yet. The word resists you.")]
    WrongGuess,

    #[error("Not yet. Look closer.")]
    WrongAnswer,

    #[error("The deck is empty. Reshuffle to tempt fate again.")]
    DeckEmpty,

    #[error("Choose your position before starting the stillness.")]
    PostureMissing,

    #[error("Stillness is already {0}.")]
    StillnessResolved(&'static str),

    #[error("Stillness has not started.")]
    StillnessNotRunning,

    #[error("Hold stillness first. Then choose by intention.")]
    PicksLocked,

    #[error("'{0}' is not one of the available items.")]
    UnknownItem(String),

    #[error("Choose exactly {0} items.")]
    ChooseExactly(usize),

    #[error("The hint for this step has already been bought.")]
    HintAlreadyUsed,

    #[error("Not enough obols: need {need}, have {have}.")]
    InsufficientObols { need: u32, have: u32 },

    #[error("That control is not available on this screen.")]
    WrongScreen,

    #[error("The die is not ready yet.")]
    NotArmed,

    #[error("No such entry: {0}")]
    NotFound(String),

    /// Level has no mechanic of the requested kind.
    #[error("This level has no {0}.")]
    NoMechanic(&'static str),

    #[error("invalid game content: {0}")]
    Content(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<serde_json::Error> for QuestError {
    fn from(e: serde_json::Error) -> Self {
        QuestError::Content(e.to_string())
    }
}

pub type QuestResult<T> = Result<T, QuestError>;
