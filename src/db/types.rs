use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Closed set of item kinds a lesson position can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "contentkind", rename_all = "lowercase")]
pub(crate) enum ContentKind {
    Text,
    File,
    Image,
    Video,
    Question,
    Answer,
    Task,
}

impl ContentKind {
    pub(crate) const ALL: [ContentKind; 7] = [
        ContentKind::Text,
        ContentKind::File,
        ContentKind::Image,
        ContentKind::Video,
        ContentKind::Question,
        ContentKind::Answer,
        ContentKind::Task,
    ];

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::File => "file",
            Self::Image => "image",
            Self::Video => "video",
            Self::Question => "question",
            Self::Answer => "answer",
            Self::Task => "task",
        }
    }

    /// Table holding the concrete rows for this kind.
    pub(crate) fn table(self) -> &'static str {
        match self {
            Self::Text => "content_texts",
            Self::File => "content_files",
            Self::Image => "content_images",
            Self::Video => "content_videos",
            Self::Question => "content_questions",
            Self::Answer => "content_answers",
            Self::Task => "content_tasks",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct UnknownContentKind(pub(crate) String);

impl FromStr for ContentKind {
    type Err = UnknownContentKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ContentKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownContentKind(value.to_string()))
    }
}
