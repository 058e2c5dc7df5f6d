use serde::Serialize;

use crate::model::Note;

/// Where a note selection came from. The core treats both the same; the host
/// uses it to animate the right control.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteSource {
    Pointer,
    Keyboard,
}

/// American letter names mapped onto solfège: `c` is `do`, `b` is `si`.
pub fn note_for_key(key: &str) -> Option<Note> {
    match key.to_lowercase().as_str() {
        "c" => Some(Note::Do),
        "d" => Some(Note::Re),
        "e" => Some(Note::Mi),
        "f" => Some(Note::Fa),
        "g" => Some(Note::Sol),
        "a" => Some(Note::La),
        "b" => Some(Note::Si),
        _ => None,
    }
}
