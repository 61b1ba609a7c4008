use crate::index::NoteIndex;
use crate::model::Note;

/// Filters the index's sorted view by case-insensitive substring match
/// against the display name OR the content. The empty query returns the
/// full view. Pure function of (index, query) — debouncing keystrokes is
/// the input-handling collaborator's concern, not this core's.
pub fn filter<'a>(index: &'a NoteIndex, query: &str) -> Vec<&'a Note> {
    if query.is_empty() {
        return index.sorted().iter().collect();
    }
    let query = query.to_lowercase();
    index
        .sorted()
        .iter()
        .filter(|note| {
            note.display_name().to_lowercase().contains(&query)
                || note.content.to_lowercase().contains(&query)
        })
        .collect()
}
