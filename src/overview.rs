//! Normalises free-text descriptions before they are written as overviews.

const MAX_OVERVIEW_CHARS: usize = 500;
const TRUNCATION_MARKER: &str = " ...";
const LINE_BREAK: &str = "<br>";

/// Cleans a raw description for Jellyfin's overview field.
///
/// Text longer than 500 characters is cut and marked with `" ..."`, newlines
/// become `<br>`. Missing or empty input yields `None` so the field is left out
/// of the update altogether.
pub fn clean_overview(raw: Option<&str>) -> Option<String> {
    let raw = raw.filter(|text| !text.is_empty())?;

    let truncated = match raw.char_indices().nth(MAX_OVERVIEW_CHARS) {
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &raw[..cut]),
        None => raw.to_string(),
    };

    Some(truncated.replace('\n', LINE_BREAK))
}
