//! Parsing of helper program output
//!
//! Two formats show up: `KEY:value` lines written by the scripting bridges
//! (PowerShell, AppleScript) and the property dump printed by
//! `dbus-send --print-reply`.

use nowtoast_core::TrackSnapshot;

const STATUS_PREFIX: &str = "STATUS:";
const TITLE_PREFIX: &str = "TITLE:";
const ARTIST_PREFIX: &str = "ARTIST:";
const ALBUM_PREFIX: &str = "ALBUM:";

pub const PLAYING: &str = "Playing";

/// MPRIS keys of interest in a `Metadata` property dump
pub const KEY_TITLE: &str = "xesam:title";
pub const KEY_ARTIST: &str = "xesam:artist";
pub const KEY_ALBUM: &str = "xesam:album";
pub const KEY_TRACK_ID: &str = "mpris:trackid";

const DICT_ENTRY: &str = "dict entry(";
const ARRAY_OPEN: &str = "array [";
const STRING_OPEN: &str = "string \"";
const VARIANT: &str = "variant";

/// Parse `STATUS:`/`TITLE:`/`ARTIST:`/`ALBUM:` lines into a snapshot.
///
/// - no lines at all: `None`
/// - status other than `Playing`: the nothing-playing snapshot
/// - `Playing` without a title: `None`
///
/// Unknown lines are ignored and the order of lines does not matter.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Option<TrackSnapshot> {
    if lines.is_empty() {
        return None;
    }

    let mut status = None;
    let mut title = "";
    let mut artist = "";
    let mut album = "";

    for line in lines {
        let line = line.as_ref();
        if let Some(value) = line.strip_prefix(STATUS_PREFIX) {
            status = Some(value);
        } else if let Some(value) = line.strip_prefix(ARTIST_PREFIX) {
            artist = value;
        } else if let Some(value) = line.strip_prefix(TITLE_PREFIX) {
            title = value;
        } else if let Some(value) = line.strip_prefix(ALBUM_PREFIX) {
            album = value;
        }
    }

    if status != Some(PLAYING) {
        return Some(TrackSnapshot::nothing_playing());
    }

    TrackSnapshot::playing(None, title, artist, album)
}

/// Pull the value of `key` out of a `dbus-send --print-reply` dump.
///
/// The search is confined to the dict entry holding the key. For
/// `xesam:artist` the first element of a string array is preferred, since
/// MPRIS declares artists as a list. Otherwise the first quoted string is
/// used, then any quoted value inside the variant (`object path "…"` for
/// track ids).
pub fn extract_property(raw: &str, key: &str) -> Option<String> {
    let scope = entry_scope(raw, key)?;

    if key == KEY_ARTIST {
        if let Some(value) = scope
            .find(ARRAY_OPEN)
            .and_then(|start| quoted_after(&scope[start..], STRING_OPEN))
        {
            return Some(value.to_string());
        }
    }

    if let Some(value) = quoted_after(scope, STRING_OPEN) {
        return Some(value.to_string());
    }

    scope
        .find(VARIANT)
        .and_then(|start| quoted_after(&scope[start..], "\""))
        .map(str::to_string)
}

/// Text following the first whole-word occurrence of `key`, up to the next
/// dict entry.
fn entry_scope<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    let mut offset = 0;
    while let Some(found) = raw[offset..].find(key) {
        let start = offset + found;
        let end = start + key.len();
        let before_ok = raw[..start]
            .chars()
            .next_back()
            .map_or(true, |c| !is_key_char(c));
        let after_ok = raw[end..].chars().next().map_or(true, |c| !is_key_char(c));

        if before_ok && after_ok {
            let rest = &raw[end..];
            return Some(match rest.find(DICT_ENTRY) {
                Some(next) => &rest[..next],
                None => rest,
            });
        }
        offset = end;
    }
    None
}

fn is_key_char(c: char) -> bool {
    c.is_alphanumeric() || c == ':' || c == '_' || c == '-'
}

/// First non-empty value between `open` and the next `"`
fn quoted_after<'a>(text: &'a str, open: &str) -> Option<&'a str> {
    let start = text.find(open)? + open.len();
    let len = text[start..].find('"')?;
    let value = &text[start..start + len];
    (!value.is_empty()).then_some(value)
}
