//! Positional re-encoding of embedded song data

use super::literal::parse_literal;
use crate::error::{PackError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// Pseudo-function call marking a song literal to re-encode
pub const SONG_CALL: &str = "__includeSongData(";

/// A sequence of numeric parameters where holes are allowed
pub type Sequence = Vec<Option<Number>>;

/// A song as exported by the music tracker
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Song {
    pub song_data: Vec<Instrument>,
    #[serde(default)]
    pub row_len: Option<Number>,
    #[serde(default)]
    pub pattern_len: Option<Number>,
    #[serde(default)]
    pub end_pattern: Option<Number>,
    #[serde(default)]
    pub num_channels: Option<Number>,
}

/// An instrument; a missing field stays absent and is packed as a hole
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Instrument {
    /// Synth parameters
    #[serde(rename = "i")]
    pub params: Option<Sequence>,
    /// Pattern order
    #[serde(rename = "p")]
    pub patterns: Option<Sequence>,
    /// Per-channel note and effect columns
    #[serde(rename = "c")]
    pub channels: Option<Vec<Channel>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Channel {
    #[serde(rename = "n")]
    pub notes: Option<Sequence>,
    #[serde(rename = "f")]
    pub effects: Option<Sequence>,
}

/// `[instruments, rowLen, patternLen, endPattern, numChannels]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PackedSong(pub Vec<PackedInstrument>, pub Option<Number>, pub Option<Number>, pub Option<Number>, pub Option<Number>);

/// `[params, patterns, [[notes, effects], ...]]`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PackedInstrument(pub Option<Sequence>, pub Option<Sequence>, pub Option<Vec<(Option<Sequence>, Option<Sequence>)>>);

/// Number of fields of the packed song array
const PACKED_SONG_LEN: usize = 5;
/// Number of fields of a packed instrument
const PACKED_INSTRUMENT_LEN: usize = 3;
/// Number of columns of a packed channel
const PACKED_CHANNEL_LEN: usize = 2;

impl From<Song> for PackedSong {
    fn from(song: Song) -> Self {
        let instruments = song
            .song_data
            .into_iter()
            .map(|instrument| {
                let channels = instrument.channels.map(|channels| channels.into_iter().map(|channel| (channel.notes, channel.effects)).collect());
                PackedInstrument(instrument.params, instrument.patterns, channels)
            })
            .collect();

        PackedSong(instruments, song.row_len, song.pattern_len, song.end_pattern, song.num_channels)
    }
}

impl From<PackedSong> for Song {
    fn from(packed: PackedSong) -> Self {
        let PackedSong(instruments, row_len, pattern_len, end_pattern, num_channels) = packed;
        Song {
            song_data: instruments
                .into_iter()
                .map(|PackedInstrument(params, patterns, channels)| Instrument {
                    params,
                    patterns,
                    channels: channels.map(|channels| channels.into_iter().map(|(notes, effects)| Channel { notes, effects }).collect()),
                })
                .collect(),
            row_len,
            pattern_len,
            end_pattern,
            num_channels,
        }
    }
}

/// Converts a song object literal into its packed array literal
///
/// Every `null` token is dropped from the output: positions alone carry meaning and
/// an empty array slot reads back the same as an explicit absent value.
///
/// # Errors
/// `SongLiteral` if the text is not a literal, `SongShape` if it is not a song.
pub fn encode_song(literal: &str) -> Result<String> {
    let song: Song = serde_json::from_value(parse_literal(literal)?).map_err(PackError::SongShape)?;
    let packed = PackedSong::from(song);
    let json = serde_json::to_string(&packed).map_err(PackError::SongShape)?;
    Ok(json.replace("null", ""))
}

/// Restores trailing holes that a trailing comma swallowed
fn pad_array(value: &mut Value, len: usize) {
    if let Value::Array(items) = value {
        if items.len() < len {
            items.resize(len, Value::Null);
        }
    }
}

/// Reads a packed array literal back into a song
///
/// Trailing absent values of the song, instrument and channel arrays may have been
/// dropped by the encoder; they are restored as absent.
pub fn decode_packed_song(literal: &str) -> Result<Song> {
    let mut value = parse_literal(literal)?;
    pad_array(&mut value, PACKED_SONG_LEN);
    if let Some(Value::Array(instruments)) = value.get_mut(0) {
        for instrument in instruments.iter_mut() {
            pad_array(instrument, PACKED_INSTRUMENT_LEN);
            if let Some(Value::Array(channels)) = instrument.get_mut(2) {
                channels.iter_mut().for_each(|channel| pad_array(channel, PACKED_CHANNEL_LEN));
            }
        }
    }
    let packed: PackedSong = serde_json::from_value(value).map_err(PackError::SongShape)?;
    Ok(packed.into())
}

/// Replaces every `__includeSongData(<literal>)` call in `code` with the packed literal
///
/// The literal ends at the first `)` after the call's opening parenthesis, so it
/// must not contain a closing parenthesis itself, not even in a comment.
pub fn recode_song_calls(code: &str) -> Result<String> {
    let mut code = code.to_string();

    while let Some(start) = code.find(SONG_CALL) {
        let literal_start = start + SONG_CALL.len();
        let end = code[literal_start..].find(')').map(|i| literal_start + i).ok_or_else(|| PackError::SongLiteral {
            offset: literal_start,
            message: "song data call is never closed".to_string(),
        })?;

        let encoded = encode_song(&code[literal_start..end]).map_err(|e| match e {
            PackError::SongLiteral { offset, message } => PackError::SongLiteral {
                offset: literal_start + offset,
                message,
            },
            other => other,
        })?;
        tracing::debug!("Packed song data from {} to {} bytes", end - literal_start, encoded.len());

        code.replace_range(start..=end, &encoded);
    }

    Ok(code)
}
