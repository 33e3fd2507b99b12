//! Song data recoding
//!
//! Music is embedded in scripts as `__includeSongData({...})`, holding the object
//! literal exported by the tracker. The build replaces each call with a much
//! smaller positional array that the player indexes directly.

mod literal;
mod recode;

pub use literal::parse_literal;
pub use recode::{Channel, Instrument, PackedInstrument, PackedSong, SONG_CALL, Sequence, Song, decode_packed_song, encode_song, recode_song_calls};
