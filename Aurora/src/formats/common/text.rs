//! Text decoding helpers
//!
//! Aurora stores text in whatever codepage the language uses, so decoding
//! always takes an explicit [`Encoding`].

use crate::error::Result;
use encoding_rs::{Encoding, UTF_16LE, WINDOWS_1252};
use std::io::Read;

/// Render a four-character tag (`GFF `, `V4.0`, ...) for messages.
#[must_use]
pub fn tag_to_string(tag: [u8; 4]) -> String {
    String::from_utf8_lossy(&tag).into_owned()
}

/// Decode raw bytes, stopping at the first NUL terminator.
///
/// For UTF-16LE the terminator is an aligned zero code unit.
#[must_use]
pub fn decode_text(bytes: &[u8], encoding: &'static Encoding) -> String {
    let end = if encoding == UTF_16LE {
        bytes
            .chunks_exact(2)
            .position(|unit| unit == [0, 0])
            .map_or(bytes.len(), |i| i * 2)
    } else {
        bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len())
    };

    let (text, _) = encoding.decode_without_bom_handling(&bytes[..end]);
    text.into_owned()
}

/// Read a fixed-width, NUL-padded ASCII string (labels, resrefs).
pub fn read_fixed_string<R: Read>(reader: &mut R, len: usize) -> Result<String> {
    let mut buffer = vec![0u8; len];
    reader.read_exact(&mut buffer)?;
    Ok(decode_text(&buffer, WINDOWS_1252))
}

#[derive(Clone, Copy)]
enum ColorState {
    Text,
    Open,
    Color(usize),
    Close,
}

/// Rewrite raw color escapes into their printable form.
///
/// Talk table text encodes colors as `<c` followed by three raw bytes
/// (red, green, blue) and `>`. Those raw bytes are not valid text in any
/// codepage, so they become `<cRRGGBBFF>` before decoding. Anything that
/// is not a complete escape passes through untouched.
#[must_use]
pub fn preparse_color_codes(data: &[u8]) -> Vec<u8> {
    let mut output = Vec::with_capacity(data.len());
    let mut color = [0u8; 3];
    let mut state = ColorState::Text;

    let mut i = 0;
    while i < data.len() {
        let c = data[i];
        match state {
            ColorState::Text => {
                if c == b'<' {
                    state = ColorState::Open;
                } else {
                    output.push(c);
                }
            }
            ColorState::Open => {
                if c == b'c' {
                    state = ColorState::Color(0);
                } else {
                    output.push(b'<');
                    state = ColorState::Text;
                    continue;
                }
            }
            ColorState::Color(n) => {
                color[n] = c;
                state = if n == 2 { ColorState::Close } else { ColorState::Color(n + 1) };
            }
            ColorState::Close => {
                state = ColorState::Text;
                if c == b'>' {
                    let code = format!("<c{:02X}{:02X}{:02X}FF>", color[0], color[1], color[2]);
                    output.extend_from_slice(code.as_bytes());
                } else {
                    output.extend_from_slice(b"<c");
                    output.extend_from_slice(&color);
                    continue;
                }
            }
        }
        i += 1;
    }

    // Flush an unfinished escape
    match state {
        ColorState::Text => {}
        ColorState::Open => output.push(b'<'),
        ColorState::Color(n) => {
            output.extend_from_slice(b"<c");
            output.extend_from_slice(&color[..n]);
        }
        ColorState::Close => {
            output.extend_from_slice(b"<c");
            output.extend_from_slice(&color);
        }
    }

    output
}
