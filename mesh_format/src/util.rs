use anyhow::{Context, Result};
use common::{progress::Progress, serde::Deserializer};

pub const WHITESPACE: [u8; 4] = [b' ', b'\t', b'\r', b'\n'];

const CHUNK_SIZE: usize = 8 * 1024;

/// Streams the input in chunks and calls `callback` with every non-empty
/// token between ASCII `delimiter` bytes. Progress is reported in bytes.
pub fn tokenize<T: Deserializer>(
    des: &mut T,
    delimiter: &[u8],
    progress: Progress,
    callback: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    split(des, delimiter, true, progress, callback)
}

/// Calls `callback` with every line of the input, blank ones included, so
/// the number of calls is the line number. Trailing `\r` is removed.
pub fn lines<T: Deserializer>(
    des: &mut T,
    progress: Progress,
    mut callback: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    split(des, b"\n", false, progress, |line| {
        callback(line.strip_suffix('\r').unwrap_or(line))
    })
}

fn split<T: Deserializer>(
    des: &mut T,
    delimiter: &[u8],
    skip_empty: bool,
    progress: Progress,
    mut callback: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    progress.set_total(des.size() as u64);

    let mut complete = 0;
    let mut carry = Vec::new();
    loop {
        let next = des.read_bytes(CHUNK_SIZE);
        let eof = next.is_empty();

        complete += next.len() as u64;
        progress.set_complete(complete);
        carry.extend_from_slice(&next);

        // Tokens may only be split at a delimiter, so anything after the last
        // one waits for the next chunk unless the input is exhausted.
        let end = if eof {
            carry.len()
        } else {
            match carry.iter().rposition(|x| delimiter.contains(x)) {
                Some(idx) => idx + 1,
                None => continue,
            }
        };

        let text = std::str::from_utf8(&carry[..end]).context("Mesh file is not valid UTF-8")?;
        // the last delimiter ends the final token rather than starting a new one
        let text = if eof { text } else { &text[..text.len() - 1] };
        if !(eof && text.is_empty()) {
            for token in text.split(|x: char| x.is_ascii() && delimiter.contains(&(x as u8))) {
                if !(skip_empty && token.is_empty()) {
                    callback(token)?;
                }
            }
        }

        carry.drain(..end);
        if eof {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use common::serde::SliceDeserializer;

    use super::*;

    fn collect(input: &str, delimiter: &[u8]) -> Vec<String> {
        let mut des = SliceDeserializer::new(input.as_bytes());
        let mut out = Vec::new();
        tokenize(&mut des, delimiter, Progress::new(), |token| {
            out.push(token.to_owned());
            Ok(())
        })
        .unwrap();
        out
    }

    fn collect_lines(input: &str) -> Vec<String> {
        let mut des = SliceDeserializer::new(input.as_bytes());
        let mut out = Vec::new();
        lines(&mut des, Progress::new(), |line| {
            out.push(line.to_owned());
            Ok(())
        })
        .unwrap();
        out
    }

    #[test]
    fn last_token_without_delimiter() {
        assert_eq!(collect("a b\n c", &WHITESPACE), ["a", "b", "c"]);
        assert_eq!(collect_lines("v 1 2 3"), ["v 1 2 3"]);
    }

    #[test]
    fn tokens_across_chunks() {
        let line = "v 0.125 0.25 0.5\n";
        let input = line.repeat(CHUNK_SIZE / line.len() * 3);
        let tokens = collect(&input, &WHITESPACE);
        assert_eq!(tokens.len(), CHUNK_SIZE / line.len() * 3 * 4);

        let lines = collect_lines(&input);
        assert_eq!(lines.len(), CHUNK_SIZE / line.len() * 3);
        assert!(lines.iter().all(|x| x == line.trim_end()));
    }

    #[test]
    fn blank_lines_are_kept() {
        assert_eq!(
            collect_lines("a\r\n\r\nb\n\nc\n"),
            ["a", "", "b", "", "c"]
        );
        assert_eq!(collect_lines("\n"), [""]);
    }

    #[test]
    fn empty_input() {
        assert!(collect("", &WHITESPACE).is_empty());
        assert!(collect_lines("").is_empty());
    }
}
