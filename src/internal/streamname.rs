use std::char;

// ========================================================================= //

const TABLE_PREFIX: char = '\u{4840}';
const SYSTEM_PREFIX: char = '\u{5}';

// ========================================================================= //

/// What a raw compound-file stream holds, judged from its name.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StreamKind {
    /// A database table (or the string pool).
    Table,
    /// A property set, such as the summary information or a signature.
    System,
    /// A user stream, for example an embedded cabinet or a binary.
    Data,
}

/// Decodes a raw stream name as stored in the compound file, returning the
/// name as the database refers to it and what kind of stream it is.
pub fn decode(raw_name: &str) -> (String, StreamKind) {
    let mut chars = raw_name.chars().peekable();
    let kind = match chars.peek() {
        Some(&TABLE_PREFIX) => {
            chars.next();
            StreamKind::Table
        }
        Some(&SYSTEM_PREFIX) => StreamKind::System,
        _ => StreamKind::Data,
    };
    let mut name = String::with_capacity(raw_name.len() * 2);
    for chr in chars {
        let value = chr as u32;
        if (0x3800..0x4800).contains(&value) {
            let pair = value - 0x3800;
            name.push(from_b64(pair & 0x3f));
            name.push(from_b64(pair >> 6));
        } else if (0x4800..0x4840).contains(&value) {
            name.push(from_b64(value - 0x4800));
        } else {
            name.push(chr);
        }
    }
    (name, kind)
}

// ========================================================================= //

fn from_b64(value: u32) -> char {
    debug_assert!(value < 64);
    match value {
        0..=9 => char::from(b'0' + value as u8),
        10..=35 => char::from(b'A' + (value - 10) as u8),
        36..=61 => char::from(b'a' + (value - 36) as u8),
        62 => '.',
        _ => '_',
    }
}

// ========================================================================= //

#[cfg(test)]
mod tests {
    use super::{decode, from_b64, StreamKind};

    #[test]
    fn b64_alphabet() {
        let alphabet: String = (0..64).map(from_b64).collect();
        assert_eq!(
            alphabet,
            "0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ\
             abcdefghijklmnopqrstuvwxyz._"
        );
    }

    #[test]
    fn decode_table_names() {
        assert_eq!(
            decode("\u{4840}\u{3b3f}\u{43f2}\u{4438}\u{45b1}"),
            ("_Columns".to_string(), StreamKind::Table)
        );
        assert_eq!(
            decode("\u{4840}\u{3f7f}\u{4164}\u{422f}\u{4836}"),
            ("_Tables".to_string(), StreamKind::Table)
        );
    }

    #[test]
    fn decode_data_stream_names() {
        assert_eq!(
            decode("\u{44ca}\u{47b3}\u{46e8}\u{4828}"),
            ("App.exe".to_string(), StreamKind::Data)
        );
        // Characters outside the packed alphabet pass through unchanged.
        assert_eq!(
            decode("disk 1-a"),
            ("disk 1-a".to_string(), StreamKind::Data)
        );
    }

    #[test]
    fn decode_system_stream_names() {
        assert_eq!(
            decode("\u{5}SummaryInformation"),
            ("\u{5}SummaryInformation".to_string(), StreamKind::System)
        );
    }
}

// ========================================================================= //
