use color_print::cformat;

use crate::session::Listing;

const BYTES_PER_ROW: usize = 8;
// "[0000] " + 8 * "XX "
const CODE_WIDTH: usize = 7 + BYTES_PER_ROW * 3;

fn hex_row(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{b:02X}"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn code_cell(offset: usize, row: &[u8]) -> String {
    let hex = format!("{:<w$}", hex_row(row), w = CODE_WIDTH - 7);
    cformat!("<dim>[{:04X}]</> {}", offset, hex)
}

/// Rows of the listing for `entries` against the final code bytes.
pub fn format_listing(entries: &[Listing], code: &[u8]) -> Vec<String> {
    let mut rows = Vec::new();
    let mut current: Option<&str> = None;

    for entry in entries {
        if current != Some(entry.file.as_str()) {
            current = Some(entry.file.as_str());
            rows.push(format!(
                "{}+------[{}]{}",
                "-".repeat(CODE_WIDTH),
                entry.file,
                "-".repeat(45usize.saturating_sub(entry.file.len()))
            ));
        }

        let bytes = code.get(entry.offset..entry.offset + entry.len).unwrap_or(&[]);
        let mut chunks = bytes.chunks(BYTES_PER_ROW);
        let first = match chunks.next() {
            Some(row) => code_cell(entry.offset, row),
            None => " ".repeat(CODE_WIDTH),
        };
        rows.push(format!("{}| {:>4}: {}", first, entry.line, entry.raw));

        for (i, row) in chunks.enumerate() {
            let at = entry.offset + (i + 1) * BYTES_PER_ROW;
            rows.push(format!("{}|", code_cell(at, row)));
        }
    }
    rows.push(format!("{}+{}", "-".repeat(CODE_WIDTH), "-".repeat(53)));
    rows
}

pub fn print_listing(entries: &[Listing], code: &[u8]) {
    for row in format_listing(entries, code) {
        println!("{row}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(line: usize, offset: usize, len: usize, raw: &str) -> Listing {
        Listing {
            file: "a.s".into(),
            line,
            offset,
            len,
            raw: raw.into(),
        }
    }

    #[test]
    fn rows_per_line_and_overflow() {
        let code: Vec<u8> = (0..11).collect();
        let entries = [
            entry(1, 0, 0, "main:"),
            entry(2, 0, 1, "  rts"),
            entry(3, 1, 10, "  dc.b 1,2,3,4,5,6,7,8,9,10"),
        ];
        let rows = format_listing(&entries, &code);
        // banner, three lines, one overflow row, footer
        assert_eq!(rows.len(), 6);
        assert!(rows[0].contains("[a.s]"));
        assert!(rows[1].ends_with("   1: main:"));
        assert!(rows[2].contains("00"));
        assert!(rows[3].contains("01 02 03 04 05 06 07 08"));
        assert!(rows[4].contains("09 0A"));
    }
}
