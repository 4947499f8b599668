// crates/shp-pivot-core/src/text.rs

use deunicode::deunicode;

/// Accent-insensitive, case-insensitive search key.
///
/// "Zürich " → "zurich", "ŁÓDŹ" → "lodz".
pub fn fold_key(s: &str) -> String {
    deunicode(s.trim()).to_lowercase()
}

/// Integer with `,` thousands separators: `1200` → `"1,200"`.
pub fn group_thousands(n: usize) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
