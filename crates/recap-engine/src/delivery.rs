/// Split `text` into pieces of at most `max_chars` characters.
///
/// Pieces are cut on char boundaries and rejoin to `text`. Empty text gives
/// no pieces; `max_chars == 0` is treated as 1.
pub fn split_for_delivery(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut pieces = Vec::new();
    let mut current = String::new();
    let mut count = 0;

    for c in text.chars() {
        if count == max_chars {
            pieces.push(std::mem::take(&mut current));
            count = 0;
        }
        current.push(c);
        count += 1;
    }
    if !current.is_empty() {
        pieces.push(current);
    }
    pieces
}
