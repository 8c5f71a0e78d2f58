/// Split a delimited field value on `,` or `;`, ignoring delimiters inside
/// parentheses or quotes. Tokens are trimmed, empty tokens dropped, and a pair of
/// surrounding quotes is stripped.
///
/// `"KfW Development Bank (KfW, Germany); 'GIZ'"` → `["KfW Development Bank (KfW, Germany)", "GIZ"]`
pub fn split_respecting_parentheses(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in text.chars() {
        match (ch, quote) {
            ('"' | '\'', None) if current.trim().is_empty() => {
                quote = Some(ch);
                current.push(ch);
            }
            (c, Some(q)) if c == q => {
                quote = None;
                current.push(ch);
            }
            ('(', None) => {
                depth += 1;
                current.push(ch);
            }
            (')', None) => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            (',' | ';', None) if depth == 0 => {
                push_token(&mut tokens, &current);
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    push_token(&mut tokens, &current);
    tokens
}

fn push_token(tokens: &mut Vec<String>, raw: &str) {
    let mut token = raw.trim();
    for q in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(q) && token.ends_with(q) {
            token = token[1..token.len() - 1].trim();
            break;
        }
    }
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
}
