/// Turns an HTML show summary into plain text suitable for display.
pub fn clean_summary(input: &str) -> String {
    let without_tags = strip_tags(input);
    let decoded = decode_entities(&without_tags);
    normalize_whitespace(&decoded)
}

fn strip_tags(input: &str) -> String {
    // <br> and closing </p> become line breaks, every other tag is dropped.
    // A '<' followed by whitespace or never closed is plain text.
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '<' || chars.peek().map_or(true, |c| c.is_whitespace()) {
            out.push(ch);
            continue;
        }
        let mut tag = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == '>' {
                closed = true;
                break;
            }
            tag.push(c);
        }
        if !closed {
            out.push('<');
            out.push_str(&tag);
            continue;
        }
        let tag = tag.trim();
        let closing = tag.starts_with('/');
        let name = tag
            .trim_start_matches('/')
            .split(|c: char| c.is_whitespace() || c == '/')
            .next()
            .unwrap_or_default();
        if name.eq_ignore_ascii_case("br") || (closing && name.eq_ignore_ascii_case("p")) {
            out.push('\n');
        }
    }
    out
}

fn decode_entities(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '&' {
            out.push(ch);
            continue;
        }
        let mut entity = String::new();
        let mut terminated = false;
        while let Some(&c) = chars.peek() {
            if c == ';' {
                chars.next();
                terminated = true;
                break;
            }
            if !(c.is_ascii_alphanumeric() || c == '#') || entity.len() > 10 {
                break;
            }
            chars.next();
            entity.push(c);
        }
        let decoded = if terminated {
            match entity.as_str() {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "nbsp" => Some(' '),
                _ if entity.starts_with("#x") || entity.starts_with("#X") => {
                    u32::from_str_radix(&entity[2..], 16)
                        .ok()
                        .and_then(char::from_u32)
                }
                _ if entity.starts_with('#') => {
                    entity[1..].parse::<u32>().ok().and_then(char::from_u32)
                }
                _ => None,
            }
        } else {
            None
        };
        match decoded {
            Some(c) => out.push(c),
            None => {
                out.push('&');
                out.push_str(&entity);
                if terminated {
                    out.push(';');
                }
            }
        }
    }
    out
}

fn normalize_whitespace(input: &str) -> String {
    // Collapses runs of spaces inside a line and keeps at most one blank line.
    let input = input.replace("\r\n", "\n");
    let lines: Vec<String> = input
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect();

    let mut out = String::with_capacity(input.len());
    let mut blank_run = 0usize;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run == 1 && !out.is_empty() {
                out.push('\n');
            }
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        blank_run = 0;
        out.push_str(&line);
    }
    out.trim().to_string()
}
