//! Line tokenizer for assembly source.
//!
//! Whitespace, `(`, `)`, and `,` separate tokens, so `lw t0, 8(sp)` and
//! `lw t0 8 sp` tokenize identically. A semicolon starts a comment that runs
//! to the end of the line. A colon is both a separator and a token of its
//! own; after one, positional numbering restarts at 0 so an instruction can
//! follow a label declaration on the same line.

/// One token with its positional binding on the line: 0 is the opcode,
/// 1..3 the operand slots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub pos: usize,
    pub text: String,
}

pub fn tokenize_line(line: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::with_capacity(5);
    let mut buf = String::new();
    let mut pos = 0usize;

    fn flush(buf: &mut String, pos: &mut usize, tokens: &mut Vec<Token>) {
        if buf.is_empty() {
            return;
        }
        tokens.push(Token {
            pos: *pos,
            text: std::mem::take(buf),
        });
        *pos += 1;
    }

    for ch in line.chars() {
        if ch == ';' {
            flush(&mut buf, &mut pos, &mut tokens);
            return tokens;
        }

        if ch.is_whitespace() || matches!(ch, '(' | ')' | ',' | ':') {
            if ch == ':' {
                flush(&mut buf, &mut pos, &mut tokens);
                buf.push(':');
                flush(&mut buf, &mut pos, &mut tokens);
                // An instruction may follow a label declaration; its opcode
                // must bind to position 0 again.
                pos = 0;
                continue;
            }

            flush(&mut buf, &mut pos, &mut tokens);
            continue;
        }

        buf.push(ch);
    }

    flush(&mut buf, &mut pos, &mut tokens);
    tokens
}
