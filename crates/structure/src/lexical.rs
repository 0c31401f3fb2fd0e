//! Pattern-based fallback parser.
//!
//! Works on raw text with regular expressions and brace counting. It cannot
//! reliably tell member functions from free functions in every case and should
//! be treated as best-effort.

use crate::ast_analyzer::normalize_void;
use crate::config::ExtractorConfig;
use crate::error::Result;
use crate::parser::{ParserKind, SourceParser};
use crate::types::{
    bounded_snippet, ClassEntity, FileInfo, FunctionEntity, MethodEntity, Parameter, Visibility,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::ops::Range;
use std::path::Path;

pub(crate) static INCLUDE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"#include\s*([<"])([^>"]+)[>"]"#).expect("include regex"));

static CLASS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(class|struct)\s+(?:[A-Za-z_]\w*\s+)*?([A-Za-z_]\w*)\s*(?:final\s*)?(?::\s*([^{;()]+))?\{")
        .expect("class regex")
});

static FUNCTION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*([A-Za-z_][^;{}()#=\n]*?)\s*\(([^()]*)\)\s*(?:const\s*)?(?:noexcept\s*)?\{",
    )
    .expect("function regex")
});

static ACCESS_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(public|protected|private)\s*:").expect("access regex"));

static TRAILING_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(~?[A-Za-z_]\w*)\s*$").expect("name regex"));

const MODIFIERS: &[&str] = &["virtual", "static", "inline", "explicit", "constexpr", "extern"];

const NOT_FUNCTION_NAMES: &[&str] = &[
    "if", "for", "while", "switch", "catch", "return", "sizeof", "decltype", "alignof",
    "static_assert", "defined",
];

/// Regex/brace-counting parser used when the grammar is unavailable or fails
pub struct LexicalParser {
    class_snippet_chars: usize,
    function_snippet_chars: usize,
}

impl LexicalParser {
    pub fn new(config: &ExtractorConfig) -> Self {
        Self {
            class_snippet_chars: config.class_snippet_chars,
            function_snippet_chars: config.function_snippet_chars,
        }
    }

    fn parse_classes(&self, content: &str, code: &str) -> (Vec<ClassEntity>, Vec<Range<usize>>) {
        let mut classes = Vec::new();
        let mut bodies = Vec::new();

        for caps in CLASS_RE.captures_iter(code) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if code[..whole.start()].trim_end().ends_with("enum") {
                continue;
            }
            // Nested types inside an already-seen body are skipped
            if bodies.iter().any(|body: &Range<usize>| body.contains(&whole.start())) {
                continue;
            }

            let open = whole.end() - 1;
            let Some(close) = matching_brace(code, open) else {
                continue;
            };
            let keyword = &caps[1];
            let name = caps[2].to_string();
            let base_classes = caps
                .get(3)
                .map(|m| parse_base_list(m.as_str()))
                .unwrap_or_default();

            let default_visibility = if keyword == "struct" {
                Visibility::Public
            } else {
                Visibility::Private
            };
            let body = flatten_nested_blocks(&code[open + 1..close]);
            let methods = parse_members(&body, default_visibility);

            classes.push(ClassEntity {
                name,
                methods,
                base_classes,
                snippet: bounded_snippet(&content[whole.start()..=close], self.class_snippet_chars),
            });
            bodies.push(open..close + 1);
        }

        (classes, bodies)
    }

    fn parse_functions(&self, content: &str, code: &str, bodies: &[Range<usize>]) -> Vec<FunctionEntity> {
        let mut functions = Vec::new();

        for caps in FUNCTION_RE.captures_iter(code) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            if bodies.iter().any(|body| body.contains(&whole.start())) {
                continue;
            }

            let head = caps[1].trim();
            let Some((return_type, name, _)) = split_head(head) else {
                continue;
            };
            if return_type.is_empty() || NOT_FUNCTION_NAMES.contains(&name.as_str()) {
                continue;
            }
            // `Type::method(...) {` is an out-of-line member definition
            if head[..head.len() - name.len()].trim_end().ends_with("::") {
                continue;
            }

            functions.push(FunctionEntity {
                name,
                return_type,
                parameters: parse_parameters(&caps[2]),
                snippet: bounded_snippet(&content[whole.start()..], self.function_snippet_chars),
            });
        }

        functions
    }
}

impl SourceParser for LexicalParser {
    fn kind(&self) -> ParserKind {
        ParserKind::Lexical
    }

    fn parse(&self, path: &Path, content: &str) -> Result<FileInfo> {
        let code = blank_comments(content);
        let mut info = FileInfo::new(path);

        info.includes = INCLUDE_RE
            .captures_iter(content)
            .map(|caps| caps[2].trim().to_string())
            .collect();

        let (classes, bodies) = self.parse_classes(content, &code);
        info.functions = self.parse_functions(content, &code, &bodies);
        info.classes = classes;

        Ok(info)
    }
}

/// Split a class body (nested blocks already flattened) into member functions
fn parse_members(body: &str, default_visibility: Visibility) -> Vec<MethodEntity> {
    let mut visibility = default_visibility;
    let mut methods = Vec::new();

    for raw in body.split(';') {
        let mut statement = raw;
        while let Some(label) = ACCESS_LABEL_RE.captures(statement) {
            if let Some(v) = Visibility::from_label(&label[1]) {
                visibility = v;
            }
            let end = label.get(0).map_or(statement.len(), |m| m.end());
            statement = &statement[end..];
        }

        let statement = statement.trim();
        if statement.is_empty()
            || statement.starts_with("friend")
            || statement.starts_with("typedef")
            || statement.starts_with("using")
            || statement.starts_with('#')
        {
            continue;
        }

        let Some(open) = statement.find('(') else {
            continue;
        };
        if statement[open + 1..].trim_start().starts_with('*') {
            // function pointer member
            continue;
        }
        let Some(close) = matching_paren(statement, open) else {
            continue;
        };

        let head = statement[..open].trim();
        let Some((return_type, name, flags)) = split_head(head) else {
            continue;
        };
        let tail = statement[close + 1..].trim_start();

        methods.push(MethodEntity {
            name,
            return_type,
            parameters: parse_parameters(&statement[open + 1..close]),
            visibility,
            is_const: tail.starts_with("const"),
            is_static: flags.is_static,
            is_virtual: flags.is_virtual,
        });
    }

    methods
}

#[derive(Default)]
struct HeadFlags {
    is_static: bool,
    is_virtual: bool,
}

/// Split `static inline std::string name` into return type, name and modifier flags
fn split_head(head: &str) -> Option<(String, String, HeadFlags)> {
    let caps = TRAILING_NAME_RE.captures(head)?;
    let name_match = caps.get(1)?;
    let name = name_match.as_str().to_string();

    let mut flags = HeadFlags::default();
    let mut words: Vec<&str> = head[..name_match.start()].split_whitespace().collect();
    while let Some(first) = words.first() {
        if !MODIFIERS.contains(first) {
            break;
        }
        match *first {
            "static" => flags.is_static = true,
            "virtual" => flags.is_virtual = true,
            _ => {}
        }
        words.remove(0);
    }

    Some((join_type(&words), name, flags))
}

/// Join type tokens, keeping `*`/`&` attached to the preceding token
fn join_type(words: &[&str]) -> String {
    let mut out = String::new();
    for word in words {
        if !out.is_empty() && !word.starts_with(['*', '&']) {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

fn parse_parameters(raw: &str) -> Vec<Parameter> {
    let params = split_top_level_commas(raw)
        .into_iter()
        .filter_map(|param| {
            let param = param.split('=').next().unwrap_or_default().trim();
            if param.is_empty() {
                return None;
            }
            if param == "..." {
                return Some(Parameter::new("...", ""));
            }
            match TRAILING_NAME_RE.captures(param).and_then(|caps| caps.get(1)) {
                Some(name) => {
                    let ty = param[..name.start()].trim();
                    if ty.is_empty() || ty == "const" || ty == "unsigned" || ty == "signed" {
                        Some(Parameter::new(param, ""))
                    } else {
                        Some(Parameter::new(ty, name.as_str()))
                    }
                }
                None => Some(Parameter::new(param, "")),
            }
        })
        .collect();
    normalize_void(params)
}

fn split_top_level_commas(raw: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in raw.char_indices() {
        match ch {
            '<' | '(' | '[' => depth += 1,
            '>' | ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&raw[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&raw[start..]);
    parts
}

fn parse_base_list(raw: &str) -> Vec<String> {
    split_top_level_commas(raw)
        .into_iter()
        .filter_map(|base| {
            let words: Vec<&str> = base
                .split_whitespace()
                .filter(|w| !matches!(*w, "public" | "protected" | "private" | "virtual"))
                .collect();
            let name = words.join(" ");
            (!name.is_empty()).then_some(name)
        })
        .collect()
}

/// Index of the `}` closing the `{` at `open`
fn matching_brace(code: &str, open: usize) -> Option<usize> {
    matching(code, open, b'{', b'}')
}

fn matching_paren(code: &str, open: usize) -> Option<usize> {
    matching(code, open, b'(', b')')
}

fn matching(code: &str, open: usize, opener: u8, closer: u8) -> Option<usize> {
    let bytes = code.as_bytes();
    let mut depth = 0usize;
    for (idx, &byte) in bytes.iter().enumerate().skip(open) {
        if byte == opener {
            depth += 1;
        } else if byte == closer {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(idx);
            }
        }
    }
    None
}

/// Replace every `{ ... }` block inside a class body by a statement terminator
fn flatten_nested_blocks(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut depth = 0usize;
    for ch in body.chars() {
        match ch {
            '{' => {
                if depth == 0 {
                    out.push(';');
                }
                depth += 1;
            }
            '}' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Blank out comments and string/char literals, preserving byte offsets
fn blank_comments(content: &str) -> String {
    #[derive(PartialEq)]
    enum State {
        Code,
        Line,
        Block,
        Str(u8),
    }

    let bytes = content.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut state = State::Code;
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        let next = bytes.get(i + 1).copied();
        match state {
            State::Code => match (b, next) {
                (b'/', Some(b'/')) => {
                    state = State::Line;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'/', Some(b'*')) => {
                    state = State::Block;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                (b'"' | b'\'', _) => {
                    state = State::Str(b);
                    out.push(b);
                }
                _ => out.push(b),
            },
            State::Line => {
                if b == b'\n' {
                    state = State::Code;
                    out.push(b'\n');
                } else {
                    out.push(b' ');
                }
            }
            State::Block => {
                if b == b'*' && next == Some(b'/') {
                    state = State::Code;
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                out.push(if b == b'\n' { b'\n' } else { b' ' });
            }
            State::Str(quote) => {
                if b == b'\\' && next.is_some() {
                    out.extend_from_slice(b"  ");
                    i += 2;
                    continue;
                }
                if b == quote {
                    state = State::Code;
                    out.push(b);
                } else if b == b'\n' {
                    // unterminated literal; resync at end of line
                    state = State::Code;
                    out.push(b'\n');
                } else {
                    out.push(b' ');
                }
            }
        }
        i += 1;
    }

    // Only ASCII bytes were substituted, and whole multi-byte sequences were replaced
    String::from_utf8(out).unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
}
