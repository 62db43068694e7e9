//! PHP hook visitor using tree-sitter.
//!
//! Recognizes the WordPress hook convention:
//! - declarations: `do_action`, `do_action_ref_array`, `apply_filters`,
//!   `apply_filters_ref_array`
//! - subscriptions: `add_action`, `add_filter`
//!
//! Only literal, non-empty hook names are resolved. Any other first argument
//! (variables, concatenation, interpolation, calls) drops the call site.

use std::path::Path;

use streaming_iterator::StreamingIterator;
use tree_sitter::{Language, Node, Parser, Query, QueryCursor};

use crate::analysis::{
    FileHooks, HookKind, LanguageAnalyzer, ParsedFile, RawHook, RawListener, VisitOptions,
};

/// Priority assumed when the third subscription argument is absent or not a literal.
pub const DEFAULT_PRIORITY: i64 = 10;

/// Accepted argument count assumed when the fourth argument is absent or not a literal.
pub const DEFAULT_ACCEPTED_ARGS: i64 = 1;

const CLOSURE_CALLBACK: &str = "{closure}";
const ARROW_CALLBACK: &str = "{arrow function}";
const UNKNOWN_CALLBACK: &str = "{unknown}";

/// Functions that fire a hook.
const DECLARATION_FUNCTIONS: &[(&str, HookKind)] = &[
    ("do_action", HookKind::Action),
    ("do_action_ref_array", HookKind::Action),
    ("apply_filters", HookKind::Filter),
    ("apply_filters_ref_array", HookKind::Filter),
];

/// Functions that subscribe a callback to a hook.
const SUBSCRIPTION_FUNCTIONS: &[(&str, HookKind)] = &[
    ("add_action", HookKind::Action),
    ("add_filter", HookKind::Filter),
];

const CALL_QUERY: &str = r#"
(function_call_expression
  function: (_) @callee
  arguments: (arguments) @args
) @call
"#;

/// PHP language analyzer.
pub struct PhpAnalyzer {
    language: Language,
}

impl PhpAnalyzer {
    /// Create a new PHP analyzer.
    pub fn new() -> Self {
        Self {
            language: tree_sitter_php::LANGUAGE_PHP.into(),
        }
    }

    /// Create a new parser for this thread.
    fn create_parser(&self) -> anyhow::Result<Parser> {
        let mut parser = Parser::new();
        parser.set_language(&self.language)?;
        Ok(parser)
    }

    fn read_declaration(
        &self,
        parsed: &ParsedFile,
        call: Node,
        function: &str,
        kind: HookKind,
        arguments: &[Node],
        options: VisitOptions,
    ) -> Option<RawHook> {
        let name = hook_name(parsed, *arguments.first()?)?;

        let doc_comment = if options.include_doc_comments {
            doc_comment(parsed, call)
        } else {
            None
        };

        Some(RawHook {
            name,
            kind,
            line: call.start_position().row + 1,
            function_call: function.to_string(),
            doc_comment,
        })
    }

    fn read_listener(
        &self,
        parsed: &ParsedFile,
        call: Node,
        kind: HookKind,
        arguments: &[Node],
    ) -> Option<RawListener> {
        if arguments.len() < 2 {
            return None;
        }
        let hook_name = hook_name(parsed, arguments[0])?;

        let priority = arguments
            .get(2)
            .and_then(|node| integer_argument(parsed, *node))
            .unwrap_or(DEFAULT_PRIORITY);
        let accepted_args = arguments
            .get(3)
            .and_then(|node| integer_argument(parsed, *node))
            .unwrap_or(DEFAULT_ACCEPTED_ARGS);

        Some(RawListener {
            hook_name,
            kind,
            callback: describe_callback(parsed, arguments[1]),
            priority,
            accepted_args,
            line: call.start_position().row + 1,
        })
    }
}

impl Default for PhpAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageAnalyzer for PhpAnalyzer {
    fn language_id(&self) -> &'static str {
        "php"
    }

    fn file_extensions(&self) -> &'static [&'static str] {
        &["php", "phtml", "inc"]
    }

    fn parse(&self, path: &Path, source: &[u8]) -> anyhow::Result<ParsedFile> {
        let mut parser = self.create_parser()?;
        let tree = parser
            .parse(source, None)
            .ok_or_else(|| anyhow::anyhow!("failed to parse PHP source: {}", path.display()))?;

        Ok(ParsedFile {
            tree,
            source: source.to_vec(),
        })
    }

    fn visit(&self, parsed: &ParsedFile, options: VisitOptions) -> anyhow::Result<FileHooks> {
        let query = Query::new(&self.language, CALL_QUERY)?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, parsed.tree.root_node(), &parsed.source[..]);

        let mut hooks = Vec::new();
        let mut listeners = Vec::new();

        while let Some(m) = matches.next() {
            let mut call = None;
            let mut callee = None;
            let mut args = None;

            for capture in m.captures {
                match query.capture_names()[capture.index as usize] {
                    "call" => call = Some(capture.node),
                    "callee" => callee = Some(capture.node),
                    "args" => args = Some(capture.node),
                    _ => {}
                }
            }

            let (Some(call), Some(callee), Some(args)) = (call, callee, args) else {
                continue;
            };
            let Some(function) = callee_name(parsed, callee) else {
                continue;
            };

            if let Some(kind) = lookup(DECLARATION_FUNCTIONS, function) {
                let arguments = argument_values(args);
                if let Some(hook) =
                    self.read_declaration(parsed, call, function, kind, &arguments, options)
                {
                    hooks.push((call.start_byte(), hook));
                }
            } else if let Some(kind) = lookup(SUBSCRIPTION_FUNCTIONS, function) {
                let arguments = argument_values(args);
                if let Some(listener) = self.read_listener(parsed, call, kind, &arguments) {
                    listeners.push((call.start_byte(), listener));
                }
            }
        }

        // Source order, outer calls before the calls nested in their arguments
        hooks.sort_by_key(|(offset, _)| *offset);
        listeners.sort_by_key(|(offset, _)| *offset);

        Ok(FileHooks {
            hooks: hooks.into_iter().map(|(_, h)| h).collect(),
            listeners: listeners.into_iter().map(|(_, l)| l).collect(),
        })
    }
}

fn lookup(table: &[(&str, HookKind)], function: &str) -> Option<HookKind> {
    table
        .iter()
        .find(|(name, _)| *name == function)
        .map(|(_, kind)| *kind)
}

/// Resolve the called function name. `\do_action` counts, `Ns\do_action` does not.
fn callee_name<'a>(parsed: &'a ParsedFile, callee: Node) -> Option<&'a str> {
    let text = parsed.node_text(callee);
    match callee.kind() {
        "name" => Some(text),
        "qualified_name" => text.strip_prefix('\\').filter(|rest| !rest.contains('\\')),
        _ => None,
    }
}

/// The value expression of every positional or named argument, in order.
fn argument_values(args: Node) -> Vec<Node> {
    let mut cursor = args.walk();
    let values = args
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "argument")
        .filter_map(last_named_child)
        .collect();
    values
}

fn last_named_child(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let last = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() != "comment")
        .last();
    last
}

/// A literal hook name. Empty names count as unresolved.
fn hook_name(parsed: &ParsedFile, node: Node) -> Option<String> {
    string_literal(parsed, node).filter(|name| !name.is_empty())
}

/// Decode a literal string node. Strings with interpolation are unresolved.
fn string_literal(parsed: &ParsedFile, node: Node) -> Option<String> {
    let text = parsed.node_text(node);
    let text = text
        .strip_prefix('b')
        .or_else(|| text.strip_prefix('B'))
        .unwrap_or(text);

    match node.kind() {
        "string" => {
            let body = text.strip_prefix('\'')?.strip_suffix('\'')?;
            Some(unescape_single_quoted(body))
        }
        "encapsed_string" => {
            let body = text.strip_prefix('"')?.strip_suffix('"')?;
            if has_interpolation(body) {
                return None;
            }
            Some(unescape_double_quoted(body))
        }
        "nowdoc" => doc_string_body(text),
        "heredoc" => {
            let body = doc_string_body(text)?;
            if has_interpolation(&body) {
                return None;
            }
            Some(unescape_double_quoted(&body))
        }
        _ => None,
    }
}

/// The lines between a heredoc/nowdoc opening and closing tag.
///
/// The closing tag's indentation is removed from every body line.
fn doc_string_body(text: &str) -> Option<String> {
    let (_, rest) = text.split_once('\n')?;
    let (body, closing) = match rest.rsplit_once('\n') {
        Some((body, closing)) => (Some(body), closing),
        None => (None, rest),
    };
    let Some(body) = body else {
        return Some(String::new());
    };

    let indent = &closing[..closing.len() - closing.trim_start().len()];
    let lines: Vec<&str> = body
        .split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            line.strip_prefix(indent).unwrap_or(line)
        })
        .collect();
    Some(lines.join("\n"))
}

fn unescape_single_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '\'' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

fn has_interpolation(body: &str) -> bool {
    let bytes = body.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b'$' => {
                if let Some(&next) = bytes.get(i + 1) {
                    if next == b'{' || next == b'_' || next.is_ascii_alphabetic() || next >= 0x80 {
                        return true;
                    }
                }
            }
            b'{' if bytes.get(i + 1) == Some(&b'$') => return true,
            _ => {}
        }
        i += 1;
    }
    false
}

fn unescape_double_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let chars: Vec<char> = body.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c != '\\' || i + 1 >= chars.len() {
            out.push(c);
            i += 1;
            continue;
        }

        let next = chars[i + 1];
        let simple = match next {
            'n' => Some('\n'),
            't' => Some('\t'),
            'r' => Some('\r'),
            'v' => Some('\u{0B}'),
            'e' => Some('\u{1B}'),
            'f' => Some('\u{0C}'),
            '\\' => Some('\\'),
            '$' => Some('$'),
            '"' => Some('"'),
            _ => None,
        };
        if let Some(decoded) = simple {
            out.push(decoded);
            i += 2;
            continue;
        }

        if next == 'x' {
            let digits = take_digits(&chars[i + 2..], 16, 2);
            if let Some(decoded) = decode_code_point(&digits, 16) {
                out.push(decoded);
                i += 2 + digits.len();
                continue;
            }
        } else if next.is_digit(8) {
            let digits = take_digits(&chars[i + 1..], 8, 3);
            if let Some(decoded) = decode_code_point(&digits, 8) {
                out.push(decoded);
                i += 1 + digits.len();
                continue;
            }
        } else if next == 'u' && chars.get(i + 2) == Some(&'{') {
            let digits = take_digits(&chars[i + 3..], 16, 6);
            if chars.get(i + 3 + digits.len()) == Some(&'}') {
                if let Some(decoded) = decode_code_point(&digits, 16) {
                    out.push(decoded);
                    i += 4 + digits.len();
                    continue;
                }
            }
        }

        out.push(c);
        i += 1;
    }

    out
}

fn decode_code_point(digits: &str, radix: u32) -> Option<char> {
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, radix)
        .ok()
        .and_then(char::from_u32)
}

fn take_digits(chars: &[char], radix: u32, max: usize) -> String {
    chars
        .iter()
        .take(max)
        .take_while(|c| c.is_digit(radix))
        .collect()
}

fn integer_argument(parsed: &ParsedFile, node: Node) -> Option<i64> {
    if node.kind() != "integer" {
        return None;
    }
    parse_integer_literal(parsed.node_text(node))
}

/// Parse a PHP integer literal (decimal, hex, octal, binary, `_` separators).
fn parse_integer_literal(text: &str) -> Option<i64> {
    let digits: String = text
        .chars()
        .filter(|c| *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();

    if let Some(hex) = digits.strip_prefix("0x") {
        i64::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = digits.strip_prefix("0b") {
        i64::from_str_radix(bin, 2).ok()
    } else if let Some(oct) = digits.strip_prefix("0o") {
        i64::from_str_radix(oct, 8).ok()
    } else if digits.len() > 1 && digits.starts_with('0') {
        i64::from_str_radix(&digits[1..], 8).ok()
    } else {
        digits.parse().ok()
    }
}

/// Render a callback argument for humans. Total: unknown shapes become `{unknown}`.
fn describe_callback(parsed: &ParsedFile, node: Node) -> String {
    let rendered = match node.kind() {
        "string" | "encapsed_string" => string_literal(parsed, node),
        "array_creation_expression" => array_callback(parsed, node),
        "anonymous_function" | "anonymous_function_creation_expression" => {
            Some(CLOSURE_CALLBACK.to_string())
        }
        "arrow_function" => Some(ARROW_CALLBACK.to_string()),
        _ => None,
    };
    rendered.unwrap_or_else(|| UNKNOWN_CALLBACK.to_string())
}

/// `array( $this, 'method' )` or `[ 'Class', 'method' ]` as `receiver::method`.
fn array_callback(parsed: &ParsedFile, node: Node) -> Option<String> {
    let mut cursor = node.walk();
    let elements: Vec<Node> = node
        .named_children(&mut cursor)
        .filter(|child| child.kind() == "array_element_initializer")
        .collect();
    if elements.len() < 2 {
        return None;
    }

    let receiver = last_named_child(elements[0])?;
    let method = last_named_child(elements[1])?;

    let receiver = match receiver.kind() {
        "variable_name" => Some(parsed.node_text(receiver).to_string()),
        _ => string_literal(parsed, receiver),
    }
    .filter(|r| !r.is_empty())?;
    let method = string_literal(parsed, method).filter(|m| !m.is_empty())?;

    Some(format!("{}::{}", receiver, method))
}

/// The nearest `/** */` comment before the statement that starts with `call`.
///
/// Line comments between the doc block and the statement are skipped.
fn doc_comment(parsed: &ParsedFile, call: Node) -> Option<String> {
    let mut anchor = call;
    while let Some(parent) = anchor.parent() {
        if parent.kind() == "program" || parent.start_byte() != call.start_byte() {
            break;
        }
        anchor = parent;
    }

    let mut sibling = anchor.prev_named_sibling();
    while let Some(node) = sibling {
        if node.kind() != "comment" {
            break;
        }
        let text = parsed.node_text(node);
        if text.starts_with("/**") {
            return Some(text.to_string());
        }
        sibling = node.prev_named_sibling();
    }
    None
}
