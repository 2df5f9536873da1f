//! Reading serialized documents back into queues.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use command::{Command, CommandQueue, KindRegistry, StyleArgs, SymbolTable, UseArgs};
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::MAIN;

/// A problem with one entry. The entry is left out and parsing goes on.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    UnhandledCommand {
        group: String,
        index: usize,
        kind: String,
        reason: String,
    },
    UnknownGroup {
        group: String,
        index: usize,
        name: String,
    },
    CyclicUse {
        group: String,
        index: usize,
        name: String,
    },
    MalformedGroup {
        group: String,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnhandledCommand {
                group,
                index,
                kind,
                reason,
            } => write!(f, "{}[{}]: unhandled command {:?}: {}", group, index, kind, reason),
            Diagnostic::UnknownGroup { group, index, name } => {
                write!(f, "{}[{}]: use of unknown group {:?}", group, index, name)
            }
            Diagnostic::CyclicUse { group, index, name } => {
                write!(f, "{}[{}]: use of {:?} forms a cycle", group, index, name)
            }
            Diagnostic::MalformedGroup { group } => {
                write!(f, "{}: group is not a list of commands", group)
            }
        }
    }
}

#[derive(Debug)]
pub enum ParseError {
    Json(serde_json::Error),
    NotADocument,
    MissingMain,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Json(err) => write!(f, "Parse error: {}", err),
            ParseError::NotADocument => write!(f, "Invalid structure: expected a map of groups"),
            ParseError::MissingMain => write!(f, "Missing field: {}", MAIN),
        }
    }
}

impl std::error::Error for ParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParseError::Json(err) => Some(err),
            _ => None,
        }
    }
}

/// Result of a parse: the entry queue, every named group, and what had
/// to be skipped.
#[derive(Debug)]
pub struct Parsed {
    pub main: CommandQueue,
    pub groups: BTreeMap<String, Rc<CommandQueue>>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Parsed {
    pub fn group(&self, name: &str) -> Option<&Rc<CommandQueue>> {
        self.groups.get(name)
    }
}

/// Parses a document. Fails only when the input is not a map of groups
/// with a `main` entry; problems inside groups become diagnostics.
///
/// `use` targets resolve to groups of the same document first, then to
/// queues in `symbols`. Unknown kinds are built through `kinds`.
pub fn parse(json: &str, kinds: &KindRegistry, symbols: &SymbolTable) -> Result<Parsed, ParseError> {
    let value: Value = serde_json::from_str(json).map_err(ParseError::Json)?;
    let Value::Object(raw) = value else {
        return Err(ParseError::NotADocument);
    };
    if !raw.contains_key(MAIN) {
        return Err(ParseError::MissingMain);
    }

    let mut parser = Parser {
        raw: &raw,
        kinds,
        symbols,
        built: BTreeMap::new(),
        visiting: Vec::new(),
        diagnostics: Vec::new(),
    };
    let main = parser.queue(MAIN);
    // Groups that use `main` share this build instead of making another.
    parser.built.insert(MAIN.to_string(), Rc::new(main.clone()));
    for name in raw.keys() {
        parser.group(name);
    }
    parser.built.remove(MAIN);

    for diagnostic in &parser.diagnostics {
        warn!("parse: {}", diagnostic);
    }
    Ok(Parsed {
        main,
        groups: parser.built,
        diagnostics: parser.diagnostics,
    })
}

struct Parser<'a> {
    raw: &'a Map<String, Value>,
    kinds: &'a KindRegistry,
    symbols: &'a SymbolTable,
    built: BTreeMap<String, Rc<CommandQueue>>,
    visiting: Vec<String>,
    diagnostics: Vec<Diagnostic>,
}

fn args<T: DeserializeOwned>(value: Value) -> Result<T, String> {
    serde_json::from_value(value).map_err(|err| err.to_string())
}

impl Parser<'_> {
    /// The named group, built once.
    fn group(&mut self, name: &str) -> Option<Rc<CommandQueue>> {
        if let Some(queue) = self.built.get(name) {
            return Some(Rc::clone(queue));
        }
        if !self.raw.contains_key(name) {
            return None;
        }
        let queue = Rc::new(self.queue(name));
        self.built.insert(name.to_string(), Rc::clone(&queue));
        Some(queue)
    }

    fn queue(&mut self, name: &str) -> CommandQueue {
        let raw = self.raw;
        let mut queue = CommandQueue::new();
        let Some(Value::Array(entries)) = raw.get(name) else {
            self.diagnostics.push(Diagnostic::MalformedGroup {
                group: name.to_string(),
            });
            return queue;
        };

        self.visiting.push(name.to_string());
        for (index, entry) in entries.iter().enumerate() {
            let Some(command) = self.command(name, index, entry) else {
                continue;
            };
            let kind = command.kind().to_string();
            if !queue.try_append(command) {
                self.unhandled(name, index, &kind, "end without matching begin");
            }
        }
        self.visiting.pop();
        queue
    }

    fn unhandled(&mut self, group: &str, index: usize, kind: &str, reason: impl Into<String>) {
        self.diagnostics.push(Diagnostic::UnhandledCommand {
            group: group.to_string(),
            index,
            kind: kind.to_string(),
            reason: reason.into(),
        });
    }

    fn command(&mut self, group: &str, index: usize, entry: &Value) -> Option<Command> {
        let Some(kind) = entry.get("c").and_then(Value::as_str) else {
            self.unhandled(group, index, "", "entry has no kind");
            return None;
        };
        let value = entry
            .get("a")
            .filter(|a| !a.is_null())
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));

        let command = match kind {
            "clear" => Ok(Command::Clear),
            "view" => args(value).map(Command::View),
            "begin" => args(value).map(Command::BeginGroup),
            "end" => Ok(Command::EndGroup),
            "style" => args(value).map(Command::Style),
            "circle" => args(value).map(Command::Circle),
            "ellipse" => args(value).map(Command::Ellipse),
            "arc" => args(value).map(Command::Arc),
            "rect" => args(value).map(Command::Rect),
            "line" => args(value).map(Command::Line),
            "polyline" => args(value).map(Command::Polyline),
            "spline" => args(value).map(Command::Spline),
            "text" => args(value).map(Command::Text),
            "image" => args(value).map(Command::Image),
            "moveto" => args(value).map(Command::MoveTo),
            "lineto" => args(value).map(Command::LineTo),
            "curveto" => args(value).map(Command::CurveTo),
            "arcto" => args(value).map(Command::ArcTo),
            "closepath" => Ok(Command::ClosePath),
            "stroke" => args(value).map(Command::Stroke),
            "fill" => args(value).map(Command::Fill),
            "use" => return self.use_command(group, index, &value),
            custom if self.kinds.contains(custom) => self
                .kinds
                .construct(custom, &value)
                .map(Command::Custom)
                .ok_or_else(|| "arguments rejected".to_string()),
            _ => Err("unknown kind".to_string()),
        };
        match command {
            Ok(command) => Some(command),
            Err(reason) => {
                self.unhandled(group, index, kind, reason);
                None
            }
        }
    }

    fn use_command(&mut self, group: &str, index: usize, value: &Value) -> Option<Command> {
        let Some(name) = value.get("grp").and_then(Value::as_str) else {
            self.unhandled(group, index, "use", "missing grp");
            return None;
        };
        if self.visiting.iter().any(|visiting| visiting == name) {
            self.diagnostics.push(Diagnostic::CyclicUse {
                group: group.to_string(),
                index,
                name: name.to_string(),
            });
            return None;
        }
        let Some(queue) = self.group(name).or_else(|| self.symbols.queue(name)) else {
            self.diagnostics.push(Diagnostic::UnknownGroup {
                group: group.to_string(),
                index,
                name: name.to_string(),
            });
            return None;
        };
        let style = match value.get("style") {
            Some(style) => match args::<StyleArgs>(style.clone()) {
                Ok(style) => style,
                Err(reason) => {
                    self.unhandled(group, index, "use", reason);
                    return None;
                }
            },
            None => StyleArgs::new(),
        };
        Some(Command::Use(UseArgs::named(name, queue).with_style(style)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_str(json: &str) -> Parsed {
        parse(json, &KindRegistry::new(), &SymbolTable::new()).unwrap()
    }

    #[test]
    fn test_rejects_non_documents() {
        let kinds = KindRegistry::new();
        let symbols = SymbolTable::new();
        assert!(matches!(parse("[1, 2", &kinds, &symbols), Err(ParseError::Json(_))));
        assert!(matches!(parse("[]", &kinds, &symbols), Err(ParseError::NotADocument)));
        assert!(matches!(parse("{}", &kinds, &symbols), Err(ParseError::MissingMain)));
    }

    #[test]
    fn test_bad_entries_are_skipped_not_fatal() {
        let parsed = parse_str(
            r#"{"main": [
                {"c": "circle", "a": {"x": 1, "y": 2, "r": 3}},
                {"c": "hexagon", "a": {}},
                {"c": "circle", "a": {"r": "big"}},
                {"c": "end"},
                {"c": "line", "a": {"x1": 0, "y1": 0, "x2": 1, "y2": 1}}
            ]}"#,
        );
        let kinds: Vec<&str> = parsed.main.iter().map(Command::kind).collect();
        assert_eq!(kinds, ["circle", "line"]);
        assert_eq!(parsed.diagnostics.len(), 3);
        assert!(matches!(
            &parsed.diagnostics[0],
            Diagnostic::UnhandledCommand { index: 1, kind, .. } if kind == "hexagon"
        ));
    }

    #[test]
    fn test_cycles_are_reported() {
        let parsed = parse_str(
            r#"{
                "main": [{"c": "use", "a": {"grp": "a"}}],
                "a": [{"c": "use", "a": {"grp": "b"}}],
                "b": [{"c": "use", "a": {"grp": "a"}}, {"c": "closepath"}]
            }"#,
        );
        assert_eq!(parsed.main.len(), 1);
        assert_eq!(
            parsed.diagnostics,
            [Diagnostic::CyclicUse {
                group: "b".into(),
                index: 0,
                name: "a".into()
            }]
        );
        assert_eq!(parsed.group("b").map(|q| q.len()), Some(1));
    }

    #[test]
    fn test_main_is_built_once() {
        let parsed = parse_str(
            r#"{
                "main": [{"c": "circle", "a": {"r": 1}}],
                "extra": [{"c": "use", "a": {"grp": "main"}}]
            }"#,
        );
        assert!(parsed.diagnostics.is_empty());
        assert!(parsed.group(MAIN).is_none());
        let extra = parsed.group("extra").unwrap();
        match extra.get(0) {
            Some(Command::Use(args)) => assert_eq!(args.queue.id(), parsed.main.id()),
            other => panic!("expected a use, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_group_falls_back_to_symbols() {
        let symbols = SymbolTable::new();
        symbols.define_queue("shared", CommandQueue::new());
        let parsed = parse(
            r#"{"main": [{"c": "use", "a": {"grp": "shared"}}, {"c": "use", "a": {"grp": "nope"}}]}"#,
            &KindRegistry::new(),
            &symbols,
        )
        .unwrap();
        assert_eq!(parsed.main.len(), 1);
        assert!(matches!(
            &parsed.diagnostics[..],
            [Diagnostic::UnknownGroup { name, .. }] if name == "nope"
        ));
    }
}
