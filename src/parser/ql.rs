//! `.ql` source parser: a line-by-line state machine over `/** ... */` doc
//! comments and the declarations that follow them.
//!
//! Recognized declarations:
//!
//! - `entity Name {` opens an entity; declarations in its body become
//!   contained items until the matching `}`.
//! - `[native] [static] fun name(a, b) [on Type]`
//! - `Name(a, b)` inside an entity body, where `Name` is the entity
//! - `type name [= value]` fields, only when documented
//!
//! Doc comment tags: `@param name`, `@returns`, `@on`, `@errors`, `@type`.
//! A tag's text may start with `[@type T]` or `[@java a.b.C]` to give its
//! type. Inline references `[@param x]`, `[@type T]` and `[@java a.b.C]` may
//! appear anywhere in descriptions.

use crate::model::*;
use regex::Regex;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_ENTITY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^entity\s+(\w+)").unwrap());

static RE_FUNCTION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((?:(?:native|static)\s+)*)fun\s+(\w+)\s*\(([^)]*)\)(?:\s+on\s+(\w+))?").unwrap()
});

static RE_CONSTRUCTOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+)\s*\(([^)]*)\)\s*$").unwrap());

static RE_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\w+(?:\[\])?)\s+(\w+)\s*(?:=.*)?$").unwrap());

static RE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@(param|returns|on|errors|type)\b\s*(.*)$").unwrap());

static RE_LEADING_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[@(type|java)\s+([^\]\s]+)\s*\]\s*(.*)$").unwrap());

static RE_INLINE_REF: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[@(param|type|java)\s+([^\]\s]+)\s*\]").unwrap());

static RE_STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""(?:[^"\\]|\\.)*""#).unwrap());

// -- Doc comments -------------------------------------------------------------

/// A parsed `/** ... */` block.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DocComment {
    pub description: Option<DocDescription>,
    pub params: Vec<ParamDoc>,
    pub returns: Option<ReturnDoc>,
    pub on: Option<DocOnLine>,
    pub errors: Option<DocErrors>,
    pub field_type: Option<DocFieldType>,
}

#[derive(Debug)]
enum Section {
    Description,
    Tag { name: String, text: String },
}

/// Parse the lines between `/**` and `*/`, with comment markers removed.
pub fn parse_doc_comment(lines: &[String]) -> DocComment {
    let mut doc = DocComment::default();
    let mut description = Vec::new();
    let mut current = Section::Description;

    for line in lines {
        if let Some(caps) = RE_TAG.captures(line) {
            finish_section(&mut doc, &mut description, current);
            current = Section::Tag {
                name: caps[1].to_string(),
                text: caps[2].to_string(),
            };
            continue;
        }
        match &mut current {
            Section::Description => description.push(line.as_str()),
            Section::Tag { text, .. } => {
                if !text.is_empty() {
                    text.push('\n');
                }
                text.push_str(line);
            }
        }
    }
    finish_section(&mut doc, &mut description, current);
    doc
}

fn finish_section(doc: &mut DocComment, description: &mut Vec<&str>, section: Section) {
    let Section::Tag { name, text } = section else {
        doc.description = parse_description(&description.join("\n"));
        description.clear();
        return;
    };

    match name.as_str() {
        "param" => {
            let text = text.trim_start();
            let (param, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
            let (field_type, rest) = leading_type(rest.trim_start());
            doc.params.push(ParamDoc {
                name: param.to_string(),
                field_type,
                description: parse_description(rest),
            });
        }
        "returns" => {
            let (field_type, rest) = leading_type(text.trim_start());
            doc.returns = Some(ReturnDoc {
                field_type,
                description: parse_description(rest),
            });
        }
        "on" => {
            let (field_type, rest) = leading_or_bare_type(text.trim_start());
            doc.on = Some(DocOnLine {
                field_type,
                description: parse_description(rest),
            });
        }
        "errors" => {
            doc.errors = Some(DocErrors {
                description: parse_description(&text),
            });
        }
        "type" => {
            let (field_type, _) = leading_or_bare_type(text.trim_start());
            doc.field_type = field_type;
        }
        _ => {}
    }
}

/// Split a `[@type T]` / `[@java a.b.C]` prefix off a tag's text.
fn leading_type(text: &str) -> (Option<DocFieldType>, &str) {
    match RE_LEADING_TYPE.captures(text) {
        Some(caps) => {
            let identifier = caps.get(2).map_or("", |m| m.as_str());
            let field_type = match &caps[1] {
                "java" => DocFieldType::host(identifier),
                _ => DocFieldType::script(identifier),
            };
            let rest = caps.get(3).map_or("", |m| m.as_str());
            (Some(field_type), rest)
        }
        None => (None, text),
    }
}

/// Like [`leading_type`], but a bare first word also names a script type.
fn leading_or_bare_type(text: &str) -> (Option<DocFieldType>, &str) {
    match leading_type(text) {
        (Some(field_type), rest) => (Some(field_type), rest),
        (None, _) => {
            let (word, rest) = text.split_once(char::is_whitespace).unwrap_or((text, ""));
            if word.is_empty() {
                (None, rest)
            } else {
                (Some(DocFieldType::script(word)), rest.trim_start())
            }
        }
    }
}

/// Split prose into text and inline references. Blank prose is `None`.
pub fn parse_description(text: &str) -> Option<DocDescription> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    let mut items = Vec::new();
    let mut last = 0;
    for caps in RE_INLINE_REF.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        if whole.start() > last {
            items.push(DescriptionItem::Text(text[last..whole.start()].to_string()));
        }
        let target = caps[2].to_string();
        items.push(match &caps[1] {
            "param" => DescriptionItem::ParamRef(target),
            "java" => DescriptionItem::HostRef(target),
            _ => DescriptionItem::TypeRef(target),
        });
        last = whole.end();
    }
    if last < text.len() {
        items.push(DescriptionItem::Text(text[last..].to_string()));
    }
    Some(DocDescription::new(items))
}

/// Strip ` * ` prefixes from a comment body line.
fn comment_line(line: &str) -> String {
    let line = line.trim();
    let line = line.strip_prefix('*').unwrap_or(line);
    line.strip_prefix(' ').unwrap_or(line).trim_end().to_string()
}

// -- Parser state -------------------------------------------------------------

struct OpenEntity {
    subject: EntityType,
    doc: DocComment,
    body_depth: usize,
    entered: bool,
    items: Vec<DocumentedItem>,
}

impl OpenEntity {
    fn close(self) -> DocumentedItem {
        DocumentedItem::new(
            DocumentedType::Entity(self.subject),
            InnerDoc::Entity(EntityDoc::new(self.doc.description, self.items)),
        )
    }
}

struct ParserState<'a> {
    library: &'a str,
    import_path: &'a str,
    items: Vec<DocumentedItem>,
    entity: Option<OpenEntity>,
    comment: Option<Vec<String>>,
    in_block_comment: bool,
    pending: Option<DocComment>,
    depth: usize,
}

impl<'a> ParserState<'a> {
    fn push(&mut self, item: DocumentedItem) {
        match &mut self.entity {
            Some(entity) => entity.items.push(item),
            None => self.items.push(item),
        }
    }

    fn declaration_depth(&self) -> usize {
        self.entity.as_ref().map_or(0, |e| e.body_depth)
    }

    fn line(&mut self, raw: &str) {
        let line = raw.trim();

        if let Some(lines) = &mut self.comment {
            match line.find("*/") {
                Some(end) => {
                    let last = comment_line(&line[..end]);
                    if !last.is_empty() {
                        lines.push(last);
                    }
                    let lines = std::mem::take(lines);
                    self.comment = None;
                    self.pending = Some(parse_doc_comment(&lines));
                }
                None => lines.push(comment_line(line)),
            }
            return;
        }
        if self.in_block_comment {
            if line.contains("*/") {
                self.in_block_comment = false;
            }
            return;
        }

        if let Some(rest) = line.strip_prefix("/**") {
            match rest.find("*/") {
                Some(end) => {
                    let body = comment_line(&rest[..end]);
                    self.pending = Some(parse_doc_comment(&[body]));
                }
                None => {
                    let first = comment_line(rest);
                    self.comment = Some(if first.is_empty() { vec![] } else { vec![first] });
                }
            }
            return;
        }
        if line.starts_with("/*") {
            self.in_block_comment = !line.contains("*/");
            return;
        }
        if line.is_empty() || line.starts_with("//") {
            return;
        }

        let doc = self.pending.take();
        if self.depth == self.declaration_depth() {
            self.declaration(line, doc);
        }

        let code = RE_STRING_LITERAL.replace_all(line, "\"\"");
        let code = code.split("//").next().unwrap_or("");
        for c in code.chars() {
            match c {
                '{' => {
                    self.depth += 1;
                    if let Some(entity) = &mut self.entity {
                        if self.depth >= entity.body_depth {
                            entity.entered = true;
                        }
                    }
                }
                '}' => self.depth = self.depth.saturating_sub(1),
                _ => {}
            }
        }

        // `entity Empty {}` opens and closes its body on one line.
        let close = self
            .entity
            .as_ref()
            .is_some_and(|entity| entity.entered && self.depth < entity.body_depth);
        if close {
            if let Some(entity) = self.entity.take() {
                self.items.push(entity.close());
            }
        }
    }

    fn declaration(&mut self, line: &str, doc: Option<DocComment>) {
        if let Some(caps) = RE_FUNCTION.captures(line) {
            let modifiers = caps.get(1).map_or("", |m| m.as_str());
            let doc = doc.unwrap_or_default();
            let in_entity = self.entity.is_some();
            let subject = FunctionType {
                library_name: self.library.to_string(),
                import_path: self.import_path.to_string(),
                name: caps[2].to_string(),
                params: split_params(&caps[3]),
                is_native: modifiers.split_whitespace().any(|m| m == "native"),
                is_static: modifiers.split_whitespace().any(|m| m == "static"),
                on_entity: match (in_entity, caps.get(4)) {
                    (false, Some(on)) => Some(on.as_str().to_string()),
                    _ => None,
                },
            };
            self.push(DocumentedItem::new(
                DocumentedType::Function(subject),
                InnerDoc::Function(FunctionDoc {
                    description: doc.description,
                    param_docs: doc.params,
                    return_doc: doc.returns,
                    on_line: doc.on,
                    errors: doc.errors,
                }),
            ));
            return;
        }

        if self.entity.is_none() {
            if let Some(caps) = RE_ENTITY.captures(line) {
                self.entity = Some(OpenEntity {
                    subject: EntityType {
                        library_name: self.library.to_string(),
                        import_path: self.import_path.to_string(),
                        name: caps[1].to_string(),
                    },
                    doc: doc.unwrap_or_default(),
                    body_depth: self.depth + 1,
                    entered: false,
                    items: Vec::new(),
                });
                return;
            }
        }

        if let Some(entity) = &self.entity {
            if let Some(caps) = RE_CONSTRUCTOR.captures(line) {
                if caps[1] == entity.subject.name {
                    let doc = doc.unwrap_or_default();
                    let subject = ConstructorType {
                        library_name: self.library.to_string(),
                        import_path: self.import_path.to_string(),
                        name: caps[1].to_string(),
                        params: split_params(&caps[2]),
                    };
                    self.push(DocumentedItem::new(
                        DocumentedType::Constructor(subject),
                        InnerDoc::Constructor(ConstructorDoc {
                            description: doc.description,
                            param_docs: doc.params,
                        }),
                    ));
                    return;
                }
            }
        }

        // Undocumented fields are most likely plain variables.
        let Some(doc) = doc else { return };
        if let Some(caps) = RE_FIELD.captures(line) {
            let subject = FieldType {
                library_name: self.library.to_string(),
                import_path: self.import_path.to_string(),
                field_type: caps[1].to_string(),
                name: caps[2].to_string(),
            };
            self.push(DocumentedItem::new(
                DocumentedType::Field(subject),
                InnerDoc::Field(FieldDoc {
                    description: doc.description,
                    field_type: doc.field_type,
                }),
            ));
        }
    }
}

fn split_params(params: &str) -> Vec<String> {
    params
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse one `.ql` file.
pub fn parse(library: &str, import_path: &str, input: &str) -> DocumentedFile {
    let mut state = ParserState {
        library,
        import_path,
        items: Vec::new(),
        entity: None,
        comment: None,
        in_block_comment: false,
        pending: None,
        depth: 0,
    };
    for line in input.lines() {
        state.line(line);
    }
    // Unterminated entity body: keep what was found.
    if let Some(entity) = state.entity.take() {
        state.items.push(entity.close());
    }

    let file_name = import_path.rsplit('/').next().unwrap_or(import_path);
    DocumentedFile {
        file_name: file_name.to_string(),
        import_path: import_path.to_string(),
        items: state.items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WIDGET: &str = r#"
/**
 * A spinning widget.
 *
 * Made of [@java java.lang.Object] parts.
 */
entity Widget {

    /**
     * Current speed.
     * @type int
     */
    int speed = 0

    /**
     * Creates a widget at rest.
     * @param speed [@type int] the initial speed
     */
    Widget(speed)

    /**
     * Spins the widget.
     *
     * @param times How many times, see [@param times]
     * @returns [@type int] the new speed
     */
    fun spin(times) {
        int x = "{ not a brace" == "}"
        if (times > 0) {
            speed = speed + times
        }
        return speed
    }
}

/** Spins every widget. */
fun spinAll(widgets) {
    // }
}

/**
 * Doubles the widget's speed.
 *
 * @on demo.Widget
 * @errors When the widget is broken
 */
native fun double() on Widget

static native fun make() on string

int counter = 5
"#;

    fn parsed() -> DocumentedFile {
        parse("demo", "widgets/widget.ql", WIDGET)
    }

    #[test]
    fn file_names_come_from_the_import_path() {
        let file = parsed();
        assert_eq!(file.file_name, "widget.ql");
        assert_eq!(file.import_path, "widgets/widget.ql");
    }

    #[test]
    fn top_level_declarations_in_order() {
        let file = parsed();
        let names: Vec<_> = file.items.iter().map(|i| i.subject().name()).collect();
        assert_eq!(names, ["Widget", "spinAll", "double", "make"]);
    }

    #[test]
    fn entity_collects_its_body() {
        let file = parsed();
        let (entity, doc) = file.items[0].as_entity().unwrap();
        assert_eq!(entity.name, "Widget");
        assert_eq!(entity.library_name, "demo");

        let kinds: Vec<_> = doc.contained_items.iter().map(|i| i.kind()).collect();
        assert_eq!(kinds, [ItemKind::Field, ItemKind::Constructor, ItemKind::Function]);

        let description = doc.description.as_ref().unwrap();
        assert_eq!(
            description.items,
            [
                DescriptionItem::Text("A spinning widget.\n\nMade of ".to_string()),
                DescriptionItem::HostRef("java.lang.Object".to_string()),
                DescriptionItem::Text(" parts.".to_string()),
            ]
        );
    }

    #[test]
    fn field_and_constructor_docs() {
        let file = parsed();
        let (_, doc) = file.items[0].as_entity().unwrap();

        let InnerDoc::Field(field) = doc.contained_items[0].doc() else {
            panic!("expected a field doc");
        };
        assert_eq!(field.field_type, Some(DocFieldType::script("int")));

        let DocumentedType::Constructor(constructor) = doc.contained_items[1].subject() else {
            panic!("expected a constructor");
        };
        assert_eq!(constructor.params, ["speed"]);
        let InnerDoc::Constructor(constructor_doc) = doc.contained_items[1].doc() else {
            panic!("expected a constructor doc");
        };
        assert_eq!(constructor_doc.param_docs[0].field_type, Some(DocFieldType::script("int")));
    }

    #[test]
    fn entity_functions_have_no_target() {
        let file = parsed();
        let (_, doc) = file.items[0].as_entity().unwrap();
        let (spin, spin_doc) = doc.contained_items[2].as_function().unwrap();
        assert_eq!(spin.name, "spin");
        assert_eq!(spin.on_entity, None);
        assert_eq!(
            spin_doc.return_doc.as_ref().unwrap().field_type,
            Some(DocFieldType::script("int"))
        );
        assert_eq!(
            spin_doc.param_docs[0].description.as_ref().unwrap().items.last(),
            Some(&DescriptionItem::ParamRef("times".to_string()))
        );
    }

    #[test]
    fn extension_functions_carry_target_and_on_line() {
        let file = parsed();
        let (double, doc) = file.items[2].as_function().unwrap();
        assert!(double.is_native);
        assert!(!double.is_static);
        assert_eq!(double.on_entity.as_deref(), Some("Widget"));
        assert_eq!(
            doc.on_line.as_ref().unwrap().field_type,
            Some(DocFieldType::script("demo.Widget"))
        );
        assert_eq!(
            doc.errors.as_ref().unwrap().description,
            Some(DocDescription::text("When the widget is broken"))
        );
        assert!(doc.return_doc.is_none());

        let (make, make_doc) = file.items[3].as_function().unwrap();
        assert!(make.is_native && make.is_static);
        assert_eq!(make.target(), Some("string"));
        assert_eq!(make_doc, &FunctionDoc::default());
    }

    #[test]
    fn one_line_entity_does_not_swallow_later_declarations() {
        let source = r#"
/** Marker. */
entity Empty {}

/** Shouts the text. */
fun shout() on string {
    return "!"
}

fun free() {}
"#;
        let file = parse("demo", "empty.ql", source);
        let names: Vec<_> = file
            .items
            .iter()
            .map(|i| (i.kind(), i.subject().name()))
            .collect();
        assert_eq!(
            names,
            [
                (ItemKind::Entity, "Empty"),
                (ItemKind::Function, "shout"),
                (ItemKind::Function, "free"),
            ]
        );

        let (_, doc) = file.items[0].as_entity().unwrap();
        assert!(doc.contained_items.is_empty());
        let (shout, _) = file.items[1].as_function().unwrap();
        assert_eq!(shout.target(), Some("string"));
    }

    #[test]
    fn single_line_doc_comment() {
        let file = parsed();
        let (_, doc) = file.items[1].as_function().unwrap();
        assert_eq!(doc.description, Some(DocDescription::text("Spins every widget.")));
    }

    #[test]
    fn description_references() {
        let description = parse_description("Takes [@param x] as [@type std.int]").unwrap();
        assert_eq!(
            description.items,
            [
                DescriptionItem::Text("Takes ".to_string()),
                DescriptionItem::ParamRef("x".to_string()),
                DescriptionItem::Text(" as ".to_string()),
                DescriptionItem::TypeRef("std.int".to_string()),
            ]
        );
        assert_eq!(parse_description("   \n "), None);
    }
}
