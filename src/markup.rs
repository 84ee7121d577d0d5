// File: ./src/markup.rs
// Markup tree for the calendar. Content is kept as plain strings; escaping
// happens only when the tree is serialized.
use crate::error::Result;
use crate::grid::{Cell, DayCell, Grid, WEEKDAY_LABELS};
use crate::model::DayEventEntry;
use askama::Template;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub tag: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Node>,
}

pub fn el(tag: &str) -> Element {
    Element {
        tag: tag.to_string(),
        attrs: Vec::new(),
        children: Vec::new(),
    }
}

impl Element {
    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attrs.push((key.to_string(), value.into()));
        self
    }

    pub fn class(self, value: impl Into<String>) -> Self {
        self.attr("class", value)
    }

    pub fn child(mut self, node: impl Into<Node>) -> Self {
        self.children.push(node.into());
        self
    }

    pub fn children(mut self, nodes: impl IntoIterator<Item = Node>) -> Self {
        self.children.extend(nodes);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.child(Node::Text(text.into()))
    }

    pub fn get_attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .is_some_and(|c| c.split_whitespace().any(|c| c == class))
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

/// One element; children arrive already serialized.
#[derive(Template)]
#[template(
    source = r#"<{{ tag }}{% for (key, value) in attrs %} {{ key }}="{{ value }}"{% endfor %}>{{ inner|safe }}</{{ tag }}>"#,
    ext = "html"
)]
struct ElementHtml<'a> {
    tag: &'a str,
    attrs: &'a [(String, String)],
    inner: String,
}

#[derive(Template)]
#[template(source = "{{ text }}", ext = "html")]
struct TextHtml<'a> {
    text: &'a str,
}

impl Node {
    /// Serializes the tree. Text and attribute values are HTML-escaped.
    pub fn to_html(&self) -> Result<String> {
        match self {
            Node::Text(text) => Ok(TextHtml { text }.render()?),
            Node::Element(e) => {
                let inner = e
                    .children
                    .iter()
                    .map(Node::to_html)
                    .collect::<Result<String>>()?;
                let html = ElementHtml {
                    tag: &e.tag,
                    attrs: &e.attrs,
                    inner,
                }
                .render()?;
                Ok(html)
            }
        }
    }

    /// Concatenated text of this node and its descendants.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Element(e) => e.children.iter().map(Node::text_content).collect(),
        }
    }

    /// Depth-first list of elements matching `pred`.
    pub fn find_all<'a>(&'a self, pred: &dyn Fn(&Element) -> bool) -> Vec<&'a Element> {
        let mut found = Vec::new();
        self.collect(pred, &mut found);
        found
    }

    fn collect<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, found: &mut Vec<&'a Element>) {
        if let Node::Element(e) = self {
            if pred(e) {
                found.push(e);
            }
            for child in &e.children {
                child.collect(pred, found);
            }
        }
    }
}

/// Builds the calendar markup: a header with the month name, the weekday
/// header row and one row per week.
pub fn calendar_markup(grid: &Grid) -> Node {
    let month_name = grid.meta.month_name();

    let header = el("div")
        .class("header")
        .child(el("h2").class("title").text(format!("{} Events", month_name)));

    let labels = el("tr").children(
        WEEKDAY_LABELS
            .iter()
            .map(|label| el("th").attr("scope", "col").text(*label).into()),
    );

    let rows = grid
        .weeks
        .iter()
        .map(|week| el("tr").children(week.iter().map(cell_markup)).into());

    let table = el("table")
        .class(month_name)
        .child(el("tbody").child(labels).children(rows));

    el("div")
        .class("month ecv-calendar")
        .child(header)
        .child(table)
        .into()
}

fn cell_markup(cell: &Cell) -> Node {
    let td = el("td").attr("valign", "top");
    match cell {
        Cell::OutOfMonth => td
            .class("has-no-events")
            .child(el("div").class("date"))
            .into(),
        Cell::Day(day) if !day.has_events() => td
            .class("has-no-events")
            .child(
                el("div")
                    .class("date")
                    .child(el("h3").class("number").text(day.day.to_string())),
            )
            .into(),
        Cell::Day(day) => td.class("has-events").child(day_with_events(day)).into(),
    }
}

fn day_with_events(day: &DayCell) -> Element {
    let number = el("h3")
        .class("number")
        .child(el("span").class("inner-weekday").text(day.weekday_name))
        .text(" ")
        .child(el("span").class("inner-date").text(day.day.to_string()));

    let events = match day.events.as_slice() {
        [single] => el("div")
            .class("events")
            .child(el("div").class("single").child(event_link(single))),
        many => el("ul").class("events").children(
            many.iter()
                .map(|e| el("li").class("many").child(event_link(e)).into()),
        ),
    };

    el("div").class("date").child(number).child(events)
}

fn event_link(entry: &DayEventEntry) -> Element {
    el("a")
        .attr("lang", entry.title_language.as_str())
        .attr("href", entry.url.as_str())
        .text(entry.title.as_str())
}

/// Tag -> permitted attributes. Elements outside the list are replaced by
/// their children; attributes outside it are dropped.
#[derive(Debug, Clone)]
pub struct AllowList {
    tags: HashMap<String, Vec<String>>,
}

impl AllowList {
    pub fn new() -> Self {
        Self {
            tags: HashMap::new(),
        }
    }

    pub fn allow(mut self, tag: &str, attrs: &[&str]) -> Self {
        self.tags.insert(
            tag.to_string(),
            attrs.iter().map(|a| a.to_string()).collect(),
        );
        self
    }

    /// Everything the calendar markup uses, and nothing else.
    pub fn calendar() -> Self {
        Self::new()
            .allow("a", &["href", "lang"])
            .allow("div", &["class"])
            .allow("h2", &["class"])
            .allow("h3", &["class"])
            .allow("li", &["class"])
            .allow("span", &["class"])
            .allow("table", &["class"])
            .allow("tbody", &[])
            .allow("td", &["class", "valign"])
            .allow("th", &["scope"])
            .allow("tr", &[])
            .allow("ul", &["class"])
    }

    pub fn sanitize(&self, node: Node) -> Vec<Node> {
        match node {
            Node::Text(_) => vec![node],
            Node::Element(e) => {
                let children: Vec<Node> = e
                    .children
                    .into_iter()
                    .flat_map(|c| self.sanitize(c))
                    .collect();
                match self.tags.get(&e.tag) {
                    Some(allowed) => vec![Node::Element(Element {
                        attrs: e
                            .attrs
                            .into_iter()
                            .filter(|(k, _)| allowed.contains(k))
                            .collect(),
                        tag: e.tag,
                        children,
                    })],
                    None => children,
                }
            }
        }
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::new()
    }
}
