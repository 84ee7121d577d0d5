use evcal::Calendar;
use evcal::markup::{AllowList, Element, Node, el};
use evcal::model::{CalendarRequest, EventRecord};

fn event(id: &str, title: &str, start: &str, lang: &str) -> EventRecord {
    EventRecord {
        url: format!("https://example.org/events/{}", id),
        title_language: lang.to_string(),
        ..EventRecord::new(id, title, start)
    }
}

fn february() -> Calendar {
    Calendar::from_events(
        CalendarRequest::new(2, 2024).unwrap(),
        &[
            event("a", "Board meeting", "2024-02-05 10:00:00", "en"),
            event("b", "Kaffeeklatsch", "2024-02-12 15:00:00", "de"),
            event("c", "Apéro", "2024-02-12 18:00:00", "fr"),
        ],
    )
}

fn td_cells(root: &Node) -> Vec<&Element> {
    root.find_all(&|e: &Element| e.tag == "td")
}

#[test]
fn test_calendar_structure() {
    let root = february().markup();
    let Node::Element(wrapper) = &root else {
        panic!("wrapper should be an element");
    };
    assert!(wrapper.has_class("month"));
    assert!(wrapper.has_class("ecv-calendar"));

    let titles = root.find_all(&|e: &Element| e.tag == "h2" && e.has_class("title"));
    assert_eq!(titles.len(), 1);
    assert_eq!(Node::from(titles[0].clone()).text_content(), "February Events");

    let tables = root.find_all(&|e: &Element| e.tag == "table");
    assert_eq!(tables.len(), 1);
    assert!(tables[0].has_class("February"));

    let headers = root.find_all(&|e: &Element| e.tag == "th");
    assert_eq!(headers.len(), 7);
    assert!(headers.iter().all(|th| th.get_attr("scope") == Some("col")));

    // Label row plus five weeks
    assert_eq!(root.find_all(&|e: &Element| e.tag == "tr").len(), 6);
    assert_eq!(td_cells(&root).len(), 35);
}

#[test]
fn test_cell_classes() {
    let root = february().markup();
    let cells = td_cells(&root);

    let with_events = cells.iter().filter(|td| td.has_class("has-events")).count();
    let without = cells.iter().filter(|td| td.has_class("has-no-events")).count();
    assert_eq!(with_events, 2);
    assert_eq!(without, 33);

    let numbers = root.find_all(&|e: &Element| e.tag == "h3" && e.has_class("number"));
    assert_eq!(numbers.len(), 29);

    let weekdays = root.find_all(&|e: &Element| e.has_class("inner-weekday"));
    let weekday_text: Vec<String> = weekdays
        .iter()
        .map(|e| Node::from((*e).clone()).text_content())
        .collect();
    assert_eq!(weekday_text, vec!["Monday", "Monday"]);
}

#[test]
fn test_single_and_many_event_lists() {
    let root = february().markup();

    let singles = root.find_all(&|e: &Element| e.tag == "div" && e.has_class("single"));
    assert_eq!(singles.len(), 1);

    let many = root.find_all(&|e: &Element| e.tag == "li" && e.has_class("many"));
    assert_eq!(many.len(), 2);

    let links = root.find_all(&|e: &Element| e.tag == "a");
    assert_eq!(links.len(), 3);
    for link in &links {
        assert!(link.get_attr("href").is_some_and(|h| h.starts_with("https://")));
        assert!(link.get_attr("lang").is_some());
    }
    assert_eq!(links[1].get_attr("lang"), Some("de"));
    assert_eq!(Node::from(links[2].clone()).text_content(), "Apéro");
}

#[test]
fn test_titles_are_plain_text_until_serialized() {
    let calendar = Calendar::from_events(
        CalendarRequest::new(2, 2024).unwrap(),
        &[event("x", "<script>alert('x')</script> & more", "2024-02-01", "")],
    );

    let root = calendar.markup();
    let links = root.find_all(&|e: &Element| e.tag == "a");
    assert_eq!(
        Node::from(links[0].clone()).text_content(),
        "<script>alert('x')</script> & more"
    );

    let html = calendar.to_html().unwrap();
    assert!(!html.contains("<script>"));
    assert!(!html.contains("alert('x')"));
    assert!(html.contains("&lt;script&gt;alert("));
    assert!(html.contains("&lt;/script&gt; &amp; more"));
    assert!(html.starts_with(r#"<div class="month ecv-calendar">"#));
    assert!(html.contains(r#"<h2 class="title">February Events</h2>"#));
}

#[test]
fn test_serializer_escapes_text_and_attributes() {
    let text = Node::Text("a<b>&c".to_string());
    assert_eq!(text.to_html().unwrap(), "a&lt;b&gt;&amp;c");
    assert_eq!(Node::Text("plain".to_string()).to_html().unwrap(), "plain");

    let link: Node = el("a")
        .attr("href", r#"/e" onmouseover="steal()"#)
        .text("Event")
        .into();
    let html = link.to_html().unwrap();
    assert!(html.starts_with(r#"<a href="/e"#));
    assert!(!html.contains(r#"" onmouseover=""#));
    assert!(html.ends_with(">Event</a>"));

    let empty: Node = el("div").class("date").into();
    assert_eq!(empty.to_html().unwrap(), r#"<div class="date"></div>"#);
}

#[test]
fn test_allow_list_drops_unknown_tags_and_attributes() {
    let dirty: Node = el("div")
        .class("date")
        .attr("onclick", "steal()")
        .child(el("script").text("alert(1)"))
        .child(el("a").attr("href", "/e").attr("style", "x").text("Event"))
        .into();

    let clean = AllowList::calendar().sanitize(dirty);
    assert_eq!(clean.len(), 1);
    assert_eq!(
        clean[0].to_html().unwrap(),
        r#"<div class="date">alert(1)<a href="/e">Event</a></div>"#
    );

    let unwrapped = AllowList::new().sanitize(el("p").text("only text").into());
    assert_eq!(unwrapped, vec![Node::Text("only text".to_string())]);
}
