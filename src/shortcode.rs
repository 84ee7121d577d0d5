// File: ./src/shortcode.rs
// Host boundary: shortcode tags in page text are expanded by registered
// handlers, e.g. [ecv_calendar month="January" year="2024"].
use crate::calendar::{Calendar, today};
use crate::config::Config;
use crate::error::Result;
use crate::model::CalendarRequest;
use crate::source::EventSource;
use async_trait::async_trait;
use chrono::FixedOffset;
use regex::Regex;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use tracing::{debug, warn};

pub const CALENDAR_TAG: &str = "ecv_calendar";

static RE_ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([\w-]+)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"']+))"#)
        .expect("valid attribute regex")
});

pub type Attributes = HashMap<String, String>;

#[async_trait]
pub trait ShortcodeHandler: Send + Sync {
    async fn render(&self, attrs: &Attributes) -> Result<String>;
}

/// Something the host must load on pages that use a shortcode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Asset {
    Stylesheet(String),
    Script(String),
}

#[derive(Default)]
pub struct ShortcodeRegistry {
    handlers: HashMap<String, Box<dyn ShortcodeHandler>>,
    assets: Vec<Asset>,
}

impl ShortcodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tag: &str, handler: impl ShortcodeHandler + 'static) {
        self.handlers.insert(tag.to_string(), Box::new(handler));
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    pub fn enqueue(&mut self, asset: Asset) {
        if !self.assets.contains(&asset) {
            self.assets.push(asset);
        }
    }

    pub fn assets(&self) -> &[Asset] {
        &self.assets
    }

    /// Replaces every registered tag in `text` with its handler's output.
    /// Unknown tags are left alone and `[[tag]]` yields the literal `[tag]`.
    /// The first handler error is returned.
    pub async fn expand(&self, text: &str) -> Result<String> {
        let mut out = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(open) = rest.find('[') {
            out.push_str(&rest[..open]);
            let candidate = &rest[open..];

            if let Some(inner) = candidate.strip_prefix('[')
                && let Some(code) = self.parse_at(inner)
                && inner[code.len..].starts_with(']')
            {
                out.push_str(&inner[..code.len]);
                rest = &inner[code.len + 1..];
                continue;
            }

            match self.parse_at(candidate) {
                Some(code) => {
                    let handler = &self.handlers[&code.tag];
                    debug!(tag = %code.tag, "expanding shortcode");
                    let rendered = handler.render(&code.attrs).await.inspect_err(
                        |e| warn!(tag = %code.tag, error = %e, "shortcode failed to render"),
                    )?;
                    out.push_str(&rendered);
                    rest = &candidate[code.len..];
                }
                None => {
                    out.push('[');
                    rest = &candidate[1..];
                }
            }
        }
        out.push_str(rest);
        Ok(out)
    }

    /// A registered shortcode starting at `text[0] == '['`.
    fn parse_at(&self, text: &str) -> Option<Shortcode> {
        let body = text.strip_prefix('[')?;
        let name_len = body
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
            .unwrap_or(body.len());
        let tag = &body[..name_len];
        if tag.is_empty() || !self.is_registered(tag) {
            return None;
        }

        let mut quote = None;
        let mut close = None;
        for (i, c) in body[name_len..].char_indices() {
            match (quote, c) {
                (None, '"' | '\'') => quote = Some(c),
                (Some(q), _) if c == q => quote = None,
                (None, ']') => {
                    close = Some(name_len + i);
                    break;
                }
                _ => {}
            }
        }
        let close = close?;

        Some(Shortcode {
            tag: tag.to_string(),
            attrs: parse_attributes(&body[name_len..close]),
            len: close + 2,
        })
    }
}

struct Shortcode {
    tag: String,
    attrs: Attributes,
    /// Bytes from the opening to the closing bracket, inclusive.
    len: usize,
}

/// `key="value"`, `key='value'` and `key=value` pairs; keys are lowercased
/// and bare words are ignored.
pub fn parse_attributes(raw: &str) -> Attributes {
    RE_ATTR
        .captures_iter(raw.trim().trim_end_matches('/'))
        .filter_map(|caps| {
            let value = caps.get(2).or_else(|| caps.get(3)).or_else(|| caps.get(4))?;
            Some((caps[1].to_lowercase(), value.as_str().to_string()))
        })
        .collect()
}

/// Renders a month calendar from `month`/`year` attributes, defaulting to
/// the current month in the site's zone.
pub struct CalendarShortcode {
    source: Arc<dyn EventSource>,
    zone: FixedOffset,
}

impl CalendarShortcode {
    pub fn new(source: Arc<dyn EventSource>, zone: FixedOffset) -> Self {
        Self { source, zone }
    }
}

#[async_trait]
impl ShortcodeHandler for CalendarShortcode {
    async fn render(&self, attrs: &Attributes) -> Result<String> {
        let request = CalendarRequest::from_input(
            attrs.get("month").map(String::as_str),
            attrs.get("year").map(String::as_str),
            today(self.zone),
        )?;
        let calendar = Calendar::load(request, self.source.as_ref()).await?;
        calendar.to_html()
    }
}

/// Wires the calendar into a host: the `ecv_calendar` tag plus the
/// stylesheet and script the config names.
pub fn register_calendar(
    registry: &mut ShortcodeRegistry,
    source: Arc<dyn EventSource>,
    config: &Config,
) -> anyhow::Result<()> {
    registry.register(CALENDAR_TAG, CalendarShortcode::new(source, config.zone()?));
    if let Some(css) = &config.stylesheet {
        registry.enqueue(Asset::Stylesheet(css.clone()));
    }
    if let Some(js) = &config.script {
        registry.enqueue(Asset::Script(js.clone()));
    }
    Ok(())
}
