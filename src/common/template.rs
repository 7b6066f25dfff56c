use crate::{Slot, UpqueueResult};
use serde::{Deserialize, Serialize};

pub const ENDPOINT_PLACEHOLDER: &'static str = "{SERVLET_URL}";
pub const BACKGROUND_PLACEHOLDER: &'static str = "{BGUPLOAD}";
pub const TEMPLATE_PLACEHOLDER: &'static str = "{PROGHTML}";

/// Values a served page embeds for the upload queue
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    /// status endpoint and form action, may be relative to the page
    pub endpoint: String,

    /// background upload mode
    pub background: bool,

    /// html placed inside every queue item
    pub item_template: String,
}

impl PageConfig {
    /// Substitute the placeholders of a script `source`.
    ///
    /// Strings are emitted as javascript string literals, the flag as a bare
    /// `true`/`false`.
    pub fn render(&self, source: &str) -> UpqueueResult<String> {
        let endpoint = serde_json::to_string(&self.endpoint)?;
        let template = serde_json::to_string(&self.item_template)?;

        Ok(source
            .replace(ENDPOINT_PLACEHOLDER, &endpoint)
            .replace(BACKGROUND_PLACEHOLDER, if self.background { "true" } else { "false" })
            .replace(TEMPLATE_PLACEHOLDER, &template))
    }

    pub fn template(&self) -> ItemTemplate<'_> {
        ItemTemplate::new(&self.item_template)
    }
}

/// Html fragment used for every queue item
#[derive(Debug, Clone, Copy)]
pub struct ItemTemplate<'a>(&'a str);

impl<'a> ItemTemplate<'a> {
    pub fn new(html: &'a str) -> Self {
        Self(html)
    }

    pub fn html(&self) -> &'a str {
        self.0
    }

    /// Slots whose class appears on some element of the fragment
    pub fn slots(&self) -> Vec<Slot> {
        let mut slots = Vec::new();

        for value in class_attributes(self.0) {
            for class in value.split_whitespace() {
                if let Some(slot) = Slot::from_class(class) {
                    if !slots.contains(&slot) {
                        slots.push(slot);
                    }
                }
            }
        }

        slots.sort();
        slots
    }
}

fn class_attributes(html: &str) -> Vec<&str> {
    let mut values = Vec::new();
    let mut rest = html;

    while let Some(pos) = rest.find("class") {
        let before = rest[..pos].chars().last();
        rest = &rest[pos + "class".len()..];

        // `subclass=` or `data-class=` are not the attribute
        if !matches!(before, Some(c) if c.is_whitespace()) {
            continue;
        }

        let after_eq = match rest.trim_start().strip_prefix('=') {
            Some(s) => s.trim_start(),
            None => continue,
        };

        let quote = match after_eq.chars().next() {
            Some(q @ '"') | Some(q @ '\'') => q,
            _ => {
                let end = after_eq
                    .find(|c: char| c.is_whitespace() || c == '>')
                    .unwrap_or_else(|| after_eq.len());
                values.push(&after_eq[..end]);
                rest = &after_eq[end..];
                continue;
            }
        };

        let body = &after_eq[1..];
        match body.find(quote) {
            Some(end) => {
                values.push(&body[..end]);
                rest = &body[end + 1..];
            }
            None => break,
        }
    }

    values
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOTSTRAP: &str = "start({SERVLET_URL}, {BGUPLOAD}, {PROGHTML});";

    #[test]
    fn renders_placeholders_as_literals() {
        let config = PageConfig {
            endpoint: "/upload".into(),
            background: false,
            item_template: "<span class=\"status\">it's</span>".into(),
        };

        assert_eq!(
            config.render(BOOTSTRAP).unwrap(),
            r#"start("/upload", false, "<span class=\"status\">it's</span>");"#
        );
    }

    #[test]
    fn finds_slots_in_template() {
        let html = r#"<span class='filename'></span>
            <div class="bar"><div class="progress big" style="width:0"></div></div>
            <b class=speed></b><i data-class="total"></i><em class="status message"></em>"#;

        assert_eq!(
            ItemTemplate::new(html).slots(),
            vec![Slot::Status, Slot::Message, Slot::Filename, Slot::Progress, Slot::Speed]
        );
    }

    #[test]
    fn template_without_slots() {
        assert!(ItemTemplate::new("<p>uploading</p>").slots().is_empty());
        assert!(ItemTemplate::new("").slots().is_empty());
    }
}
