use crate::{ItemId, ItemTemplate, ItemView, QueueView, Slot, UpqueueResult};
use std::collections::BTreeMap;
use std::time::Duration;

/// Queue view printing one line per upload whenever it changes
#[derive(Debug, Clone)]
pub struct ConsoleQueue {
    slots: Vec<Slot>,
}

impl ConsoleQueue {
    /// Show only the slots the item template offers
    pub fn new(template: ItemTemplate<'_>) -> Self {
        Self {
            slots: template.slots(),
        }
    }

    pub fn with_all_slots() -> Self {
        Self {
            slots: Slot::ALL.to_vec(),
        }
    }
}

impl Default for ConsoleQueue {
    fn default() -> Self {
        Self::with_all_slots()
    }
}

#[derive(Debug)]
pub struct ConsoleItem {
    id: ItemId,
    slots: Vec<Slot>,
    values: BTreeMap<Slot, String>,
    printed: String,
}

impl ConsoleItem {
    fn line(&self) -> String {
        let mut line = format!("[{}]", self.id);

        for (slot, value) in &self.values {
            if value.is_empty() {
                continue;
            }
            line.push_str(&format!(" {}={}", slot, value));
        }

        line
    }
}

impl ItemView for ConsoleItem {
    fn has_slot(&self, slot: Slot) -> bool {
        self.slots.contains(&slot)
    }

    fn set_slot(&mut self, slot: Slot, value: &str) {
        self.values.insert(slot, value.to_string());
    }

    fn refresh(&mut self) {
        let line = self.line();
        if line != self.printed {
            println!("{}", line);
            self.printed = line;
        }
    }
}

impl QueueView for ConsoleQueue {
    type Item = ConsoleItem;

    fn append(&mut self, id: &ItemId) -> UpqueueResult<ConsoleItem> {
        Ok(ConsoleItem {
            id: id.clone(),
            slots: self.slots.clone(),
            values: BTreeMap::new(),
            printed: String::new(),
        })
    }

    fn retire(&mut self, item: ConsoleItem, _fade: Duration) {
        println!("[{}] removed", item.id);
    }

    fn alert(&mut self, message: &str) {
        eprintln!("upload status unavailable: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_lists_filled_slots_in_order() {
        let mut queue = ConsoleQueue::new(ItemTemplate::new(
            r#"<b class="filename"></b><i class="progress"></i><u class="message"></u>"#,
        ));
        let mut item = queue.append(&ItemId::from("3")).unwrap();

        assert!(item.has_slot(Slot::Progress));
        assert!(!item.has_slot(Slot::Speed));

        item.set_slot(Slot::Progress, "50%");
        item.set_slot(Slot::Filename, "a.bin");
        item.set_slot(Slot::Message, "");

        assert_eq!(item.line(), "[3] filename=a.bin progress=50%");
    }
}
